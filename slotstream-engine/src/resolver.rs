//! Stream resolution
//!
//! Resolution can block the calling cycle for its whole wait time when no
//! matching source is advertised. Nodes therefore only resolve on a reconnect
//! trigger (startup, manual refresh or a watched input change), never on
//! every cycle.

use slotstream_transport::{StreamDescriptor, Transport, TransportResult};
use std::time::{Duration, Instant};

/// Queries a transport for advertised sources of a given type
pub struct StreamResolver<'t, T: Transport> {
    transport: &'t T,
    min_sources: usize,
}

impl<'t, T: Transport> StreamResolver<'t, T> {
    /// Create a resolver returning as soon as one source is known
    pub fn new(transport: &'t T) -> Self {
        StreamResolver {
            transport,
            min_sources: 1,
        }
    }

    /// Wait for at least `min_sources` sources instead of one
    pub fn with_min_sources(mut self, min_sources: usize) -> Self {
        self.min_sources = min_sources;
        self
    }

    /// Snapshot the advertised sources whose type passes `type_filter`
    ///
    /// Waits up to `wait`; a zero wait returns what is already known. An
    /// empty result is not an error.
    pub fn resolve(&self, type_filter: &str, wait: Duration) -> TransportResult<Vec<StreamDescriptor>> {
        let started = Instant::now();
        let results = self.transport.resolve(type_filter, self.min_sources, wait)?;

        tracing::debug!(
            "Number of streams: {} (type '{}', resolved in {:?})",
            results.len(),
            type_filter,
            started.elapsed()
        );

        Ok(results)
    }
}

/// First candidate whose name equals `name` exactly
pub fn select_by_name<'a>(
    candidates: &'a [StreamDescriptor],
    name: &str,
) -> Option<&'a StreamDescriptor> {
    candidates.iter().find(|candidate| {
        tracing::debug!("Look at stream name: {}", candidate.name);
        candidate.name == name
    })
}
