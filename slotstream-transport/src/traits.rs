//! Transport traits
//!
//! The engine is generic over these traits so it never depends on a concrete
//! discovery/streaming library.

use crate::descriptor::{ConnectionId, OutletSpec, StreamDescriptor};
use crate::error::TransportResult;
use std::time::Duration;

/// One batch of samples returned by a single pull
///
/// Samples are stored sample-major in arrival order, each with the timestamp
/// the producer stamped it with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    samples: Vec<Vec<f64>>,
    timestamps: Vec<f64>,
}

impl Chunk {
    /// Create an empty chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chunk with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Chunk {
            samples: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
        }
    }

    /// Append one sample
    pub fn push(&mut self, values: Vec<f64>, timestamp: f64) {
        self.samples.push(values);
        self.timestamps.push(timestamp);
    }

    /// Number of samples in the chunk
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the chunk holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Keep at most `len` samples, discarding the newest ones
    pub fn truncate(&mut self, len: usize) {
        self.samples.truncate(len);
        self.timestamps.truncate(len);
    }

    /// Samples in arrival order
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Timestamps in arrival order
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Split into samples and timestamps
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<f64>) {
        (self.samples, self.timestamps)
    }
}

/// Inbound connection to a resolved stream
pub trait Inlet {
    /// Identity of this connection
    fn connection_id(&self) -> ConnectionId;

    /// Channel count of the connected stream
    fn channel_count(&self) -> usize;

    /// Pull up to `max_samples` buffered samples
    ///
    /// A zero `timeout` never blocks and returns whatever is already buffered.
    /// A positive timeout waits up to that long for the first sample to
    /// arrive, stalling the caller for that time when nothing comes.
    fn pull_chunk(&mut self, max_samples: usize, timeout: Duration) -> TransportResult<Chunk>;
}

/// Outbound connection advertising a declared stream
pub trait Outlet {
    /// Identity of this connection
    fn connection_id(&self) -> ConnectionId;

    /// Channel count the outlet was declared with
    fn channel_count(&self) -> usize;

    /// Transmit a single sample
    fn push_sample(&mut self, values: &[f64]) -> TransportResult<()>;
}

/// Discovery and connection primitives of a streaming layer
///
/// Dropping an inlet or outlet releases its transport resources.
pub trait Transport {
    type Inlet: Inlet;
    type Outlet: Outlet;

    /// List advertised streams whose type passes `type_filter`
    ///
    /// Blocks for up to `wait` until at least `min_sources` streams are known.
    /// Returns whatever is known when the wait elapses, which may be nothing.
    fn resolve(
        &self,
        type_filter: &str,
        min_sources: usize,
        wait: Duration,
    ) -> TransportResult<Vec<StreamDescriptor>>;

    /// Open an inlet that retains up to `max_buffered` worth of data
    fn open_inlet(
        &self,
        descriptor: &StreamDescriptor,
        max_buffered: Duration,
    ) -> TransportResult<Self::Inlet>;

    /// Advertise a new outlet
    fn open_outlet(&self, spec: &OutletSpec) -> TransportResult<Self::Outlet>;
}
