//! Stream descriptors and outlet declarations
//!
//! A `StreamDescriptor` is what resolution hands back for every advertised
//! source. It is an immutable snapshot: the engine consumes it during a bind
//! pass and keeps it only inside the binding it produced.

use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Nominal rate advertised by streams without a regular sampling clock
pub const IRREGULAR_RATE: f64 = 0.0;

/// Opaque identifier of an advertised source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHandle(u64);

impl SourceHandle {
    /// Create a handle from its raw value
    pub fn new(raw: u64) -> Self {
        SourceHandle(raw)
    }

    /// Get the raw value
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// Process-unique identity of an opened inlet or outlet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next connection id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Value format an outlet advertises for its channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFormat {
    /// 32-bit float samples
    #[default]
    Float32,
    /// 64-bit float samples
    Double64,
}

/// Descriptor of an advertised stream, as returned by resolution
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Stream name
    pub name: String,
    /// Stream type (e.g. "EEG", "Markers")
    pub stream_type: String,
    /// Number of channels per sample
    pub channel_count: usize,
    /// Nominal sampling rate in Hz (0 for irregular streams)
    pub nominal_rate: f64,
    /// Advertised value format
    pub channel_format: ChannelFormat,
    /// Producer-chosen source identifier (may be empty)
    pub source_id: String,
    /// Transport handle used to open an inlet on this source
    pub handle: SourceHandle,
}

impl StreamDescriptor {
    /// Whether the stream has no regular sampling rate
    pub fn is_irregular(&self) -> bool {
        self.nominal_rate <= IRREGULAR_RATE
    }

    /// Whether this stream passes a type filter
    ///
    /// An empty filter accepts every type.
    pub fn matches_type(&self, type_filter: &str) -> bool {
        type_filter.is_empty() || self.stream_type == type_filter
    }
}

/// Declaration of an outlet to advertise
#[derive(Debug, Clone, PartialEq)]
pub struct OutletSpec {
    pub name: String,
    pub stream_type: String,
    pub channel_count: usize,
    pub nominal_rate: f64,
    pub channel_format: ChannelFormat,
    pub source_id: String,
}

impl OutletSpec {
    /// Create an irregular-rate float32 outlet declaration
    pub fn new(name: impl Into<String>, stream_type: impl Into<String>, channel_count: usize) -> Self {
        OutletSpec {
            name: name.into(),
            stream_type: stream_type.into(),
            channel_count,
            nominal_rate: IRREGULAR_RATE,
            channel_format: ChannelFormat::Float32,
            source_id: String::new(),
        }
    }

    /// Set the nominal rate
    pub fn with_rate(mut self, nominal_rate: f64) -> Self {
        self.nominal_rate = nominal_rate;
        self
    }

    /// Set the channel format
    pub fn with_format(mut self, channel_format: ChannelFormat) -> Self {
        self.channel_format = channel_format;
        self
    }

    /// Set the source identifier
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Check the declaration is something a transport can advertise
    pub fn validate(&self) -> TransportResult<()> {
        if self.name.is_empty() {
            return Err(TransportError::InvalidStreamInfo(
                "stream name is empty".to_string(),
            ));
        }
        if self.channel_count == 0 {
            return Err(TransportError::InvalidStreamInfo(format!(
                "stream '{}' declares zero channels",
                self.name
            )));
        }
        if !self.nominal_rate.is_finite() || self.nominal_rate < 0.0 {
            return Err(TransportError::InvalidStreamInfo(format!(
                "stream '{}' has invalid nominal rate {}",
                self.name, self.nominal_rate
            )));
        }
        Ok(())
    }

    /// Build the descriptor resolution will report for this outlet
    pub fn to_descriptor(&self, handle: SourceHandle) -> StreamDescriptor {
        StreamDescriptor {
            name: self.name.clone(),
            stream_type: self.stream_type.clone(),
            channel_count: self.channel_count,
            nominal_rate: self.nominal_rate,
            channel_format: self.channel_format,
            source_id: self.source_id.clone(),
            handle,
        }
    }
}
