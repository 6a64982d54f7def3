//! Engine error types

use slotstream_transport::TransportError;
use thiserror::Error;

/// Configuration errors
///
/// A configuration error aborts the operation for the affected node and
/// leaves existing bindings untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Slot count cannot be negative (got {0})")]
    NegativeSlotCount(i64),

    #[error("Stream names cannot be empty (slot {slot})")]
    EmptyStreamName { slot: usize },

    #[error("Channel numbers for each stream is not specified correctly ({names} names, {channel_counts} channel counts)")]
    ChannelListMismatch { names: usize, channel_counts: usize },

    #[error("Channel count for slot {slot} cannot be negative (got {count})")]
    NegativeChannelCount { slot: usize, count: i64 },

    #[error("Invalid duration for {field}: {value} seconds")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("Invalid nominal rate: {0}")]
    InvalidRate(f64),

    #[error("Invalid chunking: chunk size {chunk_size}, max samples {max_samples}")]
    InvalidChunking {
        chunk_size: usize,
        max_samples: usize,
    },
}

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Slot {index} out of range (node has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },
}
