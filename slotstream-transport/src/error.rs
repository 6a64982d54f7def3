//! Transport error type

use thiserror::Error;

/// Errors reported by the transport boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Stream resolution failed: {0}")]
    ResolveFailed(String),

    #[error("Failed to open inlet for stream '{name}': {reason}")]
    OpenInletFailed { name: String, reason: String },

    #[error("Failed to open outlet for stream '{name}': {reason}")]
    OpenOutletFailed { name: String, reason: String },

    #[error("Stream '{0}' is no longer available")]
    StreamLost(String),

    #[error("Sample has {actual} values but the stream declares {expected} channels")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("Invalid stream info: {0}")]
    InvalidStreamInfo(String),
}

/// Result alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
