//! Node status reported to the host

use crate::error::{ConfigError, EngineError};
use slotstream_transport::TransportError;
use std::fmt;

/// Outcome of the last reconnect pass, or the last failure since then
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeStatus {
    #[default]
    Ok,
    /// A declared stream name is empty
    EmptyStreamName,
    /// Name and channel-count lists disagree
    ChannelMismatch,
    /// Any other configuration problem
    Config(String),
    /// The transport reported a failure
    Transport(String),
}

impl NodeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, NodeStatus::Ok)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Ok => f.write_str("OK"),
            NodeStatus::EmptyStreamName => f.write_str("Stream names cannot be empty"),
            NodeStatus::ChannelMismatch => {
                f.write_str("Channel numbers for each stream is not specified correctly")
            }
            NodeStatus::Config(msg) | NodeStatus::Transport(msg) => f.write_str(msg),
        }
    }
}

impl From<&ConfigError> for NodeStatus {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::EmptyStreamName { .. } => NodeStatus::EmptyStreamName,
            ConfigError::ChannelListMismatch { .. } | ConfigError::NegativeChannelCount { .. } => {
                NodeStatus::ChannelMismatch
            }
            other => NodeStatus::Config(other.to_string()),
        }
    }
}

impl From<&TransportError> for NodeStatus {
    fn from(err: &TransportError) -> Self {
        NodeStatus::Transport(err.to_string())
    }
}

impl From<&EngineError> for NodeStatus {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::Config(e) => e.into(),
            EngineError::Transport(e) => e.into(),
            other => NodeStatus::Config(other.to_string()),
        }
    }
}
