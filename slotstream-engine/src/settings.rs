//! Node settings
//!
//! Both settings structs deserialize from partial tables: every missing field
//! takes its default.

use crate::error::ConfigError;
use crate::inlet::{DrainParams, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_SAMPLES};
use crate::outlet::validate_declarations;
use crate::slot_set::SlotConfig;
use serde::{Deserialize, Serialize};
use slotstream_transport::ChannelFormat;
use std::time::Duration;

/// Inbound node settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveSettings {
    /// Whether the node resolves and drains at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Stream type to resolve; empty matches every type
    #[serde(default = "default_receive_type")]
    pub stream_type: String,
    /// Number of stream slots
    #[serde(default = "default_slot_count")]
    pub slot_count: i64,
    /// Stream name per slot; missing entries leave the slot inactive
    #[serde(default = "default_receive_names")]
    pub stream_names: Vec<String>,
    /// Seconds of data an inlet retains before samples are lost
    #[serde(default = "default_max_buffer_secs")]
    pub max_buffer_secs: f64,
    /// Timeout of every pull, in seconds (0 never blocks)
    #[serde(default)]
    pub pull_timeout_secs: f64,
    /// Maximum samples drained per slot per cycle
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Samples requested per pull
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// How long a reconnect pass waits for sources to appear
    #[serde(default = "default_resolve_wait_secs")]
    pub resolve_wait_secs: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_receive_type() -> String {
    "EEG".to_string()
}

fn default_slot_count() -> i64 {
    1
}

fn default_receive_names() -> Vec<String> {
    vec!["EEG_0".to_string()]
}

fn default_max_buffer_secs() -> f64 {
    1.0
}

fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_resolve_wait_secs() -> f64 {
    1.0
}

impl Default for ReceiveSettings {
    fn default() -> Self {
        ReceiveSettings {
            enabled: default_enabled(),
            stream_type: default_receive_type(),
            slot_count: default_slot_count(),
            stream_names: default_receive_names(),
            max_buffer_secs: default_max_buffer_secs(),
            pull_timeout_secs: 0.0,
            max_samples: default_max_samples(),
            chunk_size: default_chunk_size(),
            resolve_wait_secs: default_resolve_wait_secs(),
        }
    }
}

impl ReceiveSettings {
    /// Check every field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slot_config()?;
        self.max_buffer()?;
        self.resolve_wait()?;
        self.drain_params()?;
        Ok(())
    }

    pub fn slot_config(&self) -> Result<SlotConfig, ConfigError> {
        SlotConfig::try_from_signed(self.slot_count)
    }

    pub fn max_buffer(&self) -> Result<Duration, ConfigError> {
        secs_to_duration("max_buffer_secs", self.max_buffer_secs)
    }

    pub fn pull_timeout(&self) -> Result<Duration, ConfigError> {
        secs_to_duration("pull_timeout_secs", self.pull_timeout_secs)
    }

    pub fn resolve_wait(&self) -> Result<Duration, ConfigError> {
        secs_to_duration("resolve_wait_secs", self.resolve_wait_secs)
    }

    pub fn drain_params(&self) -> Result<DrainParams, ConfigError> {
        DrainParams::new(self.max_samples, self.chunk_size, self.pull_timeout()?)
    }

    /// Stream name for `slot`, empty when none is configured
    pub fn stream_name(&self, slot: usize) -> &str {
        self.stream_names.get(slot).map(String::as_str).unwrap_or("")
    }
}

/// Outbound node settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendSettings {
    /// Whether the node pushes samples
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Type advertised by every outlet of the node
    #[serde(default = "default_send_type")]
    pub stream_type: String,
    /// One outlet per name
    #[serde(default = "default_send_names")]
    pub stream_names: Vec<String>,
    /// Channel count per outlet, parallel to `stream_names`
    #[serde(default = "default_channel_counts")]
    pub channel_counts: Vec<i64>,
    /// Advertised nominal rate in Hz (0 for irregular)
    #[serde(default)]
    pub nominal_rate: f64,
    /// Advertised value format
    #[serde(default)]
    pub channel_format: ChannelFormat,
}

fn default_send_type() -> String {
    "type".to_string()
}

fn default_send_names() -> Vec<String> {
    vec!["name".to_string()]
}

fn default_channel_counts() -> Vec<i64> {
    vec![1]
}

impl Default for SendSettings {
    fn default() -> Self {
        SendSettings {
            enabled: default_enabled(),
            stream_type: default_send_type(),
            stream_names: default_send_names(),
            channel_counts: default_channel_counts(),
            nominal_rate: 0.0,
            channel_format: ChannelFormat::default(),
        }
    }
}

impl SendSettings {
    /// Check the declared outlet group
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_declarations(
            &self.stream_type,
            &self.stream_names,
            &self.channel_counts,
            self.nominal_rate,
            self.channel_format,
        )
        .map(|_| ())
    }
}

fn secs_to_duration(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}
