//! Configuration file support for slotstream CLI tools

use serde::{Deserialize, Serialize};
use slotstream_engine::{ReceiveSettings, SendSettings};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loopback run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Host cycle period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Run time in seconds (0 runs until interrupted)
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Statistics interval in seconds
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
    /// Frequency of the synthetic sine on every channel
    #[serde(default = "default_signal_hz")]
    pub signal_hz: f64,
}

fn default_tick_ms() -> u64 {
    10
}

fn default_duration_secs() -> u64 {
    10
}

fn default_stats_interval() -> u64 {
    1
}

fn default_signal_hz() -> f64 {
    10.0
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        LoopbackConfig {
            tick_ms: default_tick_ms(),
            duration_secs: default_duration_secs(),
            stats_interval_secs: default_stats_interval(),
            signal_hz: default_signal_hz(),
        }
    }
}

impl LoopbackConfig {
    /// Defaults with one cycle per sample at `rate` Hz
    ///
    /// Irregular (zero or non-finite) rates keep the default period.
    pub fn for_rate(rate: f64) -> Self {
        let mut config = LoopbackConfig::default();
        if rate.is_finite() && rate > 0.0 {
            config.tick_ms = (1000.0 / rate).round().max(1.0) as u64;
        }
        config
    }

    /// Get the cycle period as Duration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Get the run time, `None` when unbounded
    pub fn duration(&self) -> Option<Duration> {
        (self.duration_secs > 0).then(|| Duration::from_secs(self.duration_secs))
    }

    /// Get statistics interval as Duration
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

/// Combined configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Receive node settings
    pub receiver: Option<ReceiveSettings>,
    /// Send node settings
    pub sender: Option<SendSettings>,
    /// Loopback run settings
    #[serde(default)]
    pub loopback: LoopbackConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check both node sections
    pub fn validate(&self) -> Result<(), CliConfigError> {
        if let Some(receiver) = &self.receiver {
            receiver
                .validate()
                .map_err(|e| CliConfigError::Invalid(format!("receiver: {}", e)))?;
        }
        if let Some(sender) = &self.sender {
            sender
                .validate()
                .map_err(|e| CliConfigError::Invalid(format!("sender: {}", e)))?;
        }
        Ok(())
    }

    /// Matching sender and receiver for `streams` streams named `<type>_<i>`
    pub fn loopback(stream_type: &str, streams: usize, channels: usize, rate: f64) -> Self {
        let names: Vec<String> = (0..streams)
            .map(|i| format!("{}_{}", stream_type, i))
            .collect();

        Config {
            receiver: Some(ReceiveSettings {
                stream_type: stream_type.to_string(),
                slot_count: streams as i64,
                stream_names: names.clone(),
                ..ReceiveSettings::default()
            }),
            sender: Some(SendSettings {
                stream_type: stream_type.to_string(),
                channel_counts: vec![channels as i64; streams],
                stream_names: names,
                nominal_rate: rate,
                ..SendSettings::default()
            }),
            loopback: LoopbackConfig::for_rate(rate),
        }
    }

    /// Create example configuration
    pub fn example() -> Self {
        Config::loopback("EEG", 2, 8, 250.0)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum CliConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config() {
        let config = Config::example();
        let receiver = config.receiver.as_ref().unwrap();
        let sender = config.sender.as_ref().unwrap();

        assert_eq!(receiver.stream_names, vec!["EEG_0".to_string(), "EEG_1".to_string()]);
        assert_eq!(sender.stream_names, receiver.stream_names);
        assert_eq!(sender.channel_counts, vec![8, 8]);
        assert_eq!(config.loopback.tick(), Duration::from_millis(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tick_follows_rate() {
        assert_eq!(LoopbackConfig::for_rate(100.0).tick_ms, 10);
        assert_eq!(LoopbackConfig::for_rate(5000.0).tick_ms, 1);
        assert_eq!(LoopbackConfig::for_rate(0.0).tick_ms, 10);
        assert_eq!(LoopbackConfig::for_rate(f64::NAN).tick_ms, 10);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::example();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_tables_take_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [receiver]
            stream_names = ["EEG_3"]

            [loopback]
            tick_ms = 5
            "#,
        )
        .unwrap();

        let receiver = parsed.receiver.unwrap();
        assert_eq!(receiver.stream_type, "EEG");
        assert_eq!(receiver.max_samples, 512);
        assert_eq!(receiver.chunk_size, 32);
        assert_eq!(receiver.stream_names, vec!["EEG_3".to_string()]);
        assert!(parsed.sender.is_none());
        assert_eq!(parsed.loopback.tick(), Duration::from_millis(5));
        assert_eq!(parsed.loopback.duration(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut config = Config::example();
        if let Some(sender) = config.sender.as_mut() {
            sender.channel_counts.pop();
        }
        assert!(matches!(config.validate(), Err(CliConfigError::Invalid(_))));
    }
}
