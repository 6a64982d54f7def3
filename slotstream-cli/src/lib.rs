//! Slotstream CLI Library
//!
//! Shared functionality for the slotstream command-line tools.

pub mod config;
pub mod stats;

pub use config::{CliConfigError, Config, LoopbackConfig};
pub use stats::{display_compact_stats, display_node_stats, format_duration, format_rate};
