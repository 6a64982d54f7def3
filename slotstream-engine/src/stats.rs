//! Per-slot and per-node statistics

use std::time::{Duration, Instant};

/// Counters kept for one slot
#[derive(Debug, Clone, Default)]
pub struct SlotStats {
    /// Samples drained from the inlet
    pub samples_received: u64,
    /// Samples pushed to the outlet
    pub samples_pushed: u64,
    /// Non-empty pulls performed
    pub pulls: u64,
    /// Times a connection was (re)established for this slot
    pub connections: u64,
    /// Transport errors seen on this slot
    pub transport_errors: u64,
    /// Last time data moved through this slot
    pub last_activity: Option<Instant>,
}

impl SlotStats {
    /// Record a drain pass
    pub fn record_drain(&mut self, samples: usize, pulls: usize) {
        if samples > 0 {
            self.samples_received += samples as u64;
            self.pulls += pulls as u64;
            self.last_activity = Some(Instant::now());
        }
    }

    /// Record one pushed sample
    pub fn record_push(&mut self) {
        self.samples_pushed += 1;
        self.last_activity = Some(Instant::now());
    }

    pub fn record_connection(&mut self) {
        self.connections += 1;
    }

    pub fn record_error(&mut self) {
        self.transport_errors += 1;
    }
}

/// Point-in-time view of one slot
#[derive(Debug, Clone)]
pub struct SlotSnapshot {
    /// Slot index
    pub index: usize,
    /// Positional slot label
    pub label: String,
    /// Stream name the slot targets or declares
    pub stream_name: String,
    /// Whether a connection is bound
    pub active: bool,
    /// Channel count of the bound stream (0 when inactive)
    pub channel_count: usize,
    /// Nominal rate of the bound stream
    pub nominal_rate: f64,
    /// Slot counters
    pub stats: SlotStats,
}

/// Point-in-time view of a node
#[derive(Debug, Clone)]
pub struct NodeStats {
    /// Cycles evaluated
    pub cycles: u64,
    /// Reconnect passes run
    pub reconnects: u64,
    /// Human-readable status of the last reconnect or cycle
    pub status: String,
    /// Per-slot views in slot order
    pub slots: Vec<SlotSnapshot>,
    /// Time since the node was created
    pub uptime: Duration,
}

impl NodeStats {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn active_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn total_samples_received(&self) -> u64 {
        self.slots.iter().map(|s| s.stats.samples_received).sum()
    }

    pub fn total_samples_pushed(&self) -> u64 {
        self.slots.iter().map(|s| s.stats.samples_pushed).sum()
    }

    pub fn total_transport_errors(&self) -> u64 {
        self.slots.iter().map(|s| s.stats.transport_errors).sum()
    }
}

/// Outcome of a single evaluation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycle number, starting at 1
    pub cycle: u64,
    /// Whether a reconnect pass ran this cycle
    pub reconnected: bool,
    /// Slots holding an active connection after the cycle
    pub active_slots: usize,
    /// Samples drained (receive) or pushed (send)
    pub samples: usize,
    /// Whether pushing was suppressed by a configuration error
    pub suppressed: bool,
    /// Slots whose connection failed this cycle
    pub failed_slots: Vec<usize>,
}
