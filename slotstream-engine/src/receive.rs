//! Inbound node
//!
//! One `evaluate()` call is one host cycle: reconnect if a watched input
//! changed, then drain every bound slot. The node never spawns threads; the
//! only blocking points are the resolve wait of a reconnect pass and the
//! configured pull timeout.

use crate::buffer::SlotOutput;
use crate::error::{ConfigError, EngineError};
use crate::inlet::{DrainParams, InletManager};
use crate::reconnect::{ReconnectController, WatchedInputs};
use crate::resolver::StreamResolver;
use crate::settings::ReceiveSettings;
use crate::stats::{CycleReport, NodeStats};
use crate::status::NodeStatus;
use slotstream_transport::Transport;
use std::time::{Duration, Instant};

/// Host-facing inbound node
pub struct ReceiveNode<T: Transport> {
    transport: T,
    settings: ReceiveSettings,
    inlets: InletManager<T::Inlet>,
    controller: ReconnectController,
    drain_params: DrainParams,
    max_buffered: Duration,
    resolve_wait: Duration,
    refresh_requested: bool,
    status: NodeStatus,
    cycles: u64,
    created: Instant,
}

impl<T: Transport> ReceiveNode<T> {
    /// Create a node; nothing is resolved until the first `evaluate()`
    pub fn new(transport: T, settings: ReceiveSettings) -> Result<Self, EngineError> {
        settings.validate()?;

        let count = settings.slot_config()?.count();
        let mut inlets = InletManager::new();
        inlets.resize(count);
        for index in 0..count {
            inlets.set_target_name(index, settings.stream_name(index))?;
        }

        let mut settings = settings;
        settings.stream_names.resize(count, String::new());

        Ok(ReceiveNode {
            drain_params: settings.drain_params()?,
            max_buffered: settings.max_buffer()?,
            resolve_wait: settings.resolve_wait()?,
            transport,
            settings,
            inlets,
            controller: ReconnectController::new(),
            refresh_requested: false,
            status: NodeStatus::Ok,
            cycles: 0,
            created: Instant::now(),
        })
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    pub fn set_stream_type(&mut self, stream_type: impl Into<String>) {
        self.settings.stream_type = stream_type.into();
    }

    /// Change the slot count
    ///
    /// A negative count is rejected: the status reports it and every slot is
    /// kept as it was. An accepted count clears a reported config error. Surviving slots keep their names; new slots start
    /// with an empty name.
    pub fn set_slot_count(&mut self, count: i64) -> Result<(), ConfigError> {
        let config = match self.settings_with(|s| s.slot_count = count) {
            Ok(settings) => settings.slot_config()?,
            Err(err) => {
                tracing::warn!("Slot count not changed: {}", err);
                self.status = NodeStatus::from(&err);
                return Err(err);
            }
        };

        if matches!(self.status, NodeStatus::Config(_)) {
            self.status = NodeStatus::Ok;
        }
        self.settings.slot_count = count;
        self.settings.stream_names.resize(config.count(), String::new());
        if let Some(event) = self.inlets.resize(config.count()) {
            tracing::debug!("Receive slots resized: {:?}", event);
        }
        Ok(())
    }

    /// Set the stream name of one slot
    pub fn set_stream_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), EngineError> {
        let name = name.into();
        self.inlets.set_target_name(index, name.clone())?;
        if let Some(slot) = self.settings.stream_names.get_mut(index) {
            *slot = name;
        }
        Ok(())
    }

    pub fn set_max_buffer_secs(&mut self, secs: f64) -> Result<(), ConfigError> {
        let settings = self.settings_with(|s| s.max_buffer_secs = secs)?;
        self.max_buffered = settings.max_buffer()?;
        self.settings = settings;
        Ok(())
    }

    /// Set the per-pull timeout
    ///
    /// Any positive timeout stalls the cycle by up to that long for every
    /// pull that finds no data.
    pub fn set_pull_timeout_secs(&mut self, secs: f64) -> Result<(), ConfigError> {
        let settings = self.settings_with(|s| s.pull_timeout_secs = secs)?;
        self.drain_params = settings.drain_params()?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_chunking(&mut self, max_samples: usize, chunk_size: usize) -> Result<(), ConfigError> {
        let settings = self.settings_with(|s| {
            s.max_samples = max_samples;
            s.chunk_size = chunk_size;
        })?;
        self.drain_params = settings.drain_params()?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_resolve_wait_secs(&mut self, secs: f64) -> Result<(), ConfigError> {
        let settings = self.settings_with(|s| s.resolve_wait_secs = secs)?;
        self.resolve_wait = settings.resolve_wait()?;
        self.settings = settings;
        Ok(())
    }

    /// Force a reconnect pass on the next cycle
    pub fn refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Run one cycle
    pub fn evaluate(&mut self) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport {
            cycle: self.cycles,
            ..CycleReport::default()
        };

        let refresh = std::mem::take(&mut self.refresh_requested);
        let inputs = self.watched_inputs();
        self.controller.observe(&inputs, refresh);

        if self.controller.take_pending().is_some() {
            report.reconnected = true;
            report.failed_slots = self.reconnect();
        }

        if !self.settings.enabled {
            return report;
        }

        let drained = self.inlets.drain(&self.drain_params);
        report.samples = drained.samples;
        report.active_slots = self.inlets.active_count();
        for (index, err) in &drained.failed {
            self.status = NodeStatus::from(err);
            report.failed_slots.push(*index);
        }

        report
    }

    fn reconnect(&mut self) -> Vec<usize> {
        if !self.settings.enabled {
            tracing::debug!("Receive node disabled, releasing every inlet");
            self.inlets.unbind_all();
            self.status = NodeStatus::Ok;
            return Vec::new();
        }

        let wanted = self.inlets.slots().any(|slot| !slot.target_name().is_empty());
        let candidates = if wanted {
            match StreamResolver::new(&self.transport)
                .resolve(&self.settings.stream_type, self.resolve_wait)
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!("Resolve failed, keeping current inlets: {}", err);
                    self.status = NodeStatus::from(&err);
                    return Vec::new();
                }
            }
        } else {
            Vec::new()
        };

        let bound = self.inlets.bind(&self.transport, &candidates, self.max_buffered);
        tracing::debug!(
            "Bind pass: {} bound, {} empty, {} unmatched, {} failed",
            bound.bound.len(),
            bound.empty.len(),
            bound.unmatched.len(),
            bound.failed.len()
        );

        self.status = bound
            .failed
            .first()
            .map_or(NodeStatus::Ok, |(_, err)| NodeStatus::from(err));

        bound.failed.into_iter().map(|(index, _)| index).collect()
    }

    fn watched_inputs(&self) -> WatchedInputs {
        WatchedInputs {
            enabled: self.settings.enabled,
            stream_type: self.settings.stream_type.clone(),
            names: self.inlets.target_names(),
            channel_counts: Vec::new(),
        }
    }

    fn settings_with(&self, change: impl FnOnce(&mut ReceiveSettings)) -> Result<ReceiveSettings, ConfigError> {
        let mut settings = self.settings.clone();
        change(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    /// Per-slot outputs in slot order
    pub fn outputs(&self) -> impl Iterator<Item = &SlotOutput> {
        self.inlets.slots().map(|slot| slot.output())
    }

    pub fn slot_output(&self, index: usize) -> Option<&SlotOutput> {
        self.inlets.slot(index).map(|slot| slot.output())
    }

    /// Channel count per slot (0 for inactive slots)
    pub fn channel_counts(&self) -> Vec<usize> {
        self.outputs().map(SlotOutput::channel_count).collect()
    }

    /// Nominal rate per slot
    pub fn nominal_rates(&self) -> Vec<f64> {
        self.outputs().map(SlotOutput::nominal_rate).collect()
    }

    pub fn slot_count(&self) -> usize {
        self.inlets.len()
    }

    pub fn inlets(&self) -> &InletManager<T::Inlet> {
        &self.inlets
    }

    pub fn settings(&self) -> &ReceiveSettings {
        &self.settings
    }

    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    /// Host-facing status string
    pub fn status_message(&self) -> String {
        self.status.to_string()
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            cycles: self.cycles,
            reconnects: self.controller.reconnect_count(),
            status: self.status.to_string(),
            slots: self.inlets.snapshots(),
            uptime: self.created.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotstream_transport::{LoopbackTransport, Outlet, OutletSpec};

    fn settings(names: &[&str]) -> ReceiveSettings {
        ReceiveSettings {
            slot_count: names.len() as i64,
            stream_names: names.iter().map(|s| s.to_string()).collect(),
            resolve_wait_secs: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_binds_on_first_cycle_only() {
        let bus = LoopbackTransport::new();
        let mut outlet = bus.open_outlet(&OutletSpec::new("EEG_0", "EEG", 2)).unwrap();
        let mut node = ReceiveNode::new(bus.clone(), settings(&["EEG_0"])).unwrap();

        let first = node.evaluate();
        assert!(first.reconnected);
        assert_eq!(first.active_slots, 1);
        assert_eq!(node.channel_counts(), vec![2]);

        outlet.push_sample(&[1.0, 2.0]).unwrap();
        let second = node.evaluate();
        assert!(!second.reconnected);
        assert_eq!(second.samples, 1);
        assert_eq!(node.slot_output(0).unwrap().channel(1).unwrap(), &[2.0]);
        assert_eq!(node.status_message(), "OK");
    }

    #[test]
    fn test_negative_slot_count_keeps_slots() {
        let bus = LoopbackTransport::new();
        let mut node = ReceiveNode::new(bus, settings(&["a", "b"])).unwrap();

        assert_eq!(node.set_slot_count(-3), Err(ConfigError::NegativeSlotCount(-3)));
        assert_eq!(node.slot_count(), 2);
        assert!(!node.status().is_ok());
        assert_eq!(node.inlets().target_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_corrected_slot_count_clears_status() {
        let bus = LoopbackTransport::new();
        let mut outlet = bus.open_outlet(&OutletSpec::new("EEG_0", "EEG", 2)).unwrap();
        let mut node = ReceiveNode::new(bus, settings(&["EEG_0"])).unwrap();
        node.evaluate();

        assert!(node.set_slot_count(-1).is_err());
        assert_eq!(node.status_message(), "Slot count cannot be negative (got -1)");

        node.set_slot_count(1).unwrap();
        outlet.push_sample(&[1.0, 2.0]).unwrap();
        let report = node.evaluate();

        assert!(!report.reconnected);
        assert_eq!(report.samples, 1);
        assert_eq!(node.status_message(), "OK");
    }

    #[test]
    fn test_grow_and_name_new_slot() {
        let bus = LoopbackTransport::new();
        let _a = bus.open_outlet(&OutletSpec::new("EEG_0", "EEG", 1)).unwrap();
        let _b = bus.open_outlet(&OutletSpec::new("EEG_1", "EEG", 3)).unwrap();
        let mut node = ReceiveNode::new(bus, settings(&["EEG_0"])).unwrap();
        node.evaluate();

        node.set_slot_count(2).unwrap();
        node.set_stream_name(1, "EEG_1").unwrap();
        let report = node.evaluate();

        assert!(report.reconnected);
        assert_eq!(node.channel_counts(), vec![1, 3]);
        assert_eq!(node.settings().stream_names.len(), 2);
    }

    #[test]
    fn test_disable_releases_and_empties() {
        let bus = LoopbackTransport::new();
        let _outlet = bus.open_outlet(&OutletSpec::new("EEG_0", "EEG", 4)).unwrap();
        let mut node = ReceiveNode::new(bus.clone(), settings(&["EEG_0"])).unwrap();
        node.evaluate();
        assert_eq!(bus.subscriber_count("EEG_0"), 1);

        node.set_enabled(false);
        let report = node.evaluate();
        assert!(report.reconnected);
        assert_eq!(report.active_slots, 0);
        assert_eq!(node.channel_counts(), vec![0]);
        assert_eq!(bus.subscriber_count("EEG_0"), 0);
    }

    #[test]
    fn test_lost_stream_reports_and_clears() {
        let bus = LoopbackTransport::new();
        let outlet = bus.open_outlet(&OutletSpec::new("EEG_0", "EEG", 1)).unwrap();
        let mut node = ReceiveNode::new(bus, settings(&["EEG_0"])).unwrap();
        node.evaluate();

        drop(outlet);
        let report = node.evaluate();
        assert_eq!(report.failed_slots, vec![0]);
        assert_eq!(node.channel_counts(), vec![0]);
        assert_eq!(node.status_message(), "Stream 'EEG_0' is no longer available");

        let stats = node.stats();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.total_transport_errors(), 1);
    }

    #[test]
    fn test_invalid_setters_leave_settings() {
        let bus = LoopbackTransport::new();
        let mut node = ReceiveNode::new(bus, settings(&["EEG_0"])).unwrap();

        assert!(node.set_chunking(512, 0).is_err());
        assert!(node.set_pull_timeout_secs(f64::NAN).is_err());
        assert!(node.set_max_buffer_secs(-1.0).is_err());
        assert_eq!(node.settings().chunk_size, 32);
        assert_eq!(node.settings().max_buffer_secs, 1.0);

        node.set_chunking(100, 30).unwrap();
        assert_eq!(node.settings().max_samples, 100);
    }
}
