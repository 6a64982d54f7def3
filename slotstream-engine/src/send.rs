//! Outbound node
//!
//! The declared name list drives the slot count: one outlet per name. Each
//! cycle pushes exactly one sample per active outlet from the current input
//! values; nothing is batched across cycles.

use crate::error::EngineError;
use crate::outlet::{OutletManager, OutletStatus};
use crate::reconnect::{ReconnectController, WatchedInputs};
use crate::settings::SendSettings;
use crate::stats::{CycleReport, NodeStats};
use crate::status::NodeStatus;
use slotstream_transport::{ChannelFormat, Transport};
use std::time::Instant;

/// Host-facing outbound node
pub struct SendNode<T: Transport> {
    transport: T,
    settings: SendSettings,
    outlets: OutletManager<T::Outlet>,
    values: Vec<Vec<f64>>,
    controller: ReconnectController,
    refresh_requested: bool,
    status: NodeStatus,
    cycles: u64,
    created: Instant,
}

impl<T: Transport> SendNode<T> {
    /// Create a node; outlets are declared on the first `evaluate()`
    ///
    /// Settings are not rejected here: a bad declaration shows up in the
    /// status after the first cycle, like any later change would.
    pub fn new(transport: T, settings: SendSettings) -> Self {
        SendNode {
            transport,
            settings,
            outlets: OutletManager::new(),
            values: Vec::new(),
            controller: ReconnectController::new(),
            refresh_requested: false,
            status: NodeStatus::Ok,
            cycles: 0,
            created: Instant::now(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    pub fn set_stream_type(&mut self, stream_type: impl Into<String>) {
        self.settings.stream_type = stream_type.into();
    }

    pub fn set_stream_names(&mut self, names: Vec<String>) {
        self.settings.stream_names = names;
    }

    pub fn set_channel_counts(&mut self, channel_counts: Vec<i64>) {
        self.settings.channel_counts = channel_counts;
    }

    /// Values pushed for slot `index` on every following cycle
    pub fn set_values(&mut self, index: usize, values: Vec<f64>) -> Result<(), EngineError> {
        let len = self.settings.stream_names.len();
        if index >= len {
            return Err(EngineError::SlotOutOfRange { index, len });
        }

        if self.values.len() <= index {
            self.values.resize(index + 1, Vec::new());
        }
        self.values[index] = values;
        Ok(())
    }

    /// Change the advertised rate; outlets are recreated on the next cycle
    pub fn set_nominal_rate(&mut self, nominal_rate: f64) {
        if self.settings.nominal_rate != nominal_rate {
            self.settings.nominal_rate = nominal_rate;
            self.refresh_requested = true;
        }
    }

    /// Change the advertised format; outlets are recreated on the next cycle
    pub fn set_channel_format(&mut self, channel_format: ChannelFormat) {
        if self.settings.channel_format != channel_format {
            self.settings.channel_format = channel_format;
            self.refresh_requested = true;
        }
    }

    /// Force a rebuild pass on the next cycle
    ///
    /// Outlets whose declaration is unchanged are kept; slots whose outlet
    /// is missing or failed get another attempt.
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
            report.failed_slots = self.rebuild();
        }

        report.active_slots = self.outlets.active_count();

        if !self.settings.enabled {
            return report;
        }

        let pushed = self.outlets.push_all(&self.values);
        report.samples = pushed.pushed;
        report.suppressed = pushed.suppressed;
        for (index, err) in &pushed.failed {
            self.status = NodeStatus::from(err);
            report.failed_slots.push(*index);
        }
        report.active_slots = self.outlets.active_count();

        report
    }

    fn rebuild(&mut self) -> Vec<usize> {
        let result = self.outlets.rebuild(
            &self.transport,
            &self.settings.stream_type,
            &self.settings.stream_names,
            &self.settings.channel_counts,
            self.settings.nominal_rate,
            self.settings.channel_format,
        );

        match result {
            Ok(rebuilt) => {
                tracing::debug!(
                    "Outlet rebuild: {} created, {} kept, {} failed",
                    rebuilt.created.len(),
                    rebuilt.kept.len(),
                    rebuilt.failed.len()
                );
                self.values.truncate(self.outlets.len());
                self.status = rebuilt
                    .failed
                    .first()
                    .map_or(NodeStatus::Ok, |(_, err)| NodeStatus::from(err));
                rebuilt.failed.into_iter().map(|(index, _)| index).collect()
            }
            Err(err) => {
                self.status = NodeStatus::from(&err);
                Vec::new()
            }
        }
    }

    fn watched_inputs(&self) -> WatchedInputs {
        WatchedInputs {
            enabled: self.settings.enabled,
            stream_type: self.settings.stream_type.clone(),
            names: self.settings.stream_names.clone(),
            channel_counts: self.settings.channel_counts.clone(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.outlets.len()
    }

    pub fn outlets(&self) -> &OutletManager<T::Outlet> {
        &self.outlets
    }

    /// Group validation status of the declared outlets
    pub fn outlet_status(&self) -> OutletStatus {
        self.outlets.status()
    }

    pub fn settings(&self) -> &SendSettings {
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
            slots: self.outlets.snapshots(),
            uptime: self.created.elapsed(),
        }
    }
}
