//! Outbound slot management
//!
//! The declared names and channel counts are validated as a group. A group
//! that fails validation keeps whatever outlets already exist but suppresses
//! pushing on every slot until the declaration is corrected. A valid group
//! recreates exactly the outlets whose declaration changed.

use crate::error::ConfigError;
use crate::slot_set::SlotSet;
use crate::stats::{SlotSnapshot, SlotStats};
use slotstream_transport::{
    ChannelFormat, ConnectionId, Outlet, OutletSpec, Transport, TransportError,
};

/// Validation state of an outbound group or slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutletStatus {
    #[default]
    Ok,
    /// A declared name is empty
    Empty,
    /// Names and channel counts disagree
    ChannelMismatch,
}

impl From<&ConfigError> for OutletStatus {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::EmptyStreamName { .. } => OutletStatus::Empty,
            _ => OutletStatus::ChannelMismatch,
        }
    }
}

/// What one outbound slot advertises
#[derive(Debug, Clone, PartialEq)]
pub struct OutletDeclaration {
    pub name: String,
    pub stream_type: String,
    pub channel_count: usize,
    pub nominal_rate: f64,
    pub channel_format: ChannelFormat,
}

impl OutletDeclaration {
    /// Transport-level declaration
    pub fn to_spec(&self) -> OutletSpec {
        OutletSpec::new(&self.name, &self.stream_type, self.channel_count)
            .with_rate(self.nominal_rate)
            .with_format(self.channel_format)
    }
}

/// Check a declared group and turn it into per-slot declarations
///
/// Names and channel counts must have the same length, no name may be empty
/// and no count may be negative. The rate must be finite and non-negative.
pub fn validate_declarations(
    stream_type: &str,
    names: &[String],
    channel_counts: &[i64],
    nominal_rate: f64,
    channel_format: ChannelFormat,
) -> Result<Vec<OutletDeclaration>, ConfigError> {
    if names.len() != channel_counts.len() {
        return Err(ConfigError::ChannelListMismatch {
            names: names.len(),
            channel_counts: channel_counts.len(),
        });
    }

    if !nominal_rate.is_finite() || nominal_rate < 0.0 {
        return Err(ConfigError::InvalidRate(nominal_rate));
    }

    names
        .iter()
        .zip(channel_counts)
        .enumerate()
        .map(|(slot, (name, &count))| {
            if name.is_empty() {
                return Err(ConfigError::EmptyStreamName { slot });
            }
            let channel_count = usize::try_from(count)
                .map_err(|_| ConfigError::NegativeChannelCount { slot, count })?;

            Ok(OutletDeclaration {
                name: name.clone(),
                stream_type: stream_type.to_string(),
                channel_count,
                nominal_rate,
                channel_format,
            })
        })
        .collect()
}

/// Live association between a slot and an outlet
pub struct OutletBinding<O> {
    declaration: OutletDeclaration,
    outlet: O,
}

impl<O: Outlet> OutletBinding<O> {
    pub fn declaration(&self) -> &OutletDeclaration {
        &self.declaration
    }

    pub fn channel_count(&self) -> usize {
        self.declaration.channel_count
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.outlet.connection_id()
    }

    pub fn outlet(&self) -> &O {
        &self.outlet
    }
}

/// State of one outbound slot
pub struct OutletSlot<O> {
    name: String,
    binding: Option<OutletBinding<O>>,
    status: OutletStatus,
    last_error: Option<TransportError>,
    stats: SlotStats,
}

impl<O> Default for OutletSlot<O> {
    fn default() -> Self {
        OutletSlot {
            name: String::new(),
            binding: None,
            status: OutletStatus::Ok,
            last_error: None,
            stats: SlotStats::default(),
        }
    }
}

impl<O: Outlet> OutletSlot<O> {
    /// Declared stream name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Option<&OutletBinding<O>> {
        self.binding.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.binding.is_some()
    }

    pub fn status(&self) -> OutletStatus {
        self.status
    }

    /// Last transport failure on this slot, cleared by a successful create
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> &SlotStats {
        &self.stats
    }
}

/// Outcome of a rebuild
#[derive(Debug, Default)]
pub struct RebuildReport {
    /// Slots whose outlet was (re)created
    pub created: Vec<usize>,
    /// Slots whose outlet was kept as is
    pub kept: Vec<usize>,
    /// Slots whose outlet could not be created
    pub failed: Vec<(usize, TransportError)>,
}

/// Outcome of a push pass
#[derive(Debug, Default)]
pub struct PushReport {
    /// Samples pushed
    pub pushed: usize,
    /// Whether the group status blocked every push
    pub suppressed: bool,
    /// Slots whose push failed; their outlet was released
    pub failed: Vec<(usize, TransportError)>,
}

/// Owns the outbound slots of a node
pub struct OutletManager<O> {
    slots: SlotSet<OutletSlot<O>>,
    status: OutletStatus,
}

impl<O: Outlet> Default for OutletManager<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Outlet> OutletManager<O> {
    pub fn new() -> Self {
        OutletManager {
            slots: SlotSet::new("Data"),
            status: OutletStatus::Ok,
        }
    }

    /// Group validation status
    pub fn status(&self) -> OutletStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&OutletSlot<O>> {
        self.slots.get(index).map(|slot| slot.value())
    }

    pub fn slots(&self) -> impl Iterator<Item = &OutletSlot<O>> {
        self.slots.values()
    }

    /// Number of slots holding an outlet
    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_active()).count()
    }

    /// Validate the declared group and bring the outlets in line with it
    ///
    /// On a validation error the group status records it, every existing
    /// outlet is left in place and the error is returned. Otherwise the slot
    /// list follows `names`, and each slot whose declaration changed gets its
    /// old outlet released before a new one is advertised.
    pub fn rebuild<T>(
        &mut self,
        transport: &T,
        stream_type: &str,
        names: &[String],
        channel_counts: &[i64],
        nominal_rate: f64,
        channel_format: ChannelFormat,
    ) -> Result<RebuildReport, ConfigError>
    where
        T: Transport<Outlet = O>,
    {
        let declarations = match validate_declarations(
            stream_type,
            names,
            channel_counts,
            nominal_rate,
            channel_format,
        ) {
            Ok(declarations) => declarations,
            Err(err) => {
                tracing::warn!("Outlets not rebuilt: {}", err);
                if !matches!(err, ConfigError::InvalidRate(_)) {
                    self.status = OutletStatus::from(&err);
                    for state in self.slots.values_mut() {
                        state.status = self.status;
                    }
                }
                return Err(err);
            }
        };

        self.status = OutletStatus::Ok;
        self.slots
            .resize_with(declarations.len(), |_| OutletSlot::default());

        let mut report = RebuildReport::default();

        for (index, (slot, declaration)) in self.slots.iter_mut().zip(declarations).enumerate() {
            let label = slot.label().to_string();
            let state = slot.value_mut();
            state.status = OutletStatus::Ok;
            state.name = declaration.name.clone();

            let unchanged = state
                .binding
                .as_ref()
                .map_or(false, |binding| binding.declaration == declaration);
            if unchanged {
                report.kept.push(index);
                continue;
            }

            state.binding = None;

            match transport.open_outlet(&declaration.to_spec()) {
                Ok(outlet) => {
                    tracing::info!(
                        "{}: outlet '{}' ({} channels, type '{}') created as {}",
                        label,
                        declaration.name,
                        declaration.channel_count,
                        declaration.stream_type,
                        outlet.connection_id()
                    );
                    state.binding = Some(OutletBinding {
                        declaration,
                        outlet,
                    });
                    state.last_error = None;
                    state.stats.record_connection();
                    report.created.push(index);
                }
                Err(err) => {
                    tracing::warn!("{}: {}", label, err);
                    state.stats.record_error();
                    state.last_error = Some(err.clone());
                    report.failed.push((index, err));
                }
            }
        }

        Ok(report)
    }

    /// Push one sample per active slot
    ///
    /// `values[i]` feeds slot `i`; it is padded with zeros or truncated to
    /// the slot's declared channel count. Nothing is pushed while the group
    /// status is not `Ok`.
    pub fn push_all(&mut self, values: &[Vec<f64>]) -> PushReport {
        let mut report = PushReport::default();

        if self.status != OutletStatus::Ok {
            report.suppressed = true;
            return report;
        }

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let label = slot.label().to_string();
            let state = slot.value_mut();

            let binding = match state.binding.as_mut() {
                Some(binding) => binding,
                None => continue,
            };

            let input = values.get(index).map(Vec::as_slice).unwrap_or(&[]);
            let sample = shape_sample(input, binding.declaration.channel_count);

            match binding.outlet.push_sample(&sample) {
                Ok(()) => {
                    state.stats.record_push();
                    report.pushed += 1;
                }
                Err(err) => {
                    tracing::warn!("{}: releasing outlet after push failure: {}", label, err);
                    state.binding = None;
                    state.stats.record_error();
                    state.last_error = Some(err.clone());
                    report.failed.push((index, err));
                }
            }
        }

        report
    }

    /// Release every outlet, withdrawing their advertisements
    pub fn release_all(&mut self) {
        for state in self.slots.values_mut() {
            state.binding = None;
        }
    }

    /// Per-slot views
    pub fn snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let state = slot.value();
                let (channel_count, nominal_rate) = state
                    .binding
                    .as_ref()
                    .map_or((0, 0.0), |b| (b.declaration.channel_count, b.declaration.nominal_rate));

                SlotSnapshot {
                    index,
                    label: slot.label().to_string(),
                    stream_name: state.name.clone(),
                    active: state.is_active(),
                    channel_count,
                    nominal_rate,
                    stats: state.stats.clone(),
                }
            })
            .collect()
    }
}

fn shape_sample(values: &[f64], channel_count: usize) -> Vec<f64> {
    let mut sample: Vec<f64> = values.iter().copied().take(channel_count).collect();
    sample.resize(channel_count, 0.0);
    sample
}
