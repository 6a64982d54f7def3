//! Inbound slot management
//!
//! Each slot may hold one inlet binding. A bind pass matches every slot's
//! target name against a resolution snapshot and opens a fresh inlet on the
//! match; a drain pass pulls whatever each bound inlet has, in bounded
//! chunks, and commits it newest first into the slot output.

use crate::buffer::{SampleBuffer, SlotOutput};
use crate::error::{ConfigError, EngineError};
use crate::resolver::select_by_name;
use crate::slot_set::{ResizeEvent, SlotSet};
use crate::stats::{SlotSnapshot, SlotStats};
use slotstream_transport::{
    ConnectionId, Inlet, StreamDescriptor, Transport, TransportError, TransportResult,
};
use std::time::Duration;

/// Default cap on samples drained per slot per cycle
pub const DEFAULT_MAX_SAMPLES: usize = 512;

/// Default number of samples requested per pull
pub const DEFAULT_CHUNK_SIZE: usize = 32;

/// Limits for one drain pass
///
/// `pull_timeout` applies to every pull of every slot. Zero never blocks;
/// any positive value can stall the whole cycle by that amount per stream,
/// per pull, whenever a stream has nothing buffered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrainParams {
    pub max_samples: usize,
    pub chunk_size: usize,
    pub pull_timeout: Duration,
}

impl DrainParams {
    /// Validated drain limits
    ///
    /// `chunk_size` ideally divides `max_samples`; when it does not, the last
    /// pull of a pass simply requests fewer samples.
    pub fn new(
        max_samples: usize,
        chunk_size: usize,
        pull_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if max_samples == 0 || chunk_size == 0 {
            return Err(ConfigError::InvalidChunking {
                chunk_size,
                max_samples,
            });
        }

        if max_samples % chunk_size != 0 {
            tracing::debug!(
                "Chunk size {} does not divide max samples {}",
                chunk_size,
                max_samples
            );
        }

        Ok(DrainParams {
            max_samples,
            chunk_size,
            pull_timeout,
        })
    }
}

impl Default for DrainParams {
    fn default() -> Self {
        DrainParams {
            max_samples: DEFAULT_MAX_SAMPLES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pull_timeout: Duration::ZERO,
        }
    }
}

/// Pull from `inlet` until it runs dry or `max_samples` are collected
///
/// Each pull asks for at most `chunk_size` samples and never for more than
/// the remaining budget, so the total never exceeds `max_samples`.
///
/// A pull that fails after earlier pulls of the same pass returned data ends
/// the pass with those samples; the failure surfaces on the next pass. A
/// failure on the first pull is returned as is.
pub fn drain_inlet<I: Inlet>(inlet: &mut I, params: &DrainParams) -> TransportResult<SampleBuffer> {
    let chunk_size = params.chunk_size.max(1);
    let mut buffer = SampleBuffer::with_capacity(chunk_size.min(params.max_samples));

    while buffer.len() < params.max_samples {
        let request = chunk_size.min(params.max_samples - buffer.len());
        let mut chunk = match inlet.pull_chunk(request, params.pull_timeout) {
            Ok(chunk) => chunk,
            Err(err) if buffer.is_empty() => return Err(err),
            Err(err) => {
                tracing::debug!("Keeping {} samples pulled before failure: {}", buffer.len(), err);
                break;
            }
        };
        if chunk.is_empty() {
            break;
        }

        chunk.truncate(request);
        buffer.append(chunk);
    }

    Ok(buffer)
}

/// Live association between a slot and an inlet
pub struct InletBinding<I> {
    descriptor: StreamDescriptor,
    inlet: I,
}

impl<I: Inlet> InletBinding<I> {
    /// Descriptor the binding was made from
    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    pub fn channel_count(&self) -> usize {
        self.descriptor.channel_count
    }

    pub fn nominal_rate(&self) -> f64 {
        self.descriptor.nominal_rate
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.inlet.connection_id()
    }

    pub fn inlet(&self) -> &I {
        &self.inlet
    }
}

/// State of one inbound slot
pub struct InletSlot<I> {
    target_name: String,
    binding: Option<InletBinding<I>>,
    output: SlotOutput,
    stats: SlotStats,
}

impl<I> Default for InletSlot<I> {
    fn default() -> Self {
        InletSlot {
            target_name: String::new(),
            binding: None,
            output: SlotOutput::default(),
            stats: SlotStats::default(),
        }
    }
}

impl<I: Inlet> InletSlot<I> {
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn binding(&self) -> Option<&InletBinding<I>> {
        self.binding.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.binding.is_some()
    }

    pub fn output(&self) -> &SlotOutput {
        &self.output
    }

    pub fn stats(&self) -> &SlotStats {
        &self.stats
    }

    /// Release the inlet and fall back to the inactive output shape
    fn unbind(&mut self) {
        self.binding = None;
        self.output.reset();
    }
}

/// Outcome of a bind pass
#[derive(Debug, Default)]
pub struct BindReport {
    /// Slots that now hold a fresh binding
    pub bound: Vec<usize>,
    /// Slots with an empty target name
    pub empty: Vec<usize>,
    /// Slots whose target name matched nothing
    pub unmatched: Vec<usize>,
    /// Slots whose inlet could not be opened
    pub failed: Vec<(usize, TransportError)>,
}

/// Outcome of a drain pass
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Samples drained across all slots
    pub samples: usize,
    /// Slots still bound after the pass
    pub active_slots: usize,
    /// Slots whose binding was dropped because a pull failed
    pub failed: Vec<(usize, TransportError)>,
}

/// Owns the inbound slots of a node
pub struct InletManager<I> {
    slots: SlotSet<InletSlot<I>>,
}

impl<I: Inlet> Default for InletManager<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Inlet> InletManager<I> {
    pub fn new() -> Self {
        InletManager {
            slots: SlotSet::new("Stream name"),
        }
    }

    /// Grow or shrink the slot list; dropped slots release their inlets
    pub fn resize(&mut self, count: usize) -> Option<ResizeEvent> {
        self.slots.resize_with(count, |_| InletSlot::default())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&InletSlot<I>> {
        self.slots.get(index).map(|slot| slot.value())
    }

    pub fn slots(&self) -> impl Iterator<Item = &InletSlot<I>> {
        self.slots.values()
    }

    /// Set the stream name a slot should bind to on the next bind pass
    pub fn set_target_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), EngineError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(EngineError::SlotOutOfRange { index, len })?;

        slot.value_mut().target_name = name.into();
        Ok(())
    }

    /// Target names in slot order
    pub fn target_names(&self) -> Vec<String> {
        self.slots.values().map(|s| s.target_name.clone()).collect()
    }

    /// Number of slots holding a binding
    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_active()).count()
    }

    /// Rebind every slot against a resolution snapshot
    ///
    /// Each slot releases its current inlet first. A slot whose name is empty
    /// or matches nothing stays inactive; that is not an error. Several slots
    /// naming the same stream each get their own inlet on it. One slot
    /// failing to open never stops the others.
    pub fn bind<T>(
        &mut self,
        transport: &T,
        candidates: &[StreamDescriptor],
        max_buffered: Duration,
    ) -> BindReport
    where
        T: Transport<Inlet = I>,
    {
        let mut report = BindReport::default();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let label = slot.label().to_string();
            let state = slot.value_mut();
            state.unbind();

            if state.target_name.is_empty() {
                tracing::debug!("{}: no stream name, slot stays inactive", label);
                report.empty.push(index);
                continue;
            }

            let descriptor = match select_by_name(candidates, &state.target_name) {
                Some(descriptor) => descriptor,
                None => {
                    tracing::debug!(
                        "{}: no advertised stream named '{}'",
                        label,
                        state.target_name
                    );
                    report.unmatched.push(index);
                    continue;
                }
            };

            match transport.open_inlet(descriptor, max_buffered) {
                Ok(inlet) => {
                    tracing::info!(
                        "{}: bound to '{}' ({} channels @ {} Hz, {})",
                        label,
                        descriptor.name,
                        descriptor.channel_count,
                        descriptor.nominal_rate,
                        inlet.connection_id()
                    );
                    state.output =
                        SlotOutput::for_stream(descriptor.channel_count, descriptor.nominal_rate);
                    state.binding = Some(InletBinding {
                        descriptor: descriptor.clone(),
                        inlet,
                    });
                    state.stats.record_connection();
                    report.bound.push(index);
                }
                Err(err) => {
                    tracing::warn!("{}: {}", label, err);
                    state.stats.record_error();
                    report.failed.push((index, err));
                }
            }
        }

        report
    }

    /// Drain every bound slot once
    ///
    /// Slots are visited in order. Unbound slots expose zero channels and
    /// zero samples. A failed drain drops that slot's binding and leaves it
    /// with no samples this cycle; other slots are unaffected.
    pub fn drain(&mut self, params: &DrainParams) -> DrainReport {
        let mut report = DrainReport::default();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let label = slot.label().to_string();
            let state = slot.value_mut();

            let binding = match state.binding.as_mut() {
                Some(binding) => binding,
                None => {
                    state.output.reset();
                    continue;
                }
            };

            // A failure on the first pull clears the slot for this cycle.
            match drain_inlet(&mut binding.inlet, params) {
                Ok(buffer) => {
                    report.samples += buffer.len();
                    report.active_slots += 1;
                    state.stats.record_drain(buffer.len(), buffer.pulls());
                    state.output.commit(buffer);
                }
                Err(err) => {
                    tracing::warn!("{}: dropping binding after pull failure: {}", label, err);
                    state.stats.record_error();
                    state.unbind();
                    report.failed.push((index, err));
                }
            }
        }

        report
    }

    /// Release every inlet
    pub fn unbind_all(&mut self) {
        for state in self.slots.values_mut() {
            state.unbind();
        }
    }

    /// Per-slot views
    pub fn snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let state = slot.value();
                SlotSnapshot {
                    index,
                    label: slot.label().to_string(),
                    stream_name: state.target_name.clone(),
                    active: state.is_active(),
                    channel_count: state.output.channel_count(),
                    nominal_rate: state.output.nominal_rate(),
                    stats: state.stats.clone(),
                }
            })
            .collect()
    }
}
