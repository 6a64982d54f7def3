//! In-process loopback transport
//!
//! Outlets advertise on a shared bus, resolution snapshots the bus, and every
//! inlet gets its own bounded queue fed by the outlet it was opened on. Clones
//! of a `LoopbackTransport` share the same bus.

use crate::descriptor::{ConnectionId, OutletSpec, SourceHandle, StreamDescriptor};
use crate::error::{TransportError, TransportResult};
use crate::queue::SampleQueue;
use crate::time::Timestamp;
use crate::traits::{Chunk, Inlet, Outlet, Transport};
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Samples retained per second of buffer for irregular-rate streams
const IRREGULAR_SAMPLES_PER_SEC: f64 = 100.0;

/// Upper bound on a single inlet queue
const MAX_QUEUE_CAPACITY: usize = 1 << 22;

struct Advertisement {
    descriptor: StreamDescriptor,
    subscribers: Vec<Weak<SampleQueue>>,
}

struct BusState {
    next_handle: u64,
    advertisements: Vec<Advertisement>,
}

struct Bus {
    state: Mutex<BusState>,
    announced: Condvar,
    epoch: Timestamp,
}

/// Shared in-process transport
#[derive(Clone)]
pub struct LoopbackTransport {
    bus: Arc<Bus>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    /// Create an empty bus
    pub fn new() -> Self {
        LoopbackTransport {
            bus: Arc::new(Bus {
                state: Mutex::new(BusState {
                    next_handle: 1,
                    advertisements: Vec::new(),
                }),
                announced: Condvar::new(),
                epoch: Timestamp::now(),
            }),
        }
    }

    /// Number of currently advertised streams
    pub fn advertised_count(&self) -> usize {
        self.bus.state.lock().advertisements.len()
    }

    /// Number of live inlets attached to the named stream
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.bus
            .state
            .lock()
            .advertisements
            .iter()
            .filter(|ad| ad.descriptor.name == name)
            .map(|ad| ad.subscribers.iter().filter(|s| s.strong_count() > 0).count())
            .sum()
    }

    fn matching(state: &BusState, type_filter: &str) -> Vec<StreamDescriptor> {
        state
            .advertisements
            .iter()
            .filter(|ad| ad.descriptor.matches_type(type_filter))
            .map(|ad| ad.descriptor.clone())
            .collect()
    }
}

/// Queue capacity for an inlet retaining `max_buffered` of `descriptor`'s data
fn queue_capacity(descriptor: &StreamDescriptor, max_buffered: Duration) -> usize {
    let secs = max_buffered.as_secs_f64();
    let samples = if descriptor.is_irregular() {
        secs * IRREGULAR_SAMPLES_PER_SEC
    } else {
        secs * descriptor.nominal_rate
    };

    (samples.ceil() as usize).clamp(1, MAX_QUEUE_CAPACITY)
}

impl Transport for LoopbackTransport {
    type Inlet = LoopbackInlet;
    type Outlet = LoopbackOutlet;

    fn resolve(
        &self,
        type_filter: &str,
        min_sources: usize,
        wait: Duration,
    ) -> TransportResult<Vec<StreamDescriptor>> {
        let deadline = Instant::now().checked_add(wait);
        let mut state = self.bus.state.lock();

        loop {
            let found = Self::matching(&state, type_filter);
            if found.len() >= min_sources || wait.is_zero() {
                return Ok(found);
            }

            match deadline {
                Some(deadline) => {
                    if self.bus.announced.wait_until(&mut state, deadline).timed_out() {
                        return Ok(Self::matching(&state, type_filter));
                    }
                }
                None => self.bus.announced.wait(&mut state),
            }
        }
    }

    fn open_inlet(
        &self,
        descriptor: &StreamDescriptor,
        max_buffered: Duration,
    ) -> TransportResult<LoopbackInlet> {
        let mut state = self.bus.state.lock();

        let ad = state
            .advertisements
            .iter_mut()
            .find(|ad| ad.descriptor.handle == descriptor.handle)
            .ok_or_else(|| TransportError::OpenInletFailed {
                name: descriptor.name.clone(),
                reason: format!("{} is no longer advertised", descriptor.handle),
            })?;

        let capacity = queue_capacity(&ad.descriptor, max_buffered);
        let queue = Arc::new(SampleQueue::new(capacity));
        ad.subscribers.retain(|s| s.strong_count() > 0);
        ad.subscribers.push(Arc::downgrade(&queue));

        let inlet = LoopbackInlet {
            id: ConnectionId::next(),
            name: ad.descriptor.name.clone(),
            channel_count: ad.descriptor.channel_count,
            queue,
        };

        tracing::debug!(
            "Opened inlet {} on '{}' ({} samples of buffer)",
            inlet.id,
            inlet.name,
            capacity
        );

        Ok(inlet)
    }

    fn open_outlet(&self, spec: &OutletSpec) -> TransportResult<LoopbackOutlet> {
        spec.validate().map_err(|e| TransportError::OpenOutletFailed {
            name: spec.name.clone(),
            reason: e.to_string(),
        })?;

        let mut state = self.bus.state.lock();
        let handle = SourceHandle::new(state.next_handle);
        state.next_handle += 1;

        state.advertisements.push(Advertisement {
            descriptor: spec.to_descriptor(handle),
            subscribers: Vec::new(),
        });
        drop(state);
        self.bus.announced.notify_all();

        let outlet = LoopbackOutlet {
            id: ConnectionId::next(),
            handle,
            name: spec.name.clone(),
            channel_count: spec.channel_count,
            bus: self.bus.clone(),
        };

        tracing::debug!(
            "Advertised outlet {} '{}' ({} channels, type '{}')",
            outlet.id,
            spec.name,
            spec.channel_count,
            spec.stream_type
        );

        Ok(outlet)
    }
}

/// Inlet attached to a loopback outlet
pub struct LoopbackInlet {
    id: ConnectionId,
    name: String,
    channel_count: usize,
    queue: Arc<SampleQueue>,
}

impl LoopbackInlet {
    /// Stream name this inlet is attached to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples lost because the inlet buffer overflowed
    pub fn dropped_samples(&self) -> u64 {
        self.queue.dropped()
    }

    /// Samples waiting to be pulled
    pub fn queued_samples(&self) -> usize {
        self.queue.len()
    }
}

impl Inlet for LoopbackInlet {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn pull_chunk(&mut self, max_samples: usize, timeout: Duration) -> TransportResult<Chunk> {
        if max_samples == 0 {
            return Ok(Chunk::new());
        }

        self.queue
            .pop_chunk(max_samples, timeout)
            .ok_or_else(|| TransportError::StreamLost(self.name.clone()))
    }
}

/// Advertised loopback outlet
///
/// Dropping the outlet withdraws the advertisement and closes every inlet
/// attached to it.
pub struct LoopbackOutlet {
    id: ConnectionId,
    handle: SourceHandle,
    name: String,
    channel_count: usize,
    bus: Arc<Bus>,
}

impl LoopbackOutlet {
    /// Handle resolution reports for this outlet
    pub fn handle(&self) -> SourceHandle {
        self.handle
    }

    /// Advertised stream name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Outlet for LoopbackOutlet {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn push_sample(&mut self, values: &[f64]) -> TransportResult<()> {
        if values.len() != self.channel_count {
            return Err(TransportError::ChannelCountMismatch {
                expected: self.channel_count,
                actual: values.len(),
            });
        }

        let timestamp = Timestamp::now().as_secs_since(self.bus.epoch);
        let mut state = self.bus.state.lock();

        let ad = state
            .advertisements
            .iter_mut()
            .find(|ad| ad.descriptor.handle == self.handle)
            .ok_or_else(|| TransportError::StreamLost(self.name.clone()))?;

        ad.subscribers.retain(|subscriber| match subscriber.upgrade() {
            Some(queue) => {
                queue.push(values.to_vec(), timestamp);
                true
            }
            None => false,
        });

        Ok(())
    }
}

impl Drop for LoopbackOutlet {
    fn drop(&mut self) {
        let mut state = self.bus.state.lock();
        if let Some(pos) = state
            .advertisements
            .iter()
            .position(|ad| ad.descriptor.handle == self.handle)
        {
            let ad = state.advertisements.remove(pos);
            for queue in ad.subscribers.iter().filter_map(Weak::upgrade) {
                queue.close();
            }
        }

        tracing::debug!("Withdrew outlet {} '{}'", self.id, self.name);
    }
}
