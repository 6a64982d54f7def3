//! Bounded sample queue backing each inlet
//!
//! The queue holds at most `capacity` samples. Once full, every new sample
//! evicts the oldest one, so a short buffer favours freshness and a long one
//! favours completeness.

use crate::traits::Chunk;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Queued sample with its timestamp
#[derive(Debug, Clone)]
struct QueuedSample {
    values: Vec<f64>,
    timestamp: f64,
}

struct QueueState {
    samples: VecDeque<QueuedSample>,
    /// Samples evicted because the queue was full
    dropped: u64,
    /// Producer is gone; no more samples will arrive
    closed: bool,
}

/// Drop-oldest bounded queue with blocking pops
pub struct SampleQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
    capacity: usize,
}

impl SampleQueue {
    /// Create a queue holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        SampleQueue {
            state: Mutex::new(QueueState {
                samples: VecDeque::with_capacity(capacity.min(4096)),
                dropped: 0,
                closed: false,
            }),
            ready: Condvar::new(),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one if full
    ///
    /// Returns true if a sample was evicted.
    pub fn push(&self, values: Vec<f64>, timestamp: f64) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        let evicted = if state.samples.len() >= self.capacity {
            state.samples.pop_front();
            state.dropped += 1;
            true
        } else {
            false
        };

        state.samples.push_back(QueuedSample { values, timestamp });
        drop(state);
        self.ready.notify_one();

        evicted
    }

    /// Take up to `max_samples` samples in arrival order
    ///
    /// With a positive `timeout` waits that long for the first sample.
    /// Returns `None` once the queue is closed and empty.
    pub fn pop_chunk(&self, max_samples: usize, timeout: Duration) -> Option<Chunk> {
        let mut state = self.state.lock();

        if state.samples.is_empty() && !state.closed && !timeout.is_zero() {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => {
                    while state.samples.is_empty() && !state.closed {
                        if self.ready.wait_until(&mut state, deadline).timed_out() {
                            break;
                        }
                    }
                }
                None => {
                    while state.samples.is_empty() && !state.closed {
                        self.ready.wait(&mut state);
                    }
                }
            }
        }

        if state.samples.is_empty() && state.closed {
            return None;
        }

        let take = max_samples.min(state.samples.len());
        let mut chunk = Chunk::with_capacity(take);
        for sample in state.samples.drain(..take) {
            chunk.push(sample.values, sample.timestamp);
        }

        Some(chunk)
    }

    /// Mark the producer as gone and wake any waiting consumer
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Whether the producer is gone
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of samples currently queued
    pub fn len(&self) -> usize {
        self.state.lock().samples.len()
    }

    /// Whether no samples are queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of samples retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples evicted because the queue was full
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}
