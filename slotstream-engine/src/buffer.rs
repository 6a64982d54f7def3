//! Per-cycle sample buffers
//!
//! A `SampleBuffer` accumulates what one drain pass pulled from an inlet, in
//! arrival order. It lives for a single cycle: it is committed into the slot's
//! `SlotOutput` and then dropped.

use slotstream_transport::Chunk;

/// Samples collected by one drain pass, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<Vec<f64>>,
    timestamps: Vec<f64>,
    pulls: usize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SampleBuffer {
            samples: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
            pulls: 0,
        }
    }

    /// Append one pulled chunk
    pub fn append(&mut self, chunk: Chunk) {
        let (samples, timestamps) = chunk.into_parts();
        self.samples.extend(samples);
        self.timestamps.extend(timestamps);
        self.pulls += 1;
    }

    /// Number of samples collected
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of non-empty pulls that contributed
    pub fn pulls(&self) -> usize {
        self.pulls
    }

    /// Samples in arrival order
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Timestamps in arrival order
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }
}

/// What a slot exposes to the host after a cycle
///
/// Channels are stored channel-major (`channels[c][i]`) and every channel,
/// like the timestamp list, is newest first: index 0 holds the most recent
/// sample of the cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOutput {
    channels: Vec<Vec<f64>>,
    timestamps: Vec<f64>,
    channel_count: usize,
    nominal_rate: f64,
}

impl SlotOutput {
    /// Empty output for a slot bound to a stream of the given shape
    pub fn for_stream(channel_count: usize, nominal_rate: f64) -> Self {
        SlotOutput {
            channels: vec![Vec::new(); channel_count],
            timestamps: Vec::new(),
            channel_count,
            nominal_rate,
        }
    }

    /// Replace the output with `buffer`, reversed to newest first
    ///
    /// The reversal happens once over the whole cycle's buffer, so the
    /// ordering does not depend on how many pulls produced it. Samples
    /// narrower than the channel count are padded with zeros.
    pub fn commit(&mut self, buffer: SampleBuffer) {
        let count = buffer.len();
        self.channels = vec![Vec::with_capacity(count); self.channel_count];

        for sample in buffer.samples.iter().rev() {
            for (channel, out) in self.channels.iter_mut().enumerate() {
                out.push(sample.get(channel).copied().unwrap_or(0.0));
            }
        }

        self.timestamps = buffer.timestamps;
        self.timestamps.reverse();
    }

    /// Reset to the inactive shape: zero channels, zero samples
    pub fn reset(&mut self) {
        *self = SlotOutput::default();
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn nominal_rate(&self) -> f64 {
        self.nominal_rate
    }

    /// Samples per channel in this cycle
    pub fn sample_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Timestamps, newest first
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }
}
