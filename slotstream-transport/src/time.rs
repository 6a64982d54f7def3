//! Time utilities for sample stamping
//!
//! Samples carry timestamps in seconds relative to a transport epoch, the
//! same convention streaming layers use for their local clocks.

use std::ops::{Add, Sub};
use std::time::{Duration, Instant};

/// Monotonic point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(Instant);

impl Timestamp {
    /// Get the current timestamp
    #[inline]
    pub fn now() -> Self {
        Timestamp(Instant::now())
    }

    /// Time elapsed since this timestamp
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Seconds elapsed since `epoch`, saturating at zero
    pub fn as_secs_since(&self, epoch: Timestamp) -> f64 {
        self.0.saturating_duration_since(epoch.0).as_secs_f64()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, duration: Duration) -> Timestamp {
        Timestamp(self.0 + duration)
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, other: Timestamp) -> Duration {
        self.0.saturating_duration_since(other.0)
    }
}

/// Interval timer for periodic work such as statistics reports
pub struct Timer {
    interval: Duration,
    last_fire: Timestamp,
}

impl Timer {
    /// Create a timer that first expires one `interval` from now
    pub fn new(interval: Duration) -> Self {
        Timer {
            interval,
            last_fire: Timestamp::now(),
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the interval has elapsed since the last fire
    pub fn expired(&self) -> bool {
        self.last_fire.elapsed() >= self.interval
    }

    /// Restart the interval from now
    pub fn reset(&mut self) {
        self.last_fire = Timestamp::now();
    }

    /// Fire the timer if expired, returning true if it fired
    pub fn try_fire(&mut self) -> bool {
        if self.expired() {
            self.reset();
            true
        } else {
            false
        }
    }
}
