use crate::error::{SimError, SimResult};

/// A repeating timer driven by simulated time. Nothing here sleeps or
/// blocks: the owner feeds it frame deltas via [IntervalTimer::tick] and
/// acts on however many intervals completed during that frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntervalTimer {
    interval: f64,
    elapsed: f64,
}

impl IntervalTimer {
    /// Accumulated float error tolerated when checking for a completed
    /// interval. Without this, ten ticks of 0.1s may total 0.9999999 and
    /// miss a 1s deadline.
    const EPSILON: f64 = 1e-9;

    /// Create a timer that fires every `interval` seconds. The interval must
    /// be positive and finite.
    pub fn new(interval: f64) -> SimResult<Self> {
        Self::check_interval(interval)?;
        Ok(Self {
            interval,
            elapsed: 0.0,
        })
    }

    /// Seconds left until the next firing
    pub fn remaining(&self) -> f64 {
        (self.interval - self.elapsed).max(0.0)
    }

    /// Advance the timer and return the number of intervals that completed,
    /// saturating at `u64::MAX`. Any leftover time carries over to the next
    /// interval. Negative or non-finite deltas are ignored.
    pub fn tick(&mut self, delta_seconds: f64) -> u64 {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return 0;
        }

        self.elapsed += delta_seconds;
        let fired = ((self.elapsed + Self::EPSILON) / self.interval).floor();
        let leftover = self.elapsed - fired * self.interval;
        // Leftover is meaningless once elapsed dwarfs the interval
        self.elapsed = if leftover > 0.0 && leftover < self.interval {
            leftover
        } else {
            0.0
        };
        // Float to int casts saturate
        fired as u64
    }

    /// Drop any accumulated time, so the next firing is a full interval away.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    fn check_interval(interval: f64) -> SimResult<()> {
        if interval.is_finite() && interval > 0.0 {
            Ok(())
        } else {
            Err(SimError::invalid_field("interval_seconds", "range"))
        }
    }
}
