//! Wall-clock adapter.
//!
//! Job durations are computed against the robot's `mssnStrtTm`, which is
//! epoch seconds, so this reads the system clock rather than a monotonic one.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::ClockPort;

/// [`ClockPort`] backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64)
    }
}

/// Fixed clock for tests and simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl ClockPort for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}
