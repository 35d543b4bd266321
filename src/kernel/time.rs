use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

/// Default simulator cadence.
pub const TICK_MS: u64 = 2_500;

/// Periodic effects fire while `elapsed % period` is inside this window.
pub const BOUNDARY_WINDOW_SECS: u64 = 3;

/// Simulated time since the session started. Monotonic, millisecond resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime {
    pub millis: u64,
}

impl SimTime {
    pub const ZERO: SimTime = SimTime { millis: 0 };

    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self { millis: secs * 1_000 }
    }

    /// Whole elapsed seconds (truncated).
    pub fn as_secs(&self) -> u64 {
        self.millis / 1_000
    }
}

impl From<Duration> for SimTime {
    fn from(d: Duration) -> Self {
        Self { millis: d.as_millis().min(u64::MAX as u128) as u64 }
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        let add = rhs.as_millis().min(u64::MAX as u128) as u64;
        SimTime { millis: self.millis.saturating_add(add) }
    }
}

/// `{days}d {hours}h {minutes}m {seconds}s`
pub fn format_uptime(elapsed: SimTime) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
}

/// Boundary gating: true while `value` sits in the first `window` units after a
/// multiple of `period`. Tolerates tick jitter where exact equality would not.
pub fn within_window(value: u64, period: u64, window: u64) -> bool {
    period != 0 && value % period < window
}

/// True on the first seconds of every `every_minutes`-th elapsed minute
/// (never at minute zero).
pub fn on_minute_boundary(elapsed: SimTime, every_minutes: u64) -> bool {
    let secs = elapsed.as_secs();
    let minutes = secs / 60;
    minutes > 0
        && every_minutes != 0
        && minutes % every_minutes == 0
        && within_window(secs, 60, BOUNDARY_WINDOW_SECS)
}

/// Maps simulated time onto wall-clock timestamps for log entries.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    origin: DateTime<Utc>,
}

impl SimClock {
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self { origin }
    }

    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    pub fn wall(&self, at: SimTime) -> DateTime<Utc> {
        self.origin + chrono::Duration::milliseconds(at.millis.min(i64::MAX as u64) as i64)
    }
}
