//! Time source abstraction.

use chrono::Utc;

/// Source of the current time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}
