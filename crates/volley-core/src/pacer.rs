//! Launch pacing: job i starts no earlier than `i * throttle` after it is scheduled.

use std::time::Duration;

/// Computes the launch delay for each job from a fixed throttle interval.
///
/// The delay is a floor, not a deadline: a busy runtime may start a job later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Delay before job `index` may launch: `interval * index`, saturating.
    pub fn delay_for(&self, index: usize) -> Duration {
        let factor = u32::try_from(index).unwrap_or(u32::MAX);
        self.interval.saturating_mul(factor)
    }
}
