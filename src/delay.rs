/*!
 * State Access Delay
 *
 * Simulates a slow memory subsystem: every lookup in the event store and
 * every seat read or write sleeps first. Callers decide which locks are
 * held across the sleep, which sets how wide the race windows are.
 */

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Stateless delay injected before each state access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelay {
    delay: Duration,
}

impl StateDelay {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// No delay at all
    pub const fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    #[inline]
    pub const fn duration(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay, blocking the calling thread
    #[inline]
    pub fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// Block the calling thread for `ms` milliseconds (WAIT command)
pub fn block_for_millis(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
