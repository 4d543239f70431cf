/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters updated by workers on every command
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the scheduler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub commands: u64,
    pub events_created: u64,
    pub reservations_committed: u64,
    pub reservations_rejected: u64,
    pub shows: u64,
    pub lists: u64,
    pub waits: u64,
    pub barriers: u64,
    pub invalid: u64,
    pub failures: u64,
    pub rounds: u64,
}

/// Atomic scheduler statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing with worker state
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicSchedulerStats {
    commands: AtomicU64,
    events_created: AtomicU64,
    reservations_committed: AtomicU64,
    reservations_rejected: AtomicU64,
    shows: AtomicU64,
    lists: AtomicU64,
    waits: AtomicU64,
    barriers: AtomicU64,
    invalid: AtomicU64,
    failures: AtomicU64,
    rounds: AtomicU64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[inline(always)]
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl AtomicSchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter! {
        inc_commands => commands,
        inc_created => events_created,
        inc_committed => reservations_committed,
        inc_rejected => reservations_rejected,
        inc_shows => shows,
        inc_lists => lists,
        inc_waits => waits,
        inc_barriers => barriers,
        inc_invalid => invalid,
        inc_failures => failures,
        inc_rounds => rounds,
    }

    /// Get snapshot of current stats
    ///
    /// # Note
    /// Counters may be mutually inconsistent while workers run; each value
    /// on its own is accurate.
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            commands: self.commands.load(Ordering::Relaxed),
            events_created: self.events_created.load(Ordering::Relaxed),
            reservations_committed: self.reservations_committed.load(Ordering::Relaxed),
            reservations_rejected: self.reservations_rejected.load(Ordering::Relaxed),
            shows: self.shows.load(Ordering::Relaxed),
            lists: self.lists.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            barriers: self.barriers.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rounds: self.rounds.load(Ordering::Relaxed),
        }
    }
}
