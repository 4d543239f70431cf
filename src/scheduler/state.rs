/*!
 * Scheduler State
 *
 * Everything workers and their coordinator share: the barrier flag,
 * per-worker slots (pending delay and phase) and the round handshake the
 * parked pool waits on between barriers.
 */

use crate::core::types::WorkerId;
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle phase of one worker
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPhase {
    /// Parked between rounds
    Idle = 0,
    AwaitingCommand = 1,
    Executing = 2,
    /// Stopped at a barrier, waiting for the next round
    Paused = 3,
    Terminated = 4,
}

impl WorkerPhase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::AwaitingCommand,
            2 => Self::Executing,
            3 => Self::Paused,
            4 => Self::Terminated,
            _ => Self::Idle,
        }
    }
}

/// How a worker left a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerExit {
    /// Barrier reached
    Paused,
    /// End of commands reached
    Finished,
    Panicked,
}

/// Per-worker shared state
#[derive(Debug)]
pub struct WorkerSlot {
    id: WorkerId,
    pending_delay_ms: AtomicU64,
    phase: AtomicU8,
}

impl WorkerSlot {
    fn new(id: WorkerId) -> Self {
        Self {
            id,
            pending_delay_ms: AtomicU64::new(0),
            phase: AtomicU8::new(WorkerPhase::Idle as u8),
        }
    }

    #[inline]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    #[inline]
    pub fn pending_delay_ms(&self) -> u64 {
        self.pending_delay_ms.load(Ordering::Acquire)
    }

    #[inline]
    pub fn phase(&self) -> WorkerPhase {
        WorkerPhase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

/// Result of one round as seen by the coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// At least one worker read the end of the command stream
    pub finished: bool,
    pub panicked: Vec<WorkerId>,
}

#[derive(Debug, Default)]
struct Rounds {
    generation: u64,
    reported: usize,
    outcome: RoundOutcome,
    shutdown: bool,
}

/// State shared by the pool coordinator and its workers
///
/// # Synchronization
/// - `barrier_open`: read lock on every command, write lock to close it
/// - round handshake: one mutex plus condvar; workers park on it between
///   rounds, the coordinator waits on it for reports
pub struct SchedulerState {
    barrier_open: RwLock<bool>,
    workers: Vec<WorkerSlot>,
    rounds: Mutex<Rounds>,
    round_changed: Condvar,
}

impl SchedulerState {
    /// State for workers numbered `1..=workers`
    pub fn new(workers: usize) -> Self {
        Self {
            barrier_open: RwLock::new(true),
            workers: (1..=workers as WorkerId).map(WorkerSlot::new).collect(),
            rounds: Mutex::new(Rounds::default()),
            round_changed: Condvar::new(),
        }
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    #[inline]
    pub fn barrier_open(&self) -> bool {
        *self.barrier_open.read()
    }

    /// Stop every worker before its next command
    pub fn close_barrier(&self) {
        *self.barrier_open.write() = false;
    }

    pub fn slot(&self, worker: WorkerId) -> Option<&WorkerSlot> {
        let index = (worker as usize).checked_sub(1)?;
        self.workers.get(index)
    }

    pub fn slots(&self) -> &[WorkerSlot] {
        &self.workers
    }

    pub fn phase(&self, worker: WorkerId) -> Option<WorkerPhase> {
        self.slot(worker).map(WorkerSlot::phase)
    }

    pub(crate) fn set_phase(&self, worker: WorkerId, phase: WorkerPhase) {
        if let Some(slot) = self.slot(worker) {
            slot.phase.store(phase as u8, Ordering::Release);
        }
    }

    /// Queue a delay for a worker; false when no such worker exists
    pub fn defer(&self, worker: WorkerId, delay_ms: u64) -> bool {
        match self.slot(worker) {
            Some(slot) => {
                slot.pending_delay_ms.store(delay_ms, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Take and reset a worker's pending delay
    pub fn take_delay(&self, worker: WorkerId) -> u64 {
        self.slot(worker)
            .map(|slot| slot.pending_delay_ms.swap(0, Ordering::AcqRel))
            .unwrap_or(0)
    }

    /// Start a round: reopen the barrier, clear pending delays and wake
    /// every parked worker
    pub(crate) fn begin_round(&self) -> u64 {
        let mut rounds = self.rounds.lock();
        *self.barrier_open.write() = true;
        for slot in &self.workers {
            slot.pending_delay_ms.store(0, Ordering::Release);
        }

        rounds.generation += 1;
        rounds.reported = 0;
        rounds.outcome = RoundOutcome::default();
        self.round_changed.notify_all();
        rounds.generation
    }

    /// Park until a round newer than `seen` starts; `None` on shutdown
    pub(crate) fn await_round(&self, seen: u64) -> Option<u64> {
        let mut rounds = self.rounds.lock();
        while !rounds.shutdown && rounds.generation == seen {
            self.round_changed.wait(&mut rounds);
        }
        if rounds.shutdown {
            None
        } else {
            Some(rounds.generation)
        }
    }

    /// Report how a worker left the current round
    pub(crate) fn report(&self, worker: WorkerId, exit: WorkerExit) {
        let mut rounds = self.rounds.lock();
        rounds.reported += 1;
        match exit {
            WorkerExit::Finished => rounds.outcome.finished = true,
            WorkerExit::Panicked => rounds.outcome.panicked.push(worker),
            WorkerExit::Paused => {}
        }
        self.round_changed.notify_all();
    }

    /// Block until every worker reported for the current round
    pub(crate) fn await_reports(&self) -> RoundOutcome {
        let mut rounds = self.rounds.lock();
        while rounds.reported < self.workers.len() {
            self.round_changed.wait(&mut rounds);
        }
        rounds.outcome.clone()
    }

    /// Release every parked worker for good
    pub(crate) fn shutdown(&self) {
        let mut rounds = self.rounds.lock();
        rounds.shutdown = true;
        self.round_changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_barrier_toggle() {
        let state = SchedulerState::new(2);
        assert!(state.barrier_open());
        state.close_barrier();
        assert!(!state.barrier_open());
        state.begin_round();
        assert!(state.barrier_open());
    }

    #[test]
    fn test_defer_and_take_delay() {
        let state = SchedulerState::new(3);
        assert!(state.defer(2, 150));
        assert!(!state.defer(0, 10));
        assert!(!state.defer(4, 10));

        assert_eq!(state.slot(2).unwrap().pending_delay_ms(), 150);
        assert_eq!(state.take_delay(2), 150);
        assert_eq!(state.take_delay(2), 0);
    }

    #[test]
    fn test_new_round_clears_delays() {
        let state = SchedulerState::new(1);
        state.defer(1, 500);
        state.begin_round();
        assert_eq!(state.take_delay(1), 0);
    }

    #[test]
    fn test_round_handshake() {
        let state = Arc::new(SchedulerState::new(2));

        let handles: Vec<_> = (1..=2)
            .map(|id| {
                let state = state.clone();
                thread::spawn(move || {
                    let mut seen = 0;
                    let mut rounds = 0;
                    while let Some(generation) = state.await_round(seen) {
                        seen = generation;
                        rounds += 1;
                        let exit = if rounds == 2 {
                            WorkerExit::Finished
                        } else {
                            WorkerExit::Paused
                        };
                        state.report(id, exit);
                    }
                    rounds
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        state.begin_round();
        assert!(!state.await_reports().finished);
        state.begin_round();
        assert!(state.await_reports().finished);
        state.shutdown();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }
}
