/*!
 * Worker Pool
 *
 * Coordinator of a fixed set of worker threads. Threads are spawned once
 * per run and park between rounds; a BARRIER ends a round, after which the
 * coordinator reopens the barrier and starts the next one. The run ends
 * when a worker reads the end of the command stream.
 */

use super::sink::ResponseSink;
use super::source::CommandSource;
use super::state::SchedulerState;
use super::worker::{Shared, Worker};
use crate::core::limits::{MAX_WORKERS, WORKER_THREAD_PREFIX};
use crate::core::types::WorkerId;
use crate::core::{EmsConfig, EmsResult, SchedulerError};
use crate::delay::StateDelay;
use crate::monitoring::{generate_run_id, AtomicSchedulerStats, SchedulerStats};
use crate::store::{EventStore, ReservationEngine};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, info_span, warn};

/// What a finished run looked like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub workers: usize,
    /// Rounds started, one more than the barriers crossed
    pub rounds: u64,
    pub stats: SchedulerStats,
}

/// Fixed-size pool of command workers over one event store
pub struct WorkerPool {
    workers: usize,
    store: EventStore,
    state: Arc<SchedulerState>,
    stats: Arc<AtomicSchedulerStats>,
}

impl WorkerPool {
    pub fn new(store: EventStore, workers: usize) -> Result<Self, SchedulerError> {
        if workers == 0 || workers > MAX_WORKERS {
            return Err(SchedulerError::InvalidWorkerCount(workers));
        }

        Ok(Self {
            workers,
            store,
            state: Arc::new(SchedulerState::new(workers)),
            stats: Arc::new(AtomicSchedulerStats::new()),
        })
    }

    /// Pool with a fresh store built from configuration
    pub fn from_config(config: &EmsConfig) -> EmsResult<Self> {
        config.validate()?;
        let store = EventStore::new(StateDelay::new(config.state_access_delay));
        Ok(Self::new(store, config.workers)?)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Shared state handle, usable to observe workers while a run is going
    pub fn state(&self) -> Arc<SchedulerState> {
        Arc::clone(&self.state)
    }

    pub fn stats(&self) -> Arc<AtomicSchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Run every command of `source`, delivering results to `sink`
    ///
    /// Returns once a worker has read the end of the stream and every
    /// worker has stopped. The store is terminated before returning.
    pub fn run<S, K>(self, source: S, sink: K) -> EmsResult<RunSummary>
    where
        S: CommandSource + 'static,
        K: ResponseSink + 'static,
    {
        let run_id = generate_run_id();
        let span = info_span!("run", run_id = %run_id, workers = self.workers);
        let _entered = span.enter();

        let shared = Arc::new(Shared {
            state: Arc::clone(&self.state),
            dispatch: Mutex::new(source),
            engine: ReservationEngine::new(self.store.clone()),
            sink,
            stats: Arc::clone(&self.stats),
            source_error: Mutex::new(None),
        });

        let handles = self.spawn_workers(&shared)?;
        info!(workers = self.workers, "Worker pool started");

        let mut rounds = 0u64;
        let panicked = loop {
            self.state.begin_round();
            rounds += 1;
            self.stats.inc_rounds();

            let outcome = self.state.await_reports();
            if !outcome.panicked.is_empty() {
                break outcome.panicked;
            }
            if outcome.finished {
                break Vec::new();
            }
            info!(round = rounds, "All workers paused at barrier, resuming");
        };

        self.state.shutdown();
        join_workers(handles);

        if let Err(e) = self.store.terminate() {
            warn!(error = %e, "Store already terminated");
        }

        if let Some(worker) = panicked.first() {
            return Err(SchedulerError::WorkerPanicked(*worker).into());
        }
        if let Some(e) = shared.source_error.lock().take() {
            return Err(e.into());
        }

        let stats = self.stats.snapshot();
        info!(
            rounds,
            commands = stats.commands,
            failures = stats.failures,
            "Worker pool finished"
        );

        Ok(RunSummary {
            run_id,
            workers: self.workers,
            rounds,
            stats,
        })
    }

    fn spawn_workers<S, K>(&self, shared: &Arc<Shared<S, K>>) -> EmsResult<Vec<JoinHandle<()>>>
    where
        S: CommandSource + 'static,
        K: ResponseSink + 'static,
    {
        let mut handles = Vec::with_capacity(self.workers);

        for id in 1..=self.workers as WorkerId {
            let worker = Worker::new(id, Arc::clone(shared));
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", WORKER_THREAD_PREFIX, id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker = id, error = %e, "Failed to spawn worker");
                    self.state.shutdown();
                    join_workers(handles);
                    return Err(SchedulerError::SpawnFailed {
                        worker: id,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(handles)
    }
}

fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            error!("Worker thread exited abnormally");
        }
    }
}
