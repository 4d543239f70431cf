/*!
 * Worker
 *
 * Command loop of one pool thread. Reading a command happens under the
 * dispatch lock; executing it happens after the lock is released, so
 * parsing is serialized while execution overlaps across workers.
 */

use super::command::Command;
use super::sink::{Response, ResponseSink};
use super::source::CommandSource;
use super::state::{SchedulerState, WorkerExit, WorkerPhase};
use crate::core::types::WorkerId;
use crate::core::{SchedulerError, StoreError};
use crate::delay::block_for_millis;
use crate::monitoring::{AtomicSchedulerStats, CommandSpan};
use crate::store::ReservationEngine;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything a run's workers share
pub(crate) struct Shared<S, K> {
    pub state: Arc<SchedulerState>,
    pub dispatch: Mutex<S>,
    pub engine: ReservationEngine,
    pub sink: K,
    pub stats: Arc<AtomicSchedulerStats>,
    pub source_error: Mutex<Option<SchedulerError>>,
}

pub(crate) struct Worker<S, K> {
    id: WorkerId,
    shared: Arc<Shared<S, K>>,
}

impl<S, K> Worker<S, K>
where
    S: CommandSource,
    K: ResponseSink,
{
    pub fn new(id: WorkerId, shared: Arc<Shared<S, K>>) -> Self {
        Self { id, shared }
    }

    /// Thread body: take part in rounds until the pool shuts down
    pub fn run(self) {
        let state = &self.shared.state;
        let mut seen = 0;

        while let Some(generation) = state.await_round(seen) {
            seen = generation;
            let exit = match panic::catch_unwind(AssertUnwindSafe(|| self.run_round())) {
                Ok(exit) => exit,
                Err(_) => {
                    error!(worker = self.id, round = generation, "Worker panicked");
                    WorkerExit::Panicked
                }
            };
            state.set_phase(
                self.id,
                match exit {
                    WorkerExit::Paused => WorkerPhase::Paused,
                    _ => WorkerPhase::Idle,
                },
            );
            state.report(self.id, exit);
        }

        state.set_phase(self.id, WorkerPhase::Terminated);
        debug!(worker = self.id, "Worker terminated");
    }

    /// Process commands until a barrier or the end of the stream
    fn run_round(&self) -> WorkerExit {
        let state = &self.shared.state;

        loop {
            if !state.barrier_open() {
                return WorkerExit::Paused;
            }

            let delay_ms = state.take_delay(self.id);
            if delay_ms > 0 {
                debug!(worker = self.id, delay_ms, "Applying queued delay");
                block_for_millis(delay_ms);
            }

            state.set_phase(self.id, WorkerPhase::AwaitingCommand);
            let mut source = self.shared.dispatch.lock();

            // A barrier closed while we waited for the dispatch lock
            if !state.barrier_open() {
                return WorkerExit::Paused;
            }

            let command = self.read_command(&mut source);
            self.shared.stats.inc_commands();

            match command {
                Command::Wait {
                    delay_ms,
                    target_worker: 0,
                } if delay_ms > 0 => {
                    // Global pause: nobody reads the next command meanwhile
                    self.shared.stats.inc_waits();
                    self.deliver(Response::Waiting { delay_ms });
                    info!(worker = self.id, delay_ms, "Dispatch paused");
                    block_for_millis(delay_ms);
                    drop(source);
                }
                Command::Barrier => {
                    state.close_barrier();
                    drop(source);
                    self.shared.stats.inc_barriers();
                    info!(worker = self.id, "Barrier reached");
                    return WorkerExit::Paused;
                }
                Command::EndOfCommands => {
                    drop(source);
                    debug!(worker = self.id, "End of commands");
                    return WorkerExit::Finished;
                }
                command => {
                    drop(source);
                    self.execute(command);
                }
            }
        }
    }

    /// Next command, with the dispatch lock held
    ///
    /// Once the source has failed every worker reads `EndOfCommands`, even
    /// if the source itself would keep producing commands.
    fn read_command(&self, source: &mut S) -> Command {
        let mut failed = self.shared.source_error.lock();
        if failed.is_some() {
            return Command::EndOfCommands;
        }

        match source.next_command() {
            Ok(command) => command,
            Err(e) => {
                error!(worker = self.id, error = %e, "Command source failed, stopping");
                *failed = Some(e);
                Command::EndOfCommands
            }
        }
    }

    fn execute(&self, command: Command) {
        let kind = command.kind();
        let span = CommandSpan::new(kind.as_str(), self.id);
        let _entered = span.enter();
        self.shared.state.set_phase(self.id, WorkerPhase::Executing);

        let engine = &self.shared.engine;
        let stats = &self.shared.stats;

        let outcome: Result<Option<Response>, StoreError> = match command {
            Command::Create {
                event_id,
                rows,
                cols,
            } => engine.store().create(event_id, rows, cols).map(|()| {
                stats.inc_created();
                Some(Response::Created { event_id })
            }),
            Command::Reserve { event_id, seats } => match engine.reserve(event_id, &seats) {
                Ok(reservation_id) => {
                    stats.inc_committed();
                    Ok(Some(Response::Reserved {
                        event_id,
                        reservation_id,
                    }))
                }
                Err(e) => {
                    stats.inc_rejected();
                    Err(e)
                }
            },
            Command::Show { event_id } => {
                stats.inc_shows();
                engine.show(event_id).map(|grid| Some(Response::Grid(grid)))
            }
            Command::ListEvents => {
                stats.inc_lists();
                engine
                    .store()
                    .list()
                    .map(|ids| Some(Response::Events { ids }))
            }
            Command::Wait {
                delay_ms,
                target_worker,
            } => {
                self.queue_delay(delay_ms, target_worker);
                Ok(None)
            }
            Command::Help => Ok(Some(Response::Help)),
            Command::Invalid => {
                stats.inc_invalid();
                warn!(worker = self.id, "Invalid command. See HELP for usage");
                Ok(Some(Response::Invalid))
            }
            Command::Empty | Command::Barrier | Command::EndOfCommands => Ok(None),
        };

        match outcome {
            Ok(Some(response)) => {
                span.record_success();
                self.deliver(response);
            }
            Ok(None) => span.record_success(),
            Err(error) => {
                span.record_error(&error.to_string());
                stats.inc_failures();
                warn!(
                    worker = self.id,
                    command = %kind,
                    code = error.short_code(),
                    error = %error,
                    "Command failed"
                );
                self.deliver(Response::Failed {
                    command: kind,
                    error,
                });
            }
        }
    }

    fn queue_delay(&self, delay_ms: u64, target_worker: WorkerId) {
        // `WAIT <ms> 0` with a delay never gets here, see `run_round`
        if delay_ms == 0 || target_worker == 0 {
            return;
        }
        self.shared.stats.inc_waits();
        if self.shared.state.defer(target_worker, delay_ms) {
            debug!(worker = self.id, target_worker, delay_ms, "Delay queued");
        } else {
            warn!(worker = self.id, target_worker, "Invalid thread id");
        }
    }

    fn deliver(&self, response: Response) {
        if let Err(e) = self.shared.sink.deliver(self.id, response) {
            error!(worker = self.id, error = %e, "Failed to write response");
        }
    }
}

