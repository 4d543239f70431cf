/*!
 * Scheduler Module
 *
 * Command processing pool: N workers pull commands from one shared source,
 * execute them against the event store and deliver responses to a sink.
 *
 * # Ordering
 *
 * - Command reads are totally ordered by the dispatch lock
 * - Execution overlaps across workers; operations on one event are
 *   serialized by that event's lock
 * - BARRIER stops every worker before its next command; WAIT with worker 0
 *   holds the dispatch lock for the whole delay
 */

mod command;
mod pool;
mod sink;
mod source;
mod state;
mod worker;

pub use command::{Command, CommandKind};
pub use pool::{RunSummary, WorkerPool};
pub use sink::{MemorySink, Response, ResponseSink};
pub use source::{CommandQueue, CommandSource};
pub use state::{RoundOutcome, SchedulerState, WorkerExit, WorkerPhase, WorkerSlot};
