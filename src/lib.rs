/*!
 * EMS Kernel Library
 * Concurrent event seating management exposed as a library
 */

pub mod core;
pub mod delay;
pub mod monitoring;
pub mod protocol;
pub mod runner;
pub mod scheduler;
pub mod store;

// Re-exports
pub use crate::core::*;
pub use delay::StateDelay;
pub use monitoring::{init_tracing, AtomicSchedulerStats, SchedulerStats};
pub use protocol::{parse_line, JobReader, TextSink, WireSink};
pub use runner::{process_file, process_path, JobReport, OutputFormat};
pub use scheduler::{
    Command, CommandQueue, CommandSource, MemorySink, Response, ResponseSink, RunSummary,
    SchedulerState, WorkerPool,
};
pub use store::{EventStore, GridSnapshot, ReservationEngine};
