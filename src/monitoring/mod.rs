/*!
 * Monitoring
 * Structured tracing setup and scheduler statistics
 */

mod stats;
mod tracer;

pub use stats::{AtomicSchedulerStats, SchedulerStats};
pub use tracer::{generate_run_id, init_tracing, CommandSpan, ENV_TRACE_JSON};
