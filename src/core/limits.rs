/*!
 * System Limits and Constants
 *
 * Centralized location for system-wide limits, defaults and wire constants.
 * Organized by domain.
 */

use std::time::Duration;

// =============================================================================
// RESERVATION LIMITS
// =============================================================================

/// Maximum number of seats a single RESERVE may name
/// Larger requests are rejected before the event lock is taken
pub const MAX_RESERVATION_SIZE: usize = 256;

/// Maximum seats in one event grid (rows * cols)
/// Guards the grid allocation against absurd dimensions from job files
pub const MAX_EVENT_SEATS: usize = 16 * 1024 * 1024;

// =============================================================================
// STATE ACCESS
// =============================================================================

/// Default simulated state access delay (disabled)
pub const DEFAULT_STATE_ACCESS_DELAY: Duration = Duration::ZERO;

/// Upper bound for the simulated delay accepted from configuration
pub const MAX_STATE_ACCESS_DELAY: Duration = Duration::from_secs(10);

// =============================================================================
// SCHEDULER LIMITS
// =============================================================================

/// Default number of workers in the command pool
pub const DEFAULT_WORKERS: usize = 4;

/// Maximum number of workers in the command pool
pub const MAX_WORKERS: usize = 256;

/// Default number of job files processed concurrently by the CLI
pub const DEFAULT_MAX_JOBS: usize = 1;

/// Worker thread name prefix (shows up in tracing output)
pub const WORKER_THREAD_PREFIX: &str = "ems-worker";

// =============================================================================
// JOB FILES
// =============================================================================

/// Extension of job files picked up when a directory is processed
pub const JOBS_EXTENSION: &str = "jobs";

/// Extension of the output written next to each job file
pub const OUTPUT_EXTENSION: &str = "out";

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Response status for a successful command
pub const WIRE_STATUS_OK: i32 = 0;

/// Response status for a failed command
pub const WIRE_STATUS_ERR: i32 = 1;
