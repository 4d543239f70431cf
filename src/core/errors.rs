/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{EventId, SeatCoord, WorkerId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event store and reservation errors with serialization support
///
/// Every variant is non-fatal: it fails the command that raised it and is
/// reported through the response channel.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StoreError {
    #[error("EMS state must be initialized")]
    #[diagnostic(
        code(store::not_initialized),
        help("The store was terminated or never created. Start a new run.")
    )]
    NotInitialized,

    #[error("Event {0} already exists")]
    #[diagnostic(
        code(store::already_exists),
        help("Event ids are unique. Pick an unused id.")
    )]
    AlreadyExists(EventId),

    #[error("Event {0} not found")]
    #[diagnostic(
        code(store::not_found),
        help("Create the event before reserving or showing it.")
    )]
    NotFound(EventId),

    #[error("Invalid event dimensions {rows}x{cols}")]
    #[diagnostic(
        code(store::invalid_dimensions),
        help("Rows and columns must both be greater than zero.")
    )]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Invalid seat list: {0}")]
    #[diagnostic(
        code(store::invalid_seat),
        help("A reservation names between 1 and 256 seats.")
    )]
    InvalidSeat(String),

    #[error("Seat {seat} out of bounds")]
    #[diagnostic(
        code(store::out_of_bounds),
        help("Rows and columns are numbered from 1 up to the event dimensions.")
    )]
    OutOfBounds { seat: SeatCoord },

    #[error("Seat {seat} already reserved")]
    #[diagnostic(
        code(store::already_reserved),
        help("Seats are never released. Choose different seats.")
    )]
    AlreadyReserved { seat: SeatCoord },

    #[error("Failed to allocate event storage: {0}")]
    #[diagnostic(
        code(store::allocation_failure),
        help("The grid is too large for available memory.")
    )]
    AllocationFailure(String),
}

impl StoreError {
    /// Stable short code surfaced to response channels
    pub const fn short_code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::InvalidDimensions { .. } => "invalid_dimensions",
            Self::InvalidSeat(_) => "invalid_seat",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::AlreadyReserved { .. } => "already_reserved",
            Self::AllocationFailure(_) => "allocation_failure",
        }
    }
}

/// Scheduler-related errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Invalid worker count {0}")]
    #[diagnostic(
        code(scheduler::invalid_worker_count),
        help("The pool needs between 1 and 256 workers.")
    )]
    InvalidWorkerCount(usize),

    #[error("Failed to spawn worker {worker}: {reason}")]
    #[diagnostic(
        code(scheduler::spawn_failed),
        help("The OS refused to create a thread. Lower the worker count.")
    )]
    SpawnFailed { worker: WorkerId, reason: String },

    #[error("Worker {0} panicked while executing a command")]
    #[diagnostic(code(scheduler::worker_panicked))]
    WorkerPanicked(WorkerId),

    #[error("Command source failed: {0}")]
    #[diagnostic(
        code(scheduler::source_failed),
        help("The input stream could not be read. Check the job file.")
    )]
    Source(String),
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum EmsError {
    #[error("Store error: {0}")]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(ems::io_error),
        help("Filesystem or I/O operation failed. Check file permissions and paths.")
    )]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(ems::configuration_error),
        help("Invalid configuration. Review EMS_* environment variables and flags.")
    )]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(StoreError::NotFound(7).to_string(), "Event 7 not found");
        assert_eq!(
            StoreError::AlreadyReserved {
                seat: SeatCoord::new(1, 2)
            }
            .to_string(),
            "Seat (1,2) already reserved"
        );
    }

    #[test]
    fn test_store_error_serializes_tagged() {
        let json = serde_json::to_string(&StoreError::AlreadyExists(3)).unwrap();
        assert_eq!(json, r#"{"error_type":"already_exists","details":3}"#);

        let back: StoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StoreError::AlreadyExists(3));
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            StoreError::NotInitialized,
            StoreError::AlreadyExists(1),
            StoreError::NotFound(1),
            StoreError::InvalidSeat("empty".into()),
            StoreError::AlreadyReserved {
                seat: SeatCoord::new(1, 1),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(StoreError::short_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_diagnostic_code_forwarded_through_ems_error() {
        let err = EmsError::from(StoreError::NotFound(4));
        let code = Diagnostic::code(&err).map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("store::not_found"));
        assert_eq!(StoreError::NotFound(4).short_code(), "not_found");

        let io = EmsError::from(std::io::Error::other("disk"));
        let code = Diagnostic::code(&io).map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("ems::io_error"));
    }
}
