/*!
 * Core Types
 * Common types used across the event management kernel
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event ID type
pub type EventId = u32;

/// Reservation ID type (0 marks a free seat)
pub type ReservationId = u32;

/// Worker ID type (workers are numbered from 1, 0 addresses "everyone")
pub type WorkerId = u32;

/// Seat value meaning "not reserved"
pub const FREE_SEAT: ReservationId = 0;

/// Common result type for kernel operations
pub type EmsResult<T> = Result<T, super::errors::EmsError>;

/// One-based seat coordinate inside an event grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatCoord {
    pub row: usize,
    pub col: usize,
}

impl SeatCoord {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major slot index inside a `rows x cols` grid, `None` when outside it
    #[inline]
    pub const fn index_in(&self, rows: usize, cols: usize) -> Option<usize> {
        if self.row == 0 || self.row > rows || self.col == 0 || self.col > cols {
            return None;
        }
        Some((self.row - 1) * cols + (self.col - 1))
    }
}

impl From<(usize, usize)> for SeatCoord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for SeatCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
