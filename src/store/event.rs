/*!
 * Event
 * A seating venue: fixed dimensions plus a lock-guarded seat grid
 */

use super::grid::SeatGrid;
use crate::core::types::{EventId, ReservationId};
use crate::core::StoreError;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to an event published in the store
pub type EventHandle = Arc<Event>;

/// One event and its seats
///
/// All seat data and the reservation counter sit behind one mutex; there
/// is no per-seat locking anywhere in the crate.
#[derive(Debug)]
pub struct Event {
    id: EventId,
    rows: usize,
    cols: usize,
    grid: Mutex<SeatGrid>,
}

impl Event {
    /// Build a fully initialized event (grid allocated and zeroed)
    pub fn new(id: EventId, rows: usize, cols: usize) -> Result<Self, StoreError> {
        let grid = SeatGrid::allocate(rows, cols)?;
        Ok(Self {
            id,
            rows,
            cols,
            grid: Mutex::new(grid),
        })
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Committed reservations so far
    pub fn reservations(&self) -> ReservationId {
        self.grid.lock().reservations()
    }

    /// Take the event lock
    #[inline]
    pub(crate) fn lock_grid(&self) -> MutexGuard<'_, SeatGrid> {
        self.grid.lock()
    }
}

/// Point-in-time copy of an event's seats, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub event_id: EventId,
    pub rows: usize,
    pub cols: usize,
    pub seats: Vec<ReservationId>,
}

impl GridSnapshot {
    /// Iterate rows in order, each a slice of `cols` seat values
    pub fn row_iter(&self) -> impl Iterator<Item = &[ReservationId]> {
        self.seats.chunks(self.cols.max(1))
    }

    /// Seat value at a one-based coordinate
    pub fn seat(&self, row: usize, col: usize) -> Option<ReservationId> {
        crate::core::types::SeatCoord::new(row, col)
            .index_in(self.rows, self.cols)
            .map(|slot| self.seats[slot])
    }

    /// Nested row-major copy of the grid
    pub fn to_rows(&self) -> Vec<Vec<ReservationId>> {
        self.row_iter().map(<[ReservationId]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_is_free() {
        let event = Event::new(5, 2, 3).unwrap();
        assert_eq!(event.id(), 5);
        assert_eq!((event.rows(), event.cols()), (2, 3));
        assert_eq!(event.reservations(), 0);
    }

    #[test]
    fn test_snapshot_rows() {
        let snapshot = GridSnapshot {
            event_id: 1,
            rows: 2,
            cols: 2,
            seats: vec![1, 1, 0, 2],
        };
        assert_eq!(snapshot.to_rows(), vec![vec![1, 1], vec![0, 2]]);
        assert_eq!(snapshot.seat(2, 2), Some(2));
        assert_eq!(snapshot.seat(3, 1), None);
    }
}
