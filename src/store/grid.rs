/*!
 * Seat Grid
 * Dense row-major occupancy storage for one event
 */

use crate::core::limits::MAX_EVENT_SEATS;
use crate::core::types::{ReservationId, SeatCoord, FREE_SEAT};
use crate::core::StoreError;

/// Occupancy of every seat of an event plus its reservation counter
///
/// The grid carries no lock of its own: the owning [`Event`](super::Event)
/// wraps it in a single mutex so a reservation or a scan sees the whole
/// grid at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatGrid {
    rows: usize,
    cols: usize,
    seats: Vec<ReservationId>,
    reservations: ReservationId,
}

impl SeatGrid {
    /// Allocate a zeroed grid
    ///
    /// Allocation is fallible: an oversized or unsatisfiable grid yields
    /// `AllocationFailure` instead of aborting.
    pub fn allocate(rows: usize, cols: usize) -> Result<Self, StoreError> {
        if rows == 0 || cols == 0 {
            return Err(StoreError::InvalidDimensions { rows, cols });
        }

        let len = rows
            .checked_mul(cols)
            .filter(|len| *len <= MAX_EVENT_SEATS)
            .ok_or_else(|| {
                StoreError::AllocationFailure(format!(
                    "{}x{} grid exceeds {} seats",
                    rows, cols, MAX_EVENT_SEATS
                ))
            })?;

        let mut seats = Vec::new();
        seats
            .try_reserve_exact(len)
            .map_err(|e| StoreError::AllocationFailure(e.to_string()))?;
        seats.resize(len, FREE_SEAT);

        Ok(Self {
            rows,
            cols,
            seats,
            reservations: 0,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Number of committed reservations, also the last id handed out
    #[inline]
    pub fn reservations(&self) -> ReservationId {
        self.reservations
    }

    /// Slot index of a seat, `None` when out of bounds
    #[inline]
    pub fn slot(&self, seat: SeatCoord) -> Option<usize> {
        seat.index_in(self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, slot: usize) -> ReservationId {
        self.seats[slot]
    }

    #[inline]
    pub(crate) fn set(&mut self, slot: usize, reservation: ReservationId) {
        self.seats[slot] = reservation;
    }

    /// Advance the counter; only called once a reservation is certain to commit
    #[inline]
    pub(crate) fn next_reservation(&mut self) -> ReservationId {
        self.reservations += 1;
        self.reservations
    }

    pub fn seats(&self) -> &[ReservationId] {
        &self.seats
    }
}
