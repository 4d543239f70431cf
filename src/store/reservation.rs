/*!
 * Reservation Engine
 *
 * All-or-nothing multi-seat reservations. The whole request is validated
 * and committed under the event lock, so there is never a rollback and a
 * failed request never consumes a reservation id.
 */

use super::event::{Event, GridSnapshot};
use super::event_store::EventStore;
use super::grid::SeatGrid;
use crate::core::limits::MAX_RESERVATION_SIZE;
use crate::core::types::{EventId, ReservationId, SeatCoord, FREE_SEAT};
use crate::core::StoreError;
use crate::delay::StateDelay;
use tracing::debug;

/// Reserves and inspects seats of events held by an [`EventStore`]
#[derive(Clone)]
pub struct ReservationEngine {
    store: EventStore,
}

impl ReservationEngine {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Reserve every seat in `seats` under one new reservation id
    ///
    /// Fails on the first offending seat in input order. Bounds are checked
    /// for the whole request before any occupancy is read.
    pub fn reserve(
        &self,
        event_id: EventId,
        seats: &[SeatCoord],
    ) -> Result<ReservationId, StoreError> {
        let event = self.store.fetch(event_id)?;
        let reservation = reserve_seats(&event, seats, self.store.delay())?;

        debug!(
            event_id,
            reservation,
            seats = seats.len(),
            "Reservation committed"
        );
        Ok(reservation)
    }

    /// Row-major copy of an event's grid taken under the event lock
    pub fn show(&self, event_id: EventId) -> Result<GridSnapshot, StoreError> {
        let event = self.store.fetch(event_id)?;
        Ok(snapshot(&event, self.store.delay()))
    }
}

fn check_request_size(seats: &[SeatCoord]) -> Result<(), StoreError> {
    if seats.is_empty() {
        return Err(StoreError::InvalidSeat("no seats requested".to_string()));
    }
    if seats.len() > MAX_RESERVATION_SIZE {
        return Err(StoreError::InvalidSeat(format!(
            "{} seats requested, at most {} allowed",
            seats.len(),
            MAX_RESERVATION_SIZE
        )));
    }
    Ok(())
}

/// Validate-then-commit on one event
///
/// Holds the event lock for the whole call. The three passes (bounds,
/// occupancy, write) run strictly in that order; nothing is written until
/// the request is known to succeed.
pub fn reserve_seats(
    event: &Event,
    seats: &[SeatCoord],
    delay: StateDelay,
) -> Result<ReservationId, StoreError> {
    check_request_size(seats)?;
    let mut grid = event.lock_grid();

    let slots = resolve_slots(&grid, seats)?;
    check_free(&grid, seats, &slots, delay)?;

    let reservation = grid.next_reservation();
    for slot in slots {
        delay.pause();
        grid.set(slot, reservation);
    }
    Ok(reservation)
}

fn resolve_slots(grid: &SeatGrid, seats: &[SeatCoord]) -> Result<Vec<usize>, StoreError> {
    seats
        .iter()
        .map(|seat| grid.slot(*seat).ok_or(StoreError::OutOfBounds { seat: *seat }))
        .collect()
}

fn check_free(
    grid: &SeatGrid,
    seats: &[SeatCoord],
    slots: &[usize],
    delay: StateDelay,
) -> Result<(), StoreError> {
    for (i, (seat, slot)) in seats.iter().zip(slots).enumerate() {
        delay.pause();
        // A seat named twice counts as taken by the earlier mention
        if grid.get(*slot) != FREE_SEAT || slots[..i].contains(slot) {
            return Err(StoreError::AlreadyReserved { seat: *seat });
        }
    }
    Ok(())
}

/// Copy the grid seat by seat under the event lock
pub fn snapshot(event: &Event, delay: StateDelay) -> GridSnapshot {
    let grid = event.lock_grid();
    let seats = (0..grid.len())
        .map(|slot| {
            delay.pause();
            grid.get(slot)
        })
        .collect();

    GridSnapshot {
        event_id: event.id(),
        rows: grid.rows(),
        cols: grid.cols(),
        seats,
    }
}
