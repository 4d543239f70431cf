/*!
 * Store Module
 *
 * Shared in-memory state: events, their seat grids and the reservation
 * engine.
 *
 * # Locking discipline
 *
 * - One reader/writer lock over the event collection
 * - One mutex per event over its whole grid and reservation counter
 * - Lock order is always store then event, and the store lock is released
 *   before an event lock is taken on the reserve/show paths
 */

mod event;
mod event_store;
mod grid;
mod reservation;

pub use event::{Event, EventHandle, GridSnapshot};
pub use event_store::EventStore;
pub use grid::SeatGrid;
pub use reservation::{reserve_seats, snapshot, ReservationEngine};
