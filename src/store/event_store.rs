/*!
 * Event Store
 * Insertion-ordered collection of events behind one reader/writer lock
 */

use super::event::{Event, EventHandle, GridSnapshot};
use crate::core::types::EventId;
use crate::core::StoreError;
use crate::delay::StateDelay;
use ahash::RandomState;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Published events
#[derive(Debug, Default)]
struct Catalog {
    events: Vec<EventHandle>,
    index: HashMap<EventId, usize, RandomState>,
}

impl Catalog {
    fn find(&self, id: EventId) -> Option<&EventHandle> {
        self.index.get(&id).map(|slot| &self.events[*slot])
    }
}

/// Event store
///
/// Cheap to clone; clones share the same events. `None` inside the lock
/// means the store was terminated and every operation reports
/// `NotInitialized`.
///
/// # Locking
/// - create: exclusive lock for the duplicate check, allocation and append
/// - get / list / dump: shared lock
/// - the lock is never held while an event's own lock is taken by callers
#[derive(Clone)]
pub struct EventStore {
    catalog: Arc<RwLock<Option<Catalog>>>,
    delay: StateDelay,
    created: Arc<AtomicU64>,
}

impl EventStore {
    pub fn new(delay: StateDelay) -> Self {
        info!(delay_ms = delay.duration().as_millis() as u64, "Event store initialized");
        Self {
            catalog: Arc::new(RwLock::new(Some(Catalog::default()))),
            delay,
            created: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    pub fn delay(&self) -> StateDelay {
        self.delay
    }

    /// Create an event with a zeroed `rows x cols` grid
    ///
    /// The event is fully built before it becomes visible, so lookups never
    /// see a half-constructed event. A failed allocation publishes nothing.
    pub fn create(&self, id: EventId, rows: usize, cols: usize) -> Result<(), StoreError> {
        let mut guard = self.catalog.write();
        let catalog = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.delay.pause();
        if catalog.find(id).is_some() {
            return Err(StoreError::AlreadyExists(id));
        }

        let event = Arc::new(Event::new(id, rows, cols)?);
        catalog
            .events
            .try_reserve(1)
            .map_err(|e| StoreError::AllocationFailure(e.to_string()))?;

        let slot = catalog.events.len();
        catalog.events.push(event);
        catalog.index.insert(id, slot);
        self.created.fetch_add(1, Ordering::Relaxed);

        debug!(event_id = id, rows, cols, "Event created");
        Ok(())
    }

    /// Look up an event under the shared lock
    pub fn get(&self, id: EventId) -> Option<EventHandle> {
        self.fetch(id).ok()
    }

    /// Look up an event, telling "missing" apart from "terminated"
    pub fn fetch(&self, id: EventId) -> Result<EventHandle, StoreError> {
        let guard = self.catalog.read();
        let catalog = guard.as_ref().ok_or(StoreError::NotInitialized)?;

        self.delay.pause();
        catalog
            .find(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Event ids in creation order; an empty vector means "no events"
    pub fn list(&self) -> Result<Vec<EventId>, StoreError> {
        let guard = self.catalog.read();
        let catalog = guard.as_ref().ok_or(StoreError::NotInitialized)?;
        Ok(catalog.events.iter().map(|event| event.id()).collect())
    }

    /// Every event with its grid, in creation order
    ///
    /// Holds the shared lock for the whole dump and each event lock in turn,
    /// so no event is created mid-dump and no grid is torn.
    pub fn dump(&self) -> Result<Vec<GridSnapshot>, StoreError> {
        let guard = self.catalog.read();
        let catalog = guard.as_ref().ok_or(StoreError::NotInitialized)?;

        Ok(catalog
            .events
            .iter()
            .map(|event| {
                let grid = event.lock_grid();
                GridSnapshot {
                    event_id: event.id(),
                    rows: grid.rows(),
                    cols: grid.cols(),
                    seats: grid.seats().to_vec(),
                }
            })
            .collect())
    }

    /// Tear the store down; later operations report `NotInitialized`
    pub fn terminate(&self) -> Result<(), StoreError> {
        let mut guard = self.catalog.write();
        let catalog = guard.take().ok_or(StoreError::NotInitialized)?;
        info!(events = catalog.events.len(), "Event store terminated");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.catalog.read().is_some()
    }

    /// Number of live events (0 once terminated)
    pub fn len(&self) -> usize {
        self.catalog
            .read()
            .as_ref()
            .map(|catalog| catalog.events.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events ever created by this store
    pub fn events_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(StateDelay::none())
    }
}
