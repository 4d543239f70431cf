/*!
 * Response Sinks
 * Where workers deliver the outcome of each command
 */

use super::command::CommandKind;
use crate::core::types::{EventId, ReservationId, WorkerId};
use crate::core::StoreError;
use crate::store::GridSnapshot;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;

/// Outcome of one executed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Created {
        event_id: EventId,
    },
    Reserved {
        event_id: EventId,
        reservation_id: ReservationId,
    },
    Grid(GridSnapshot),
    /// Event ids in creation order; empty means "no events"
    Events {
        ids: Vec<EventId>,
    },
    /// Dispatch is paused for everyone for `delay_ms`
    Waiting {
        delay_ms: u64,
    },
    Help,
    Invalid,
    Failed {
        command: CommandKind,
        error: StoreError,
    },
}

impl Response {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Invalid)
    }
}

/// Output channel shared by all workers
///
/// Implementations serialize concurrent deliveries themselves; a single
/// delivery must never interleave with another.
pub trait ResponseSink: Send + Sync {
    fn deliver(&self, worker: WorkerId, response: Response) -> io::Result<()>;
}

impl<K: ResponseSink + ?Sized> ResponseSink for std::sync::Arc<K> {
    fn deliver(&self, worker: WorkerId, response: Response) -> io::Result<()> {
        (**self).deliver(worker, response)
    }
}

/// Sink that keeps every response in delivery order
#[derive(Debug, Default)]
pub struct MemorySink {
    responses: Mutex<Vec<(WorkerId, Response)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses delivered so far
    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    /// Responses with the id of the worker that produced them
    pub fn deliveries(&self) -> Vec<(WorkerId, Response)> {
        self.responses.lock().clone()
    }
}

impl ResponseSink for MemorySink {
    fn deliver(&self, worker: WorkerId, response: Response) -> io::Result<()> {
        self.responses.lock().push((worker, response));
        Ok(())
    }
}
