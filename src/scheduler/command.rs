/*!
 * Commands
 * Already-parsed command records consumed by the worker pool
 */

use crate::core::types::{EventId, SeatCoord, WorkerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One command read from the input stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Create {
        event_id: EventId,
        rows: usize,
        cols: usize,
    },
    Reserve {
        event_id: EventId,
        seats: Vec<SeatCoord>,
    },
    Show {
        event_id: EventId,
    },
    ListEvents,
    /// `target_worker == 0` pauses command dispatch for everyone,
    /// otherwise the delay is queued for that worker
    Wait {
        delay_ms: u64,
        target_worker: WorkerId,
    },
    Barrier,
    Help,
    Empty,
    EndOfCommands,
    Invalid,
}

impl Command {
    #[inline]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Create { .. } => CommandKind::Create,
            Self::Reserve { .. } => CommandKind::Reserve,
            Self::Show { .. } => CommandKind::Show,
            Self::ListEvents => CommandKind::List,
            Self::Wait { .. } => CommandKind::Wait,
            Self::Barrier => CommandKind::Barrier,
            Self::Help => CommandKind::Help,
            Self::Empty => CommandKind::Empty,
            Self::EndOfCommands => CommandKind::EndOfCommands,
            Self::Invalid => CommandKind::Invalid,
        }
    }
}

/// Command discriminant, used for logging and failure responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    Reserve,
    Show,
    List,
    Wait,
    Barrier,
    Help,
    Empty,
    EndOfCommands,
    Invalid,
}

impl CommandKind {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Reserve => "RESERVE",
            Self::Show => "SHOW",
            Self::List => "LIST",
            Self::Wait => "WAIT",
            Self::Barrier => "BARRIER",
            Self::Help => "HELP",
            Self::Empty => "EMPTY",
            Self::EndOfCommands => "EOC",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
