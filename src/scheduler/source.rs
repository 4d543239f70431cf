/*!
 * Command Sources
 * The shared input stream workers read commands from
 */

use super::command::Command;
use crate::core::SchedulerError;
use std::collections::VecDeque;

/// A stream of parsed commands
///
/// Only one worker reads at a time: the pool keeps the source behind its
/// dispatch lock. Once exhausted a source must keep returning
/// `EndOfCommands`, since every worker reads it to finish.
pub trait CommandSource: Send {
    fn next_command(&mut self) -> Result<Command, SchedulerError>;
}

impl<S: CommandSource + ?Sized> CommandSource for Box<S> {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        (**self).next_command()
    }
}

/// In-memory command list
#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandSource for CommandQueue {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        Ok(self.commands.pop_front().unwrap_or(Command::EndOfCommands))
    }
}
