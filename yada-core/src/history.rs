//! Pending and committed command histories.
//!
//! A command is pending from the moment it executes until the next
//! successful save, then committed. Only committed commands can be undone,
//! most recent first.

use std::fmt;

use crate::command::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Pending,
    Committed,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandState::Pending => write!(f, "pending"),
            CommandState::Committed => write!(f, "committed"),
        }
    }
}

/// An executed command and where it sits in the history.
#[derive(Debug)]
pub struct Recorded {
    pub state: CommandState,
    pub command: Box<dyn Command>,
}

#[derive(Debug, Default)]
pub struct CommandHistory {
    pending: Vec<Recorded>,
    committed: Vec<Recorded>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successfully executed command to the pending list.
    pub fn record(&mut self, command: Box<dyn Command>) {
        self.pending.push(Recorded {
            state: CommandState::Pending,
            command,
        });
    }

    /// Moves every pending command onto the committed stack, oldest first.
    pub fn promote_all(&mut self) -> usize {
        let count = self.pending.len();
        for mut recorded in self.pending.drain(..) {
            recorded.state = CommandState::Committed;
            self.committed.push(recorded);
        }
        if count > 0 {
            tracing::debug!("Promoted {} command(s) to committed", count);
        }
        count
    }

    /// Removes the most recently committed command.
    pub fn pop_committed(&mut self) -> Option<Box<dyn Command>> {
        self.committed.pop().map(|recorded| recorded.command)
    }

    pub fn pending(&self) -> &[Recorded] {
        &self.pending
    }

    pub fn committed(&self) -> &[Recorded] {
        &self.committed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }
}
