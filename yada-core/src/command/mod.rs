//! Reversible edits to the diary.
//!
//! Every mutation of the catalog or the log store goes through a
//! [`Command`]. `execute` applies the edit and captures whatever is needed
//! to reverse it; `undo` reverses it exactly once. Commands are recorded
//! and undone by the [`Session`](crate::session::Session).

mod food;
mod log;

pub use food::AddFood;
pub use log::{AddLogEntry, DeleteLogEntry, UpdateLogEntry};

use std::fmt;

use crate::diary::Diary;
use crate::error::DiaryError;

pub trait Command: fmt::Debug {
    /// Applies the edit. On error the diary is left unchanged.
    fn execute(&mut self, diary: &mut Diary) -> Result<(), DiaryError>;

    /// Reverses a successful `execute`.
    fn undo(&mut self, diary: &mut Diary) -> Result<(), DiaryError>;

    /// One-line description of the edit, reflecting what `execute` did.
    fn describe(&self) -> String;
}

fn never_applied(what: &str) -> DiaryError {
    DiaryError::NotFound(format!("{} was never applied", what))
}
