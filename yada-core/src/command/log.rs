use chrono::NaiveDate;

use super::{never_applied, Command};
use crate::diary::Diary;
use crate::error::DiaryError;
use crate::ids::FoodId;
use crate::models::{format_amount, LogEntry};

fn check_servings(servings: f64) -> Result<(), DiaryError> {
    if servings.is_finite() && servings >= 0.0 {
        Ok(())
    } else {
        Err(DiaryError::InvalidServings(servings))
    }
}

fn entry_gone(date: NaiveDate, food_id: &FoodId) -> DiaryError {
    DiaryError::NotFound(format!("log entry for {} on {}", food_id, date))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AddOutcome {
    Appended,
    Merged { previous: f64 },
}

/// Logs servings of a food on a date, merging into an existing entry for
/// the same food.
#[derive(Debug)]
pub struct AddLogEntry {
    date: NaiveDate,
    entry: LogEntry,
    outcome: Option<AddOutcome>,
}

impl AddLogEntry {
    pub fn new(date: NaiveDate, entry: LogEntry) -> Self {
        Self {
            date,
            entry,
            outcome: None,
        }
    }
}

impl Command for AddLogEntry {
    fn execute(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        check_servings(self.entry.servings)?;

        let outcome = match diary.logs.get_log(self.date).merge_entry(self.entry.clone()) {
            Some(previous) => AddOutcome::Merged { previous },
            None => AddOutcome::Appended,
        };

        tracing::debug!("Logged {} on {} ({:?})", self.entry, self.date, outcome);
        self.outcome = Some(outcome);
        Ok(())
    }

    fn undo(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        let outcome = self.outcome.ok_or_else(|| never_applied("log entry"))?;
        let food_id = &self.entry.food_id;
        let index = diary
            .logs
            .position_of(self.date, food_id)
            .ok_or_else(|| entry_gone(self.date, food_id))?;

        match outcome {
            AddOutcome::Merged { previous } => {
                if let Some(existing) = diary.logs.find_entry_mut(self.date, food_id) {
                    existing.servings = previous;
                }
            }
            AddOutcome::Appended => {
                diary.logs.delete_log_entry(self.date, index)?;
                diary.logs.cleanup_empty_log(self.date);
            }
        }

        self.outcome = None;
        Ok(())
    }

    fn describe(&self) -> String {
        match self.outcome {
            Some(AddOutcome::Merged { previous }) => format!(
                "log {} on {} (merged, {} -> {} servings)",
                self.entry,
                self.date,
                format_amount(previous),
                format_amount(previous + self.entry.servings)
            ),
            _ => format!("log {} on {}", self.entry, self.date),
        }
    }
}

/// Removes the entry at a position in a date's log.
#[derive(Debug)]
pub struct DeleteLogEntry {
    date: NaiveDate,
    index: usize,
    removed: Option<LogEntry>,
}

impl DeleteLogEntry {
    pub fn new(date: NaiveDate, index: usize) -> Self {
        Self {
            date,
            index,
            removed: None,
        }
    }
}

impl Command for DeleteLogEntry {
    fn execute(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        let removed = diary.logs.delete_log_entry(self.date, self.index)?;
        diary.logs.cleanup_empty_log(self.date);
        tracing::debug!("Deleted {} from {}", removed, self.date);
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        let entry = self
            .removed
            .take()
            .ok_or_else(|| never_applied("log deletion"))?;
        if !diary.logs.get_log(self.date).restore_entry(self.index, entry) {
            tracing::debug!(
                "Entry {} on {} not restored at its original position",
                self.index,
                self.date
            );
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.removed {
            Some(entry) => format!("delete {} from {}", entry, self.date),
            None => format!("delete entry {} from {}", self.index + 1, self.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum UpdateOutcome {
    Changed { food_id: FoodId, previous: f64 },
    Removed(LogEntry),
}

/// Sets the servings of the entry at a position. Zero servings removes the
/// entry.
#[derive(Debug)]
pub struct UpdateLogEntry {
    date: NaiveDate,
    index: usize,
    servings: f64,
    outcome: Option<UpdateOutcome>,
}

impl UpdateLogEntry {
    pub fn new(date: NaiveDate, index: usize, servings: f64) -> Self {
        Self {
            date,
            index,
            servings,
            outcome: None,
        }
    }
}

impl Command for UpdateLogEntry {
    fn execute(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        check_servings(self.servings)?;

        if self.servings == 0.0 {
            let removed = diary.logs.delete_log_entry(self.date, self.index)?;
            diary.logs.cleanup_empty_log(self.date);
            tracing::debug!("Zero servings removed {} from {}", removed, self.date);
            self.outcome = Some(UpdateOutcome::Removed(removed));
            return Ok(());
        }

        let (index, date) = (self.index, self.date);
        let log = diary
            .logs
            .get_mut(date)
            .ok_or(DiaryError::IndexOutOfRange { index, len: 0 })?;
        let len = log.len();
        let entry = log
            .get_mut(index)
            .ok_or(DiaryError::IndexOutOfRange { index, len })?;

        let previous = entry.servings;
        entry.servings = self.servings;
        tracing::debug!("Updated {} on {} (was {})", entry, date, previous);
        self.outcome = Some(UpdateOutcome::Changed {
            food_id: entry.food_id.clone(),
            previous,
        });
        Ok(())
    }

    fn undo(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        match self.outcome.take() {
            Some(UpdateOutcome::Changed { food_id, previous }) => {
                let entry = diary
                    .logs
                    .find_entry_mut(self.date, &food_id)
                    .ok_or_else(|| entry_gone(self.date, &food_id))?;
                entry.servings = previous;
                Ok(())
            }
            Some(UpdateOutcome::Removed(entry)) => {
                diary.logs.get_log(self.date).restore_entry(self.index, entry);
                Ok(())
            }
            None => Err(never_applied("log update")),
        }
    }

    fn describe(&self) -> String {
        match &self.outcome {
            Some(UpdateOutcome::Changed { food_id, previous }) => format!(
                "update {} on {} ({} -> {} servings)",
                food_id,
                self.date,
                format_amount(*previous),
                format_amount(self.servings)
            ),
            Some(UpdateOutcome::Removed(entry)) => {
                format!("remove {} from {} (zero servings)", entry, self.date)
            }
            None => format!(
                "update entry {} on {} to {} servings",
                self.index + 1,
                self.date,
                format_amount(self.servings)
            ),
        }
    }
}
