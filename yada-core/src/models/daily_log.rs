use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::attribute::format_amount;
use crate::error::DiaryError;
use crate::ids::FoodId;

/// Servings of one food eaten on a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub food_id: FoodId,
    pub servings: f64,
}

impl LogEntry {
    pub fn new(food_id: FoodId, servings: f64) -> Self {
        Self { food_id, servings }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.food_id, format_amount(self.servings))
    }
}

/// Entries logged for a single date, in insertion order.
///
/// Positions are 0-based here; the CLI shows them 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLog {
    pub date: NaiveDate,
    entries: Vec<LogEntry>,
}

impl DailyLog {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
        }
    }

    pub fn with_entries(mut self, entries: Vec<LogEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LogEntry> {
        self.entries.get_mut(index)
    }

    pub fn add_entry(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Adds servings to the existing entry for the same food, returning its
    /// servings before the merge, or appends the entry and returns `None`.
    pub fn merge_entry(&mut self, entry: LogEntry) -> Option<f64> {
        match self.position_of(&entry.food_id) {
            Some(index) => {
                let existing = &mut self.entries[index];
                let previous = existing.servings;
                existing.servings += entry.servings;
                Some(previous)
            }
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Entry for `food_id`, compared case-insensitively.
    pub fn find_mut(&mut self, food_id: &FoodId) -> Option<&mut LogEntry> {
        self.entries.iter_mut().find(|e| e.food_id.matches(food_id))
    }

    /// Position of the entry for `food_id`, compared case-insensitively.
    pub fn position_of(&self, food_id: &FoodId) -> Option<usize> {
        self.entries.iter().position(|e| e.food_id.matches(food_id))
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<LogEntry, DiaryError> {
        if index >= self.entries.len() {
            return Err(DiaryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn insert_entry(&mut self, index: usize, entry: LogEntry) -> Result<(), DiaryError> {
        if index > self.entries.len() {
            return Err(DiaryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Puts a removed entry back at `index`, or at the end when `index` is
    /// past the current length. If the food has been logged again in the
    /// meantime the servings are folded into that entry instead.
    ///
    /// Returns true when the entry landed at its original position.
    pub fn restore_entry(&mut self, index: usize, entry: LogEntry) -> bool {
        if let Some(position) = self.position_of(&entry.food_id) {
            self.entries[position].servings += entry.servings;
            return position == index;
        }
        if index <= self.entries.len() {
            self.entries.insert(index, entry);
            true
        } else {
            self.entries.push(entry);
            false
        }
    }
}

impl fmt::Display for DailyLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date: {}", self.date)?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "  {}) {}", i + 1, entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn sample_log() -> DailyLog {
        DailyLog::new(date()).with_entries(vec![
            LogEntry::new(FoodId::from("B1"), 1.0),
            LogEntry::new(FoodId::from("B2"), 2.0),
            LogEntry::new(FoodId::from("C1"), 0.5),
        ])
    }

    #[test]
    fn test_remove_entry() {
        let mut log = sample_log();
        let removed = log.remove_entry(1).unwrap();
        assert_eq!(removed.food_id.as_str(), "B2");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_remove_entry_out_of_range() {
        let mut log = sample_log();
        let before = log.clone();
        let err = log.remove_entry(3).unwrap_err();
        assert!(matches!(
            err,
            DiaryError::IndexOutOfRange { index: 3, len: 3 }
        ));
        assert_eq!(log, before);
    }

    #[test]
    fn test_insert_entry_bounds() {
        let mut log = sample_log();
        log.insert_entry(3, LogEntry::new(FoodId::from("B9"), 1.0))
            .unwrap();
        assert_eq!(log.entries()[3].food_id.as_str(), "B9");

        let err = log
            .insert_entry(9, LogEntry::new(FoodId::from("B8"), 1.0))
            .unwrap_err();
        assert!(matches!(err, DiaryError::IndexOutOfRange { index: 9, .. }));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_position_of_ignores_case() {
        let log = sample_log();
        assert_eq!(log.position_of(&FoodId::from("c1")), Some(2));
        assert_eq!(log.position_of(&FoodId::from("B7")), None);
    }

    #[test]
    fn test_restore_entry_at_original_index() {
        let mut log = sample_log();
        let removed = log.remove_entry(0).unwrap();
        assert!(log.restore_entry(0, removed));
        assert_eq!(log, sample_log());
    }

    #[test]
    fn test_restore_entry_falls_back_to_append() {
        let mut log = DailyLog::new(date());
        assert!(!log.restore_entry(4, LogEntry::new(FoodId::from("B1"), 1.0)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_restore_entry_merges_with_relogged_food() {
        let mut log = sample_log();
        log.restore_entry(0, LogEntry::new(FoodId::from("B2"), 3.0));
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[1].servings, 5.0);
    }

    #[test]
    fn test_daily_log_display() {
        let output = sample_log().to_string();
        assert!(output.contains("Date: 2025-01-01"));
        assert!(output.contains("1) B1 x1"));
        assert!(output.contains("3) C1 x0.5"));
    }
}
