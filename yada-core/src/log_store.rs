//! Daily logs for every date, kept sparse: a date whose log becomes empty
//! is dropped by [`LogStore::cleanup_empty_log`].

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::composite::FoodLookup;
use crate::error::DiaryError;
use crate::ids::FoodId;
use crate::models::{DailyLog, LogEntry};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogStore {
    logs: BTreeMap<NaiveDate, DailyLog>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log for `date`, created empty on first access.
    pub fn get_log(&mut self, date: NaiveDate) -> &mut DailyLog {
        self.logs.entry(date).or_insert_with(|| DailyLog::new(date))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.logs.get(&date)
    }

    pub fn get_mut(&mut self, date: NaiveDate) -> Option<&mut DailyLog> {
        self.logs.get_mut(&date)
    }

    /// Removes and returns the entry at `index`. Never creates a log.
    pub fn delete_log_entry(&mut self, date: NaiveDate, index: usize) -> Result<LogEntry, DiaryError> {
        match self.logs.get_mut(&date) {
            Some(log) => log.remove_entry(index),
            None => Err(DiaryError::IndexOutOfRange { index, len: 0 }),
        }
    }

    /// Inserts `entry` at `index`, which may equal the log's length.
    pub fn insert_entry(
        &mut self,
        date: NaiveDate,
        index: usize,
        entry: LogEntry,
    ) -> Result<(), DiaryError> {
        let len = self.get(date).map_or(0, DailyLog::len);
        if index > len {
            return Err(DiaryError::IndexOutOfRange { index, len });
        }
        self.get_log(date).insert_entry(index, entry)
    }

    /// Drops the log for `date` if it has no entries; returns whether it did.
    pub fn cleanup_empty_log(&mut self, date: NaiveDate) -> bool {
        if self.logs.get(&date).is_some_and(DailyLog::is_empty) {
            self.logs.remove(&date);
            return true;
        }
        false
    }

    pub fn position_of(&self, date: NaiveDate, food_id: &FoodId) -> Option<usize> {
        self.get(date).and_then(|log| log.position_of(food_id))
    }

    /// Adds an entry read from storage, merging servings into an existing
    /// entry for the same food.
    pub fn insert_loaded(&mut self, date: NaiveDate, entry: LogEntry) {
        if let Some(previous) = self.get_log(date).merge_entry(entry) {
            tracing::debug!("Merged duplicate log entry on {} (had {})", date, previous);
        }
    }

    /// The entry for `food_id` on `date`, if logged.
    pub fn find_entry_mut(&mut self, date: NaiveDate, food_id: &FoodId) -> Option<&mut LogEntry> {
        self.logs.get_mut(&date)?.find_mut(food_id)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.logs.keys().copied()
    }

    /// Logs in ascending date order.
    pub fn logs(&self) -> impl Iterator<Item = &DailyLog> {
        self.logs.values()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Calories eaten on `date`. Entries for unknown foods count as zero.
    pub fn consumed_calories(&self, date: NaiveDate, foods: &impl FoodLookup) -> f64 {
        self.get(date)
            .map(|log| {
                log.entries()
                    .iter()
                    .filter_map(|e| foods.food(&e.food_id).map(|f| f.calories() * e.servings))
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Copies of the logs restricted to entries whose food is committed.
    /// Dates left without entries are omitted.
    pub fn persistable(&self, foods: &impl FoodLookup) -> Vec<DailyLog> {
        self.logs
            .values()
            .filter_map(|log| {
                let entries: Vec<LogEntry> = log
                    .entries()
                    .iter()
                    .filter(|e| foods.committed_food(&e.food_id).is_some())
                    .cloned()
                    .collect();
                (!entries.is_empty()).then(|| DailyLog::new(log.date).with_entries(entries))
            })
            .collect()
    }
}
