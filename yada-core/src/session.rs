//! The commit coordinator.
//!
//! A [`Session`] owns the diary loaded from a [`DiaryStore`], runs commands
//! against it and decides when they become undoable: a command is pending
//! until the next successful [`Session::save`], and only committed commands
//! are undone, most recent first. Edits that were never saved are discarded
//! simply by not saving.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::command::{AddFood, Command};
use crate::diary::Diary;
use crate::error::DiaryError;
use crate::history::CommandHistory;
use crate::ids::{FoodId, FoodKind};
use crate::models::{DailyProfile, Food, ProfileBook, ProfileUpdate};
use crate::storage::DiaryStore;
use crate::target::{target_calories, CalcMethod};

/// Calories eaten on a date against the target of the profile in effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieSummary {
    pub date: NaiveDate,
    pub consumed: f64,
    pub target: Option<f64>,
    pub method: CalcMethod,
}

impl CalorieSummary {
    /// Target minus consumed; negative when over target.
    pub fn difference(&self) -> Option<f64> {
        self.target.map(|target| target - self.consumed)
    }
}

impl fmt::Display for CalorieSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date: {}", self.date)?;
        writeln!(f, "Consumed: {:.0} cal", self.consumed)?;
        match (self.target, self.difference()) {
            (Some(target), Some(diff)) => {
                writeln!(f, "Target: {:.0} cal ({})", target, self.method)?;
                if diff >= 0.0 {
                    write!(f, "Remaining: {:.0} cal", diff)
                } else {
                    write!(f, "Over by: {:.0} cal", -diff)
                }
            }
            _ => write!(f, "Target: no profile set"),
        }
    }
}

pub struct Session<S: DiaryStore> {
    diary: Diary,
    profiles: ProfileBook,
    history: CommandHistory,
    store: S,
    dirty: bool,
}

impl<S: DiaryStore> Session<S> {
    /// Loads the diary from `store`.
    pub fn open(store: S) -> Result<Self, DiaryError> {
        Self::open_with_method(store, CalcMethod::default())
    }

    /// Loads the diary, using `method` if no profiles were saved yet.
    pub fn open_with_method(store: S, method: CalcMethod) -> Result<Self, DiaryError> {
        let mut diary = Diary::default();
        // Composites resolve their components against already loaded foods.
        for kind in FoodKind::ALL {
            for food in store.load_foods(kind)? {
                diary.catalog.insert_loaded(food);
            }
        }
        diary.logs = store.load_logs()?;
        let profiles = store
            .load_profiles()?
            .unwrap_or_else(|| ProfileBook::new(method));

        tracing::info!(
            "Loaded {} food(s), {} logged date(s), {} profile(s)",
            diary.catalog.len(),
            diary.logs.dates().count(),
            profiles.len()
        );

        Ok(Self {
            diary,
            profiles,
            history: CommandHistory::new(),
            store,
            dirty: false,
        })
    }

    pub fn diary(&self) -> &Diary {
        &self.diary
    }

    pub fn profiles(&self) -> &ProfileBook {
        &self.profiles
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether in-memory state differs from what was last saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn allocate_id(&mut self, kind: FoodKind) -> Result<FoodId, DiaryError> {
        self.diary.catalog.allocate_id(kind)
    }

    pub fn release_id(&mut self, id: &FoodId) {
        self.diary.catalog.release_id(id);
    }

    /// Runs a command and records it as pending. A failed command is
    /// dropped and leaves the histories untouched.
    pub fn execute(&mut self, mut command: Box<dyn Command>) -> Result<String, DiaryError> {
        command.execute(&mut self.diary)?;
        let description = command.describe();
        tracing::debug!("Executed: {}", description);
        self.history.record(command);
        self.dirty = true;
        Ok(description)
    }

    /// Adds a food whose ID came from [`Session::allocate_id`], releasing
    /// the ID if the food is rejected.
    pub fn add_food(&mut self, food: Food) -> Result<String, DiaryError> {
        let id = food.id.clone();
        self.execute(Box::new(AddFood::new(food))).inspect_err(|_| {
            self.diary.catalog.release_id(&id);
        })
    }

    /// Persists everything and promotes pending commands to committed.
    ///
    /// Returns the number of promoted commands. On any storage failure
    /// nothing is promoted; in-memory state is kept so the save can be
    /// retried.
    pub fn save(&mut self) -> Result<usize, DiaryError> {
        for kind in FoodKind::ALL {
            let foods = self.diary.catalog.foods(kind);
            self.store.save_foods(kind, &foods)?;
        }
        let newly_committed = self.diary.catalog.mark_all_committed();
        self.store
            .save_logs(&self.diary.logs, &self.diary.catalog)?;
        self.store.save_profiles(&self.profiles)?;

        let promoted = self.history.promote_all();
        self.dirty = false;
        tracing::info!(
            "Saved diary: {} food(s) newly committed, {} command(s) promoted",
            newly_committed,
            promoted
        );
        Ok(promoted)
    }

    /// Undoes the most recently committed command.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. A command whose
    /// undo fails is discarded and the error returned.
    pub fn undo(&mut self) -> Result<Option<String>, DiaryError> {
        let Some(mut command) = self.history.pop_committed() else {
            return Ok(None);
        };
        let description = command.describe();
        if let Err(e) = command.undo(&mut self.diary) {
            tracing::warn!("Undo of '{}' failed: {}", description, e);
            return Err(e);
        }
        tracing::debug!("Undid: {}", description);
        self.dirty = true;
        Ok(Some(description))
    }

    /// Final save before the session ends.
    pub fn close(mut self) -> Result<usize, DiaryError> {
        self.save()
    }

    /// Edits the profile for `date`. Profile edits are saved with the rest
    /// of the diary but are not undoable.
    pub fn update_profile(
        &mut self,
        date: NaiveDate,
        update: ProfileUpdate,
    ) -> Result<&DailyProfile, DiaryError> {
        let profile = self.profiles.update(date, update)?;
        self.dirty = true;
        Ok(profile)
    }

    pub fn set_calc_method(&mut self, method: CalcMethod) {
        if self.profiles.method() != method {
            self.profiles.set_method(method);
            self.dirty = true;
        }
    }

    pub fn summary(&self, date: NaiveDate) -> CalorieSummary {
        let method = self.profiles.method();
        CalorieSummary {
            date,
            consumed: self.diary.logs.consumed_calories(date, &self.diary.catalog),
            target: self
                .profiles
                .effective(date)
                .map(|profile| target_calories(profile, method)),
            method,
        }
    }

    /// One-line state report for the interactive shell.
    pub fn status(&self) -> String {
        format!(
            "{} food(s), {} pending command(s), {} undoable command(s){}",
            self.diary.catalog.len(),
            self.history.pending_len(),
            self.history.committed_len(),
            if self.dirty { ", unsaved changes" } else { "" }
        )
    }
}

impl<S: DiaryStore> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("foods", &self.diary.catalog.len())
            .field("pending", &self.history.pending_len())
            .field("committed", &self.history.committed_len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AddLogEntry, DeleteLogEntry, UpdateLogEntry};
    use crate::composite::CompositeBuilder;
    use crate::models::{ActivityLevel, LogEntry, Sex};
    use crate::storage::TextStore;
    use std::fs;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    fn open(temp: &TempDir) -> Session<TextStore> {
        Session::open(TextStore::new(temp.path())).unwrap()
    }

    fn add_basic(session: &mut Session<TextStore>, name: &str, calories: f64) -> FoodId {
        let id = session.allocate_id(FoodKind::Basic).unwrap();
        session
            .add_food(Food::basic(id.clone(), name, calories))
            .unwrap();
        id
    }

    fn log(session: &mut Session<TextStore>, id: &FoodId, servings: f64) -> String {
        session
            .execute(Box::new(AddLogEntry::new(
                date(),
                LogEntry::new(id.clone(), servings),
            )))
            .unwrap()
    }

    fn entries(session: &Session<TextStore>) -> Vec<LogEntry> {
        session
            .diary()
            .logs
            .get(date())
            .map(|l| l.entries().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_open_empty_directory() {
        let temp = TempDir::new().unwrap();
        let session = open(&temp);
        assert!(session.diary().catalog.is_empty());
        assert!(session.profiles().is_empty());
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_execute_records_pending_and_save_promotes() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 95.0);
        session.save().unwrap();
        log(&mut session, &apple, 1.0);

        assert_eq!(session.history().pending_len(), 1);
        assert_eq!(session.history().committed_len(), 1);
        assert_eq!(session.save().unwrap(), 1);
        assert_eq!(session.history().committed_len(), 2);
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_failed_execute_is_not_recorded() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        add_basic(&mut session, "Apple", 95.0);

        let id = session.allocate_id(FoodKind::Basic).unwrap();
        let err = session
            .add_food(Food::basic(id.clone(), "apple", 50.0))
            .unwrap_err();
        assert!(matches!(err, DiaryError::DuplicateName(_)));
        assert_eq!(session.history().pending_len(), 1);
        assert_eq!(session.allocate_id(FoodKind::Basic).unwrap(), id);

        let err = session
            .execute(Box::new(DeleteLogEntry::new(date(), 0)))
            .unwrap_err();
        assert!(matches!(err, DiaryError::IndexOutOfRange { .. }));
        assert_eq!(session.history().pending_len(), 1);
    }

    #[test]
    fn test_pending_commands_are_not_undoable() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        add_basic(&mut session, "Apple", 95.0);

        assert_eq!(session.undo().unwrap(), None);
        assert_eq!(session.diary().catalog.len(), 1);
    }

    #[test]
    fn test_undo_is_lifo_over_committed() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 95.0);
        session.save().unwrap();

        log(&mut session, &apple, 2.0);
        log(&mut session, &apple, 3.0);
        session.save().unwrap();
        assert_eq!(entries(&session), vec![LogEntry::new(apple.clone(), 5.0)]);

        session.undo().unwrap().unwrap();
        assert_eq!(entries(&session), vec![LogEntry::new(apple.clone(), 2.0)]);
        session.undo().unwrap().unwrap();
        assert!(entries(&session).is_empty());
        let undone = session.undo().unwrap().unwrap();
        assert!(undone.contains("Apple"));
        assert!(session.diary().catalog.is_empty());
        assert_eq!(session.undo().unwrap(), None);
    }

    #[test]
    fn test_undo_across_update_and_delete() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 95.0);
        let pear = add_basic(&mut session, "Pear", 100.0);
        session.save().unwrap();
        log(&mut session, &apple, 1.0);
        log(&mut session, &pear, 1.0);
        session
            .execute(Box::new(UpdateLogEntry::new(date(), 0, 2.0)))
            .unwrap();
        session
            .execute(Box::new(DeleteLogEntry::new(date(), 1)))
            .unwrap();
        session.save().unwrap();
        assert_eq!(entries(&session), vec![LogEntry::new(apple.clone(), 2.0)]);

        session.undo().unwrap();
        session.undo().unwrap();
        assert_eq!(
            entries(&session),
            vec![LogEntry::new(apple, 1.0), LogEntry::new(pear, 1.0)]
        );
    }

    #[test]
    fn test_undone_food_id_is_not_reused_by_pending_entry() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let cake = add_basic(&mut session, "Cake", 500.0);
        session.save().unwrap();
        log(&mut session, &cake, 2.0);

        session.undo().unwrap().unwrap();
        assert!(session.diary().catalog.get(&cake).is_none());
        assert_eq!(session.summary(date()).consumed, 0.0);

        let celery = add_basic(&mut session, "Celery", 10.0);
        assert_ne!(celery, cake);
        session.close().unwrap();

        let reopened = open(&temp);
        assert!(reopened.diary().logs.is_empty());
        assert_eq!(
            reopened.diary().catalog.find_by_name("celery").unwrap().id,
            celery
        );
    }

    #[test]
    fn test_largest_loaded_id_does_not_collide() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("basic_foods.txt"),
            "B;B4294967295;Apple;;95;\n",
        )
        .unwrap();
        let mut session = open(&temp);
        assert_eq!(session.diary().catalog.len(), 1);

        assert!(matches!(
            session.allocate_id(FoodKind::Basic),
            Err(DiaryError::IdsExhausted(FoodKind::Basic))
        ));
        assert_eq!(session.allocate_id(FoodKind::Composite).unwrap().as_str(), "C1");
    }

    #[test]
    fn test_failed_save_does_not_promote() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        let mut session = Session::open(TextStore::new(&data_dir)).unwrap();
        let id = session.allocate_id(FoodKind::Basic).unwrap();
        session.add_food(Food::basic(id, "Apple", 95.0)).unwrap();
        fs::write(&data_dir, "not a directory").unwrap();

        assert!(matches!(session.save(), Err(DiaryError::Storage(_))));
        assert_eq!(session.history().pending_len(), 1);
        assert_eq!(session.history().committed_len(), 0);
        assert_eq!(session.undo().unwrap(), None);
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_unsaved_edits_are_discarded_on_reopen() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 95.0);
        session.save().unwrap();
        log(&mut session, &apple, 1.0);
        add_basic(&mut session, "Pear", 100.0);
        drop(session);

        let reopened = open(&temp);
        assert_eq!(reopened.diary().catalog.len(), 1);
        assert!(reopened.diary().logs.is_empty());
    }

    #[test]
    fn test_close_persists_and_reopen_restores() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let bread = add_basic(&mut session, "Bread", 100.0);
        let cheese = add_basic(&mut session, "Cheese", 50.0);
        session.save().unwrap();

        let id = session.allocate_id(FoodKind::Composite).unwrap();
        let mut builder = CompositeBuilder::new(&session.diary().catalog);
        builder.add(&bread, 2.0).unwrap();
        builder.add(&cheese, 1.0).unwrap();
        let sandwich = builder.build(id.clone(), "Sandwich");
        session.add_food(sandwich).unwrap();
        session.save().unwrap();
        log(&mut session, &id, 1.0);
        session.close().unwrap();

        let reopened = open(&temp);
        let food = reopened.diary().catalog.get_committed(&id).unwrap();
        assert_eq!(food.calories(), 250.0);
        assert_eq!(entries(&reopened), vec![LogEntry::new(id, 1.0)]);
        assert_eq!(reopened.history().committed_len(), 0);
    }

    #[test]
    fn test_log_of_new_food_is_saved_with_it() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 95.0);
        log(&mut session, &apple, 1.0);
        session.save().unwrap();

        let reopened = open(&temp);
        assert_eq!(entries(&reopened), vec![LogEntry::new(apple, 1.0)]);
    }

    #[test]
    fn test_summary_uses_effective_profile() {
        let temp = TempDir::new().unwrap();
        let mut session = open(&temp);
        let apple = add_basic(&mut session, "Apple", 100.0);
        log(&mut session, &apple, 3.0);

        assert_eq!(session.summary(date()).target, None);

        let earlier = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        session
            .update_profile(
                earlier,
                ProfileUpdate {
                    sex: Some(Sex::Male),
                    height_cm: Some(180.0),
                    age_years: Some(30),
                    weight_kg: Some(80.0),
                    activity: Some(ActivityLevel::Sedentary),
                },
            )
            .unwrap();
        session.set_calc_method(CalcMethod::MifflinStJeor);

        let summary = session.summary(date());
        assert_eq!(summary.consumed, 300.0);
        assert_eq!(summary.target, Some(1780.0 * 1.2));
        assert_eq!(summary.difference(), Some(1780.0 * 1.2 - 300.0));
        assert!(summary.to_string().contains("MIFFLIN_ST_JEOR"));
    }

    #[test]
    fn test_profiles_persist_with_method() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open_with_method(
            TextStore::new(temp.path()),
            CalcMethod::MifflinStJeor,
        )
        .unwrap();
        assert_eq!(session.profiles().method(), CalcMethod::MifflinStJeor);
        session
            .update_profile(
                date(),
                ProfileUpdate {
                    sex: Some(Sex::Female),
                    height_cm: Some(165.0),
                    age_years: Some(40),
                    weight_kg: Some(62.5),
                    activity: None,
                },
            )
            .unwrap();
        session.close().unwrap();

        let reopened = open(&temp);
        assert_eq!(reopened.profiles().method(), CalcMethod::MifflinStJeor);
        assert_eq!(reopened.profiles().get(date()).unwrap().weight_kg, 62.5);
    }
}
