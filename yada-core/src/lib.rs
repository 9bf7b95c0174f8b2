//! Yada Core Library
//!
//! Food catalog, daily logs, calorie targets and the command engine that
//! edits them with save-gated undo.

pub mod catalog;
pub mod command;
pub mod composite;
pub mod diary;
pub mod error;
pub mod history;
pub mod ids;
pub mod log_store;
pub mod models;
pub mod session;
pub mod storage;
pub mod target;

pub use catalog::FoodCatalog;
pub use command::{AddFood, AddLogEntry, Command, DeleteLogEntry, UpdateLogEntry};
pub use composite::{aggregate_extra_info, CompositeBuilder, FoodLookup};
pub use diary::Diary;
pub use error::DiaryError;
pub use history::{CommandHistory, CommandState};
pub use ids::{FoodId, FoodKind, IdAllocator};
pub use log_store::LogStore;
pub use models::{
    ActivityLevel, Attribute, AttributeError, Component, CompositeFood, DailyLog, DailyProfile,
    Food, LogEntry, Nutrition, ProfileBook, ProfileUpdate, Sex,
};
pub use session::{CalorieSummary, Session};
pub use storage::{DataFile, DiaryStore, StorageError, TextStore};
pub use target::{target_calories, CalcMethod};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
