//! Error types shared by the catalog, log store and command engine.

use thiserror::Error;

use crate::ids::{FoodId, FoodKind};
use crate::storage::StorageError;

/// Recoverable errors reported to the caller. None of them leave the
/// catalog, the log store or the command histories half-modified.
#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("A food named '{0}' already exists")]
    DuplicateName(String),

    #[error("Food ID {0} is already in use")]
    DuplicateId(FoodId),

    #[error("No unused {0} food IDs left")]
    IdsExhausted(FoodKind),

    #[error("Invalid log entry index {index} (log has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Food {0} has not been saved yet")]
    NotCommitted(FoodId),

    #[error("Invalid servings: {0}")]
    InvalidServings(f64),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
