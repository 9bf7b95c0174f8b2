//! In-memory diary state mutated by commands.

use crate::catalog::FoodCatalog;
use crate::ids::{FoodId, FoodKind};
use crate::log_store::LogStore;

/// The food catalog and the daily log store, owned together so a command
/// can touch both through one mutable borrow.
#[derive(Debug, Clone, Default)]
pub struct Diary {
    pub catalog: FoodCatalog,
    pub logs: LogStore,
}

impl Diary {
    pub fn new(catalog: FoodCatalog, logs: LogStore) -> Self {
        Self { catalog, logs }
    }

    /// Whether any log entry or composite component still points at `id`.
    pub fn references(&self, id: &FoodId) -> bool {
        let logged = self
            .logs
            .logs()
            .flat_map(|log| log.entries())
            .any(|entry| entry.food_id.matches(id));
        logged
            || self
                .catalog
                .foods(FoodKind::Composite)
                .iter()
                .any(|food| food.components().iter().any(|c| c.food_id.matches(id)))
    }
}
