use super::Command;
use crate::diary::Diary;
use crate::error::DiaryError;
use crate::models::Food;

/// Adds a new food to the catalog. Undo removes it and recycles its ID,
/// unless a log entry or composite still refers to the food.
#[derive(Debug)]
pub struct AddFood {
    food: Food,
}

impl AddFood {
    pub fn new(food: Food) -> Self {
        Self { food }
    }

    pub fn food(&self) -> &Food {
        &self.food
    }
}

impl Command for AddFood {
    fn execute(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        diary.catalog.add_food(self.food.clone())
    }

    fn undo(&mut self, diary: &mut Diary) -> Result<(), DiaryError> {
        let id = &self.food.id;
        let removed = if diary.references(id) {
            tracing::debug!("Food {} is still referenced, not recycling its ID", id);
            diary.catalog.take_food(id)
        } else {
            diary.catalog.remove_food(id)
        };
        removed
            .map(|_| ())
            .ok_or_else(|| DiaryError::NotFound(format!("food {}", id)))
    }

    fn describe(&self) -> String {
        format!(
            "add {} food '{}' (ID: {})",
            self.food.kind(),
            self.food.name,
            self.food.id
        )
    }
}
