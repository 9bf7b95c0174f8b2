//! The food catalog: every known food, saved or not, keyed by ID.

use std::collections::HashMap;

use crate::composite::FoodLookup;
use crate::error::DiaryError;
use crate::ids::{FoodId, FoodKind, IdAllocator};
use crate::models::{Food, Nutrition};

/// Basic and composite foods plus the allocator that names them.
///
/// Names are unique case-insensitively across both categories.
#[derive(Debug, Clone, Default)]
pub struct FoodCatalog {
    foods: HashMap<FoodId, Food>,
    ids: IdAllocator,
}

impl FoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Reserves a fresh ID for a food about to be created.
    pub fn allocate_id(&mut self, kind: FoodKind) -> Result<FoodId, DiaryError> {
        self.ids.allocate(kind)
    }

    /// Returns an ID reserved with [`FoodCatalog::allocate_id`] that ended up unused.
    pub fn release_id(&mut self, id: &FoodId) {
        if !self.foods.contains_key(id) {
            self.ids.recycle(id);
        }
    }

    pub fn add_food(&mut self, food: Food) -> Result<(), DiaryError> {
        if let Some(existing) = self.find_by_name(&food.name) {
            return Err(DiaryError::DuplicateName(existing.name.clone()));
        }
        if self.foods.contains_key(&food.id) {
            return Err(DiaryError::DuplicateId(food.id));
        }
        self.ids.observe(&food.id);
        self.foods.insert(food.id.clone(), food);
        Ok(())
    }

    /// Inserts a food read from storage. The food is marked committed and a
    /// composite keeps only components that resolve to committed foods, so
    /// basic foods must be loaded before composites.
    pub fn insert_loaded(&mut self, mut food: Food) -> bool {
        if self.foods.contains_key(&food.id) {
            tracing::warn!("Skipping duplicate food ID {} ({})", food.id, food.name);
            return false;
        }
        food.committed = true;

        if let Nutrition::Composite(composite) = &mut food.nutrition {
            composite.retain_components(|c| {
                let known = self.committed_food(&c.food_id).is_some();
                if !known {
                    tracing::warn!(
                        "Component food {} not found for composite {}",
                        c.food_id,
                        food.id
                    );
                }
                known
            });
            composite.finalize_calories(&*self);
        }

        self.ids.observe(&food.id);
        self.foods.insert(food.id.clone(), food);
        true
    }

    /// Removes a food and recycles its ID. Absent IDs are a no-op.
    pub fn remove_food(&mut self, id: &FoodId) -> Option<Food> {
        let removed = self.take_food(id)?;
        self.ids.recycle(id);
        Some(removed)
    }

    /// Removes a food but keeps its ID out of circulation.
    pub fn take_food(&mut self, id: &FoodId) -> Option<Food> {
        self.foods.remove(id)
    }

    pub fn get(&self, id: &FoodId) -> Option<&Food> {
        self.foods.get(id)
    }

    pub fn get_committed(&self, id: &FoodId) -> Option<&Food> {
        self.committed_food(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Food> {
        self.foods.values().find(|food| food.has_name(name))
    }

    /// Looks a food up by ID first, then by name.
    pub fn resolve(&self, reference: &str) -> Option<&Food> {
        self.get(&FoodId::parse_input(reference))
            .or_else(|| self.find_by_name(reference))
    }

    /// Foods of one category, ordered by numeric ID.
    pub fn foods(&self, kind: FoodKind) -> Vec<&Food> {
        let mut foods: Vec<&Food> = self.foods.values().filter(|f| f.kind() == kind).collect();
        foods.sort_by(|a, b| a.id.sort_key().cmp(&b.id.sort_key()));
        foods
    }

    /// Committed foods whose keywords match any (or, with `match_all`, every)
    /// search keyword. Keyword comparison ignores case.
    pub fn search(&self, keywords: &[String], match_all: bool) -> Vec<&Food> {
        let keywords: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        FoodKind::ALL
            .iter()
            .flat_map(|kind| self.foods(*kind))
            .filter(|food| food.committed)
            .filter(|food| {
                if match_all {
                    keywords.iter().all(|k| food.has_keyword(k))
                } else {
                    keywords.iter().any(|k| food.has_keyword(k))
                }
            })
            .collect()
    }

    /// Marks every food committed after a successful save; returns how many changed.
    pub fn mark_all_committed(&mut self) -> usize {
        let mut count = 0;
        for food in self.foods.values_mut().filter(|f| !f.committed) {
            food.committed = true;
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }
}

impl FoodLookup for FoodCatalog {
    fn food(&self, id: &FoodId) -> Option<&Food> {
        self.foods.get(id)
    }
}
