//! Composite food derivation: calorie totals and extra info aggregation.
//!
//! Aggregation multiplies each component's `field=value:unit` triples by the
//! component's servings and sums them per `(field, unit)` pair. The same
//! field in different units stays separate; no unit conversion happens.

use std::collections::BTreeMap;

use crate::error::DiaryError;
use crate::ids::FoodId;
use crate::models::{parse_extra_info, Attribute, CompositeFood, Food, SEPARATOR};

/// Read access to foods by ID, implemented by the catalog.
pub trait FoodLookup {
    fn food(&self, id: &FoodId) -> Option<&Food>;

    /// Only committed foods may back a composite or a saved log entry.
    fn committed_food(&self, id: &FoodId) -> Option<&Food> {
        self.food(id).filter(|food| food.committed)
    }
}

/// Sums `(extra_info, multiplier)` pairs into one extra info string.
///
/// Malformed triples are skipped. Output is ordered by field, then unit.
pub fn aggregate_extra_info<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();

    for (info, multiplier) in parts {
        for parsed in parse_extra_info(info) {
            match parsed {
                Ok(attr) => {
                    *totals.entry((attr.field, attr.unit)).or_insert(0.0) +=
                        attr.value * multiplier;
                }
                Err(e) => tracing::debug!("Skipping attribute during aggregation: {}", e),
            }
        }
    }

    totals
        .into_iter()
        .map(|((field, unit), value)| Attribute::new(field, value, unit).to_string())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Aggregates the extra info of a composite's committed components.
pub fn aggregate_components(composite: &CompositeFood, foods: &impl FoodLookup) -> String {
    aggregate_extra_info(composite.components().iter().filter_map(|c| {
        foods
            .committed_food(&c.food_id)
            .map(|food| (food.extra_info.as_str(), c.servings))
    }))
}

/// Assembles a composite food from committed components.
pub struct CompositeBuilder<'a, L: FoodLookup> {
    foods: &'a L,
    composite: CompositeFood,
}

impl<'a, L: FoodLookup> CompositeBuilder<'a, L> {
    pub fn new(foods: &'a L) -> Self {
        Self {
            foods,
            composite: CompositeFood::new(),
        }
    }

    /// Adds `servings` of the food `id`, which must exist and be committed.
    pub fn add(&mut self, id: &FoodId, servings: f64) -> Result<&mut Self, DiaryError> {
        if !servings.is_finite() || servings <= 0.0 {
            return Err(DiaryError::InvalidServings(servings));
        }
        let food = self
            .foods
            .food(id)
            .ok_or_else(|| DiaryError::NotFound(format!("food {}", id)))?;
        if !food.committed {
            return Err(DiaryError::NotCommitted(food.id.clone()));
        }
        self.composite.add_component(food.id.clone(), servings);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.composite.components().is_empty()
    }

    /// Finalizes calories and aggregates extra info into a new food.
    pub fn build(mut self, id: FoodId, name: impl Into<String>) -> Food {
        self.composite.finalize_calories(self.foods);
        let extra_info = aggregate_components(&self.composite, self.foods);
        Food::composite(id, name, self.composite).with_extra_info(extra_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Foods(HashMap<FoodId, Food>);

    impl FoodLookup for Foods {
        fn food(&self, id: &FoodId) -> Option<&Food> {
            self.0.get(id)
        }
    }

    fn foods() -> Foods {
        let list = vec![
            Food::basic(FoodId::from("B1"), "Bread", 100.0)
                .with_extra_info("protein=5:g")
                .committed(),
            Food::basic(FoodId::from("B2"), "Cheese", 50.0)
                .with_extra_info("protein=3:g|calcium=120:mg")
                .committed(),
            Food::basic(FoodId::from("B3"), "Draft", 10.0),
        ];
        Foods(list.into_iter().map(|f| (f.id.clone(), f)).collect())
    }

    #[test]
    fn test_build_derives_calories_and_attributes() {
        let foods = foods();
        let mut builder = CompositeBuilder::new(&foods);
        builder.add(&FoodId::from("B1"), 2.0).unwrap();
        builder.add(&FoodId::from("B2"), 1.0).unwrap();

        let food = builder.build(FoodId::from("C1"), "Sandwich");
        assert_eq!(food.calories(), 250.0);
        assert_eq!(food.extra_info, "calcium=120:mg|protein=13:g");
        assert!(!food.committed);
    }

    #[test]
    fn test_add_rejects_uncommitted_component() {
        let foods = foods();
        let mut builder = CompositeBuilder::new(&foods);
        let err = builder.add(&FoodId::from("B3"), 1.0).err().unwrap();
        assert!(matches!(err, DiaryError::NotCommitted(_)));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_add_rejects_unknown_component_and_bad_servings() {
        let foods = foods();
        let mut builder = CompositeBuilder::new(&foods);
        assert!(matches!(
            builder.add(&FoodId::from("B9"), 1.0).err().unwrap(),
            DiaryError::NotFound(_)
        ));
        assert!(matches!(
            builder.add(&FoodId::from("B1"), 0.0).err().unwrap(),
            DiaryError::InvalidServings(_)
        ));
        assert!(matches!(
            builder.add(&FoodId::from("B1"), f64::NAN).err().unwrap(),
            DiaryError::InvalidServings(_)
        ));
    }

    #[test]
    fn test_aggregate_keeps_units_distinct() {
        let info = aggregate_extra_info([("sugar=2:g", 2.0), ("sugar=500:mg", 1.0)]);
        assert_eq!(info, "sugar=4:g|sugar=500:mg");
    }

    #[test]
    fn test_aggregate_skips_malformed_triples() {
        let info = aggregate_extra_info([("protein=1.5:g|oops|fat=x:g", 2.0), ("", 3.0)]);
        assert_eq!(info, "protein=3:g");
    }

    #[test]
    fn test_aggregate_components_ignores_uncommitted() {
        let foods = foods();
        let mut composite = CompositeFood::new();
        composite.add_component(FoodId::from("B1"), 1.0);
        composite.add_component(FoodId::from("B3"), 4.0);
        composite.finalize_calories(&foods);

        assert_eq!(composite.calories(), 100.0);
        assert_eq!(aggregate_components(&composite, &foods), "protein=5:g");
    }
}
