use serde::{Deserialize, Serialize};
use std::fmt;

use super::attribute::{format_amount, parse_extra_info, Attribute};
use crate::composite::FoodLookup;
use crate::ids::{FoodId, FoodKind};

/// A food definition, either basic (literal calories) or composite
/// (calories derived from committed component foods).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub keywords: Vec<String>,
    /// True once the food has been written to storage.
    pub committed: bool,
    /// `field=value:unit` triples joined by `|`, possibly empty.
    pub extra_info: String,
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Nutrition {
    Basic { calories: f64 },
    Composite(CompositeFood),
}

impl Food {
    pub fn basic(id: FoodId, name: impl Into<String>, calories: f64) -> Self {
        Self::with_nutrition(id, name, Nutrition::Basic { calories })
    }

    pub fn composite(id: FoodId, name: impl Into<String>, composite: CompositeFood) -> Self {
        Self::with_nutrition(id, name, Nutrition::Composite(composite))
    }

    fn with_nutrition(id: FoodId, name: impl Into<String>, nutrition: Nutrition) -> Self {
        Self {
            id,
            name: name.into(),
            keywords: Vec::new(),
            committed: false,
            extra_info: String::new(),
            nutrition,
        }
    }

    /// Sets keywords, trimming each and dropping blanks.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn with_extra_info(mut self, extra_info: impl Into<String>) -> Self {
        self.extra_info = extra_info.into();
        self
    }

    pub fn committed(mut self) -> Self {
        self.committed = true;
        self
    }

    pub fn kind(&self) -> FoodKind {
        match self.nutrition {
            Nutrition::Basic { .. } => FoodKind::Basic,
            Nutrition::Composite(_) => FoodKind::Composite,
        }
    }

    /// Calories per serving.
    pub fn calories(&self) -> f64 {
        match &self.nutrition {
            Nutrition::Basic { calories } => *calories,
            Nutrition::Composite(composite) => composite.calories(),
        }
    }

    /// Component foods; empty for basic foods.
    pub fn components(&self) -> &[Component] {
        match &self.nutrition {
            Nutrition::Basic { .. } => &[],
            Nutrition::Composite(composite) => composite.components(),
        }
    }

    /// Well-formed extra info triples; malformed ones are left out.
    pub fn attributes(&self) -> Vec<Attribute> {
        parse_extra_info(&self.extra_info)
            .filter_map(Result::ok)
            .collect()
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} cal)",
            self.id,
            self.name,
            format_amount(self.calories())
        )?;
        if !self.keywords.is_empty() {
            write!(f, " [{}]", self.keywords.join(", "))?;
        }
        if !self.extra_info.is_empty() {
            write!(f, " | {}", self.extra_info)?;
        }
        if !self.committed {
            write!(f, " (unsaved)")?;
        }
        Ok(())
    }
}

/// One ingredient of a composite food: a food ID and a serving multiplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub food_id: FoodId,
    pub servings: f64,
}

impl Component {
    pub fn new(food_id: FoodId, servings: f64) -> Self {
        Self { food_id, servings }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.food_id, format_amount(self.servings))
    }
}

/// Component list and stored calorie total of a composite food.
///
/// The total is only recomputed by [`CompositeFood::finalize_calories`];
/// components are assumed not to change once referenced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompositeFood {
    components: Vec<Component>,
    total_calories: f64,
}

impl CompositeFood {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component, replacing the multiplier if the food is already listed.
    pub fn add_component(&mut self, food_id: FoodId, servings: f64) {
        match self.components.iter_mut().find(|c| c.food_id == food_id) {
            Some(existing) => existing.servings = servings,
            None => self.components.push(Component::new(food_id, servings)),
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn retain_components(&mut self, keep: impl FnMut(&Component) -> bool) {
        self.components.retain(keep);
    }

    /// Recomputes the total as the sum of component calories times servings.
    /// Components that cannot be resolved as committed foods contribute nothing.
    pub fn finalize_calories(&mut self, foods: &impl FoodLookup) {
        self.total_calories = self
            .components
            .iter()
            .filter_map(|c| {
                foods
                    .committed_food(&c.food_id)
                    .map(|food| food.calories() * c.servings)
            })
            .sum();
    }

    pub fn calories(&self) -> f64 {
        self.total_calories
    }
}
