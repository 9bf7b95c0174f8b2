use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DiaryError;
use crate::target::CalcMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "M"),
            Sex::Female => write!(f, "F"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            _ => Err(format!("Invalid sex '{}'. Valid options: M, F", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    /// Multiplier applied to the basal metabolic rate.
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityLevel::Sedentary => write!(f, "sedentary"),
            ActivityLevel::LightlyActive => write!(f, "lightly active"),
            ActivityLevel::ModeratelyActive => write!(f, "moderately active"),
            ActivityLevel::VeryActive => write!(f, "very active"),
            ActivityLevel::ExtraActive => write!(f, "extra active"),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly active" => Ok(ActivityLevel::LightlyActive),
            "moderately active" => Ok(ActivityLevel::ModeratelyActive),
            "very active" => Ok(ActivityLevel::VeryActive),
            "extra active" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!(
                "Invalid activity level '{}'. Valid options: sedentary, lightly-active, \
                 moderately-active, very-active, extra-active",
                s
            )),
        }
    }
}

/// Body measurements in effect from `date` onwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyProfile {
    pub date: NaiveDate,
    pub sex: Sex,
    pub height_cm: f64,
    pub age_years: u32,
    pub weight_kg: f64,
    pub activity: ActivityLevel,
}

impl fmt::Display for DailyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sex: {}, Height: {} cm, Age: {}, Weight: {} kg, Activity: {}",
            self.sex, self.height_cm, self.age_years, self.weight_kg, self.activity
        )
    }
}

/// Partial profile edit; unset fields keep their previous values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub age_years: Option<u32>,
    pub weight_kg: Option<f64>,
    pub activity: Option<ActivityLevel>,
}

/// Date-keyed profiles plus the calculation method for targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileBook {
    method: CalcMethod,
    profiles: BTreeMap<NaiveDate, DailyProfile>,
}

impl ProfileBook {
    pub fn new(method: CalcMethod) -> Self {
        Self {
            method,
            profiles: BTreeMap::new(),
        }
    }

    pub fn method(&self) -> CalcMethod {
        self.method
    }

    pub fn set_method(&mut self, method: CalcMethod) {
        self.method = method;
    }

    /// Profile recorded exactly on `date`.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyProfile> {
        self.profiles.get(&date)
    }

    /// Most recent profile at or before `date`.
    pub fn effective(&self, date: NaiveDate) -> Option<&DailyProfile> {
        self.profiles.range(..=date).next_back().map(|(_, p)| p)
    }

    pub fn insert(&mut self, profile: DailyProfile) {
        self.profiles.insert(profile.date, profile);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Applies `update` to the profile for `date`. A date without its own
    /// profile starts from a copy of the most recent earlier one; with no
    /// earlier profile every field must be supplied.
    pub fn update(
        &mut self,
        date: NaiveDate,
        update: ProfileUpdate,
    ) -> Result<&DailyProfile, DiaryError> {
        let base = self.effective(date).cloned();
        let missing = |field: &str| DiaryError::InvalidProfile(format!("{} is required", field));

        let profile = DailyProfile {
            date,
            sex: match update.sex.or(base.as_ref().map(|p| p.sex)) {
                Some(sex) => sex,
                None => return Err(missing("sex")),
            },
            height_cm: positive(
                "height",
                update.height_cm.or(base.as_ref().map(|p| p.height_cm)),
            )?,
            age_years: match update.age_years.or(base.as_ref().map(|p| p.age_years)) {
                Some(age) => age,
                None => return Err(missing("age")),
            },
            weight_kg: positive(
                "weight",
                update.weight_kg.or(base.as_ref().map(|p| p.weight_kg)),
            )?,
            activity: update
                .activity
                .or(base.as_ref().map(|p| p.activity))
                .unwrap_or(ActivityLevel::Sedentary),
        };

        self.profiles.insert(date, profile);
        Ok(&self.profiles[&date])
    }
}

fn positive(field: &str, value: Option<f64>) -> Result<f64, DiaryError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(DiaryError::InvalidProfile(format!(
            "{} must be positive, got {}",
            field, v
        ))),
        None => Err(DiaryError::InvalidProfile(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn full_update() -> ProfileUpdate {
        ProfileUpdate {
            sex: Some(Sex::Female),
            height_cm: Some(165.0),
            age_years: Some(28),
            weight_kg: Some(60.0),
            activity: Some(ActivityLevel::LightlyActive),
        }
    }

    #[test]
    fn test_update_requires_fields_without_history() {
        let mut book = ProfileBook::default();
        let err = book
            .update(
                day(1),
                ProfileUpdate {
                    weight_kg: Some(60.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("sex is required"));
        assert!(book.is_empty());
    }

    #[test]
    fn test_update_copies_previous_profile() {
        let mut book = ProfileBook::default();
        book.update(day(1), full_update()).unwrap();

        let updated = book
            .update(
                day(5),
                ProfileUpdate {
                    weight_kg: Some(59.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .clone();

        assert_eq!(updated.date, day(5));
        assert_eq!(updated.weight_kg, 59.0);
        assert_eq!(updated.height_cm, 165.0);
        assert_eq!(book.get(day(1)).unwrap().weight_kg, 60.0);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_update_rejects_non_positive_measurements() {
        let mut book = ProfileBook::default();
        let mut update = full_update();
        update.height_cm = Some(0.0);
        assert!(book.update(day(1), update).is_err());
    }

    #[test]
    fn test_effective_falls_back_to_earlier_profile() {
        let mut book = ProfileBook::default();
        book.update(day(2), full_update()).unwrap();
        book.update(
            day(10),
            ProfileUpdate {
                weight_kg: Some(58.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(book.effective(day(1)).is_none());
        assert_eq!(book.effective(day(2)).unwrap().date, day(2));
        assert_eq!(book.effective(day(9)).unwrap().date, day(2));
        assert_eq!(book.effective(day(20)).unwrap().weight_kg, 58.0);
        assert!(book.get(day(9)).is_none());
    }

    #[test]
    fn test_activity_level_parse() {
        assert_eq!(
            "lightly-active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::LightlyActive
        );
        assert_eq!(
            "Very Active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryActive
        );
        assert!("couch".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert!("x".parse::<Sex>().is_err());
    }
}
