//! Daily calorie targets.
//!
//! Target = basal metabolic rate (BMR) for the chosen equation, multiplied
//! by the profile's activity factor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{DailyProfile, Sex};

/// BMR equation used for calorie targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalcMethod {
    /// Harris-Benedict (revised, 1984)
    #[default]
    HarrisBenedict,
    /// Mifflin-St Jeor (1990)
    MifflinStJeor,
}

impl fmt::Display for CalcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcMethod::HarrisBenedict => write!(f, "HARRIS_BENEDICT"),
            CalcMethod::MifflinStJeor => write!(f, "MIFFLIN_ST_JEOR"),
        }
    }
}

impl FromStr for CalcMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "harris_benedict" => Ok(CalcMethod::HarrisBenedict),
            "mifflin_st_jeor" => Ok(CalcMethod::MifflinStJeor),
            _ => Err(format!(
                "Invalid calculation method '{}'. Valid options: harris-benedict, mifflin-st-jeor",
                s
            )),
        }
    }
}

/// Basal metabolic rate in kcal/day.
pub fn bmr(profile: &DailyProfile, method: CalcMethod) -> f64 {
    let weight = profile.weight_kg;
    let height = profile.height_cm;
    let age = f64::from(profile.age_years);

    match (method, profile.sex) {
        (CalcMethod::HarrisBenedict, Sex::Male) => {
            66.47 + 13.75 * weight + 5.003 * height - 6.755 * age
        }
        (CalcMethod::HarrisBenedict, Sex::Female) => {
            655.1 + 9.563 * weight + 1.850 * height - 4.676 * age
        }
        (CalcMethod::MifflinStJeor, Sex::Male) => 10.0 * weight + 6.25 * height - 5.0 * age + 5.0,
        (CalcMethod::MifflinStJeor, Sex::Female) => {
            10.0 * weight + 6.25 * height - 5.0 * age - 161.0
        }
    }
}

/// Daily calorie target: BMR times the activity factor.
pub fn target_calories(profile: &DailyProfile, method: CalcMethod) -> f64 {
    bmr(profile, method) * profile.activity.factor()
}
