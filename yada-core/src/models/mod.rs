mod attribute;
mod daily_log;
mod food;
mod profile;

pub use attribute::{
    format_amount, join_attributes, parse_extra_info, Attribute, AttributeError, SEPARATOR,
};
pub use daily_log::{DailyLog, LogEntry};
pub use food::{Component, CompositeFood, Food, Nutrition};
pub use profile::{ActivityLevel, DailyProfile, ProfileBook, ProfileUpdate, Sex};
