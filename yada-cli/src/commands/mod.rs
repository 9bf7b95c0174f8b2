use chrono::{Local, NaiveDate};
use clap::ValueEnum;

mod config_cmd;
mod food;
mod log;
mod profile;
pub mod shell;
mod summary;

pub use config_cmd::ConfigCommand;
pub use food::FoodCommand;
pub use log::LogCommand;
pub use profile::ProfileCommand;
pub use summary::SummaryCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `YYYY-MM-DD` argument, defaulting to today.
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate, String> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", s)),
        None => Ok(Local::now().date_naive()),
    }
}

/// Rejects text that would break the `;`/`|` separated data files.
pub fn check_text(what: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", what));
    }
    if value.contains([';', '|']) || value.contains('\n') {
        return Err(format!("{} cannot contain ';', '|' or line breaks: {}", what, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-02-03")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
        );
        assert!(parse_date(Some("03-02-2025")).is_err());
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_check_text() {
        assert!(check_text("Name", "Peanut Butter").is_ok());
        assert!(check_text("Name", "  ").is_err());
        assert!(check_text("Name", "a;b").is_err());
        assert!(check_text("Keyword", "a|b").is_err());
    }
}
