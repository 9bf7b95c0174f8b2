//! Line formats of the text data files.
//!
//! Foods are `;`-separated rows with `|`-joined lists, logs are `Date:`
//! blocks of numbered entries and profiles are one row per date. Blank and
//! `#` lines are ignored; rows that fail to parse are skipped with a warning.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::Path;

use super::StorageError;
use crate::composite::FoodLookup;
use crate::ids::{FoodId, FoodKind};
use crate::log_store::LogStore;
use crate::models::{
    format_amount, CompositeFood, DailyLog, DailyProfile, Food, LogEntry, ProfileBook, SEPARATOR,
};
use crate::target::CalcMethod;

const LOG_DATE_FORMAT: &str = "%d-%m-%Y";
const PROFILE_DATE_FORMAT: &str = "%Y-%m-%d";
const METHOD_PREFIX: &str = "CALC_METHOD:";

/// Lines worth parsing, with 1-based line numbers.
fn data_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_error(path: &Path, line: usize, msg: impl Into<String>) -> StorageError {
    StorageError::ParseError(path.to_path_buf(), line, msg.into())
}

fn skip(err: StorageError) {
    tracing::warn!("Skipping malformed row: {}", err);
}

fn parse_number(field: &str, what: &str) -> Result<f64, String> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid {} '{}'", what, field))
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn food_header(kind: FoodKind) -> &'static str {
    match kind {
        FoodKind::Basic => "# Basic Foods Database\nTYPE;ID;Name;Keywords;Calories;ExtraInfo\n",
        FoodKind::Composite => {
            "# Composite Foods Database\nTYPE;ID;Name;Keywords;Calories;Components;ExtraInfo\n"
        }
    }
}

/// Formats one category of foods, ordered by numeric ID.
pub(super) fn format_foods(kind: FoodKind, foods: &[&Food]) -> String {
    let mut sorted: Vec<&Food> = foods.iter().copied().filter(|f| f.kind() == kind).collect();
    sorted.sort_by(|a, b| a.id.sort_key().cmp(&b.id.sort_key()));

    let mut out = String::from(food_header(kind));
    for food in sorted {
        let keywords = food.keywords.join(&SEPARATOR.to_string());
        let calories = format_amount(food.calories());
        let _ = match kind {
            FoodKind::Basic => writeln!(
                out,
                "B;{};{};{};{};{}",
                food.id, food.name, keywords, calories, food.extra_info
            ),
            FoodKind::Composite => {
                let components: Vec<String> =
                    food.components().iter().map(ToString::to_string).collect();
                writeln!(
                    out,
                    "C;{};{};{};{};{};{}",
                    food.id,
                    food.name,
                    keywords,
                    calories,
                    components.join(&SEPARATOR.to_string()),
                    food.extra_info
                )
            }
        };
    }
    out
}

fn parse_food_row(kind: FoodKind, row: &str) -> Result<Food, String> {
    let fields: Vec<&str> = row.split(';').collect();
    let expected = match kind {
        FoodKind::Basic => 5,
        FoodKind::Composite => 6,
    };
    if fields.len() < expected {
        return Err(format!("expected at least {} fields, found {}", expected, fields.len()));
    }

    let marker = fields[0].trim();
    if !marker.eq_ignore_ascii_case(&kind.prefix().to_string()) {
        return Err(format!("unexpected row type '{}'", marker));
    }

    let id = FoodId::parse_input(fields[1]);
    if id.kind() != Some(kind) {
        return Err(format!("invalid {} food ID '{}'", kind, fields[1]));
    }
    let name = fields[2].trim();
    if name.is_empty() {
        return Err("empty food name".to_string());
    }
    let keywords: Vec<&str> = split_list(fields[3]).collect();
    let extra_info = fields.get(expected).map_or("", |s| s.trim());

    let food = match kind {
        FoodKind::Basic => Food::basic(id, name, parse_number(fields[4], "calories")?),
        FoodKind::Composite => {
            let mut composite = CompositeFood::new();
            for part in split_list(fields[5]) {
                let (component, servings) = part
                    .split_once(':')
                    .ok_or_else(|| format!("invalid component '{}'", part))?;
                let servings = parse_number(servings, "component servings")?;
                composite.add_component(FoodId::parse_input(component), servings);
            }
            Food::composite(id, name, composite)
        }
    };
    Ok(food.with_keywords(keywords).with_extra_info(extra_info))
}

pub(super) fn parse_foods(kind: FoodKind, path: &Path, contents: &str) -> Vec<Food> {
    let mut foods = Vec::new();
    for (line, row) in data_lines(contents) {
        if row.starts_with("TYPE;") {
            continue;
        }
        match parse_food_row(kind, row) {
            Ok(food) => foods.push(food),
            Err(msg) => skip(parse_error(path, line, msg)),
        }
    }
    tracing::debug!("Read {} {} food(s) from {}", foods.len(), kind, path.display());
    foods
}

/// Formats logs as `Date:` blocks. Names are looked up for readability only.
pub(super) fn format_logs(logs: &[DailyLog], foods: &impl FoodLookup) -> String {
    let mut out = String::from("# Daily Log Database\n");
    for log in logs {
        let _ = writeln!(out, "Date: {}", log.date.format(LOG_DATE_FORMAT));
        for (i, entry) in log.entries().iter().enumerate() {
            let name = foods.food(&entry.food_id).map_or("", |f| f.name.as_str());
            let _ = writeln!(
                out,
                "{}) FoodID: {}, Name: {}, Servings: {}",
                i + 1,
                entry.food_id,
                name,
                format_amount(entry.servings)
            );
        }
    }
    out
}

fn parse_log_entry(row: &str) -> Result<LogEntry, String> {
    let (_, body) = row
        .split_once(") ")
        .ok_or_else(|| format!("expected numbered entry, found '{}'", row))?;

    let food_id = body
        .split(',')
        .next()
        .and_then(|part| part.trim().strip_prefix("FoodID:"))
        .map(FoodId::parse_input)
        .ok_or_else(|| "missing FoodID".to_string())?;
    let servings = body
        .rsplit(',')
        .next()
        .and_then(|part| part.trim().strip_prefix("Servings:"))
        .ok_or_else(|| "missing Servings".to_string())?;
    let servings = parse_number(servings, "servings")?;
    if servings < 0.0 {
        return Err(format!("negative servings {}", servings));
    }

    Ok(LogEntry::new(food_id, servings))
}

pub(super) fn parse_logs(path: &Path, contents: &str) -> LogStore {
    let mut store = LogStore::new();
    let mut current: Option<NaiveDate> = None;

    for (line, row) in data_lines(contents) {
        if let Some(date) = row.strip_prefix("Date:") {
            current = match NaiveDate::parse_from_str(date.trim(), LOG_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(e) => {
                    skip(parse_error(path, line, format!("invalid date '{}': {}", date.trim(), e)));
                    None
                }
            };
            continue;
        }

        let Some(date) = current else {
            skip(parse_error(path, line, "entry outside of a date block"));
            continue;
        };
        match parse_log_entry(row) {
            Ok(entry) => store.insert_loaded(date, entry),
            Err(msg) => skip(parse_error(path, line, msg)),
        }
    }
    store
}

fn activity_token(profile: &DailyProfile) -> String {
    profile.activity.to_string().replace(' ', "_")
}

pub(super) fn format_profiles(book: &ProfileBook) -> String {
    let mut out = format!("{}{}\n", METHOD_PREFIX, book.method());
    out.push_str("# Date;Gender;Height;Age;Weight;ActivityLevel\n");
    for profile in book.iter() {
        let _ = writeln!(
            out,
            "{};{};{};{};{};{}",
            profile.date.format(PROFILE_DATE_FORMAT),
            profile.sex,
            format_amount(profile.height_cm),
            profile.age_years,
            format_amount(profile.weight_kg),
            activity_token(profile)
        );
    }
    out
}

fn parse_profile_row(row: &str) -> Result<DailyProfile, String> {
    let fields: Vec<&str> = row.split(';').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    }

    let date = NaiveDate::parse_from_str(fields[0], PROFILE_DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {}", fields[0], e))?;
    let age_years = fields[3]
        .parse::<u32>()
        .map_err(|_| format!("invalid age '{}'", fields[3]))?;

    Ok(DailyProfile {
        date,
        sex: fields[1].parse()?,
        height_cm: parse_number(fields[2], "height")?,
        age_years,
        weight_kg: parse_number(fields[4], "weight")?,
        activity: fields[5].parse()?,
    })
}

pub(super) fn parse_profiles(path: &Path, contents: &str) -> ProfileBook {
    let mut book = ProfileBook::default();

    for (line, row) in data_lines(contents) {
        if let Some(method) = row.strip_prefix(METHOD_PREFIX) {
            match method.parse::<CalcMethod>() {
                Ok(method) => book.set_method(method),
                Err(msg) => skip(parse_error(path, line, msg)),
            }
            continue;
        }
        match parse_profile_row(row) {
            Ok(profile) => book.insert(profile),
            Err(msg) => skip(parse_error(path, line, msg)),
        }
    }
    book
}
