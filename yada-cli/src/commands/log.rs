use clap::{Args, Subcommand};
use serde::Serialize;
use yada_core::models::format_amount;
use yada_core::{
    AddLogEntry, DeleteLogEntry, DiaryError, DiaryStore, LogEntry, Session, UpdateLogEntry,
};

use super::{parse_date, OutputFormat};

#[derive(Args)]
pub struct LogCommand {
    #[command(subcommand)]
    pub command: LogSubcommand,
}

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Log servings of a food
    Add {
        /// Food ID or name
        food: String,

        /// Number of servings
        #[arg(long, short, default_value = "1")]
        servings: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Delete a log entry by its position
    Delete {
        /// Entry position as shown by `log show` (starting at 1)
        position: usize,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Change the servings of a log entry (0 deletes it)
    Update {
        /// Entry position as shown by `log show` (starting at 1)
        position: usize,

        /// New number of servings
        servings: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show the log for a date
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// A log entry with its food resolved, for display.
#[derive(Serialize)]
struct EntryView<'a> {
    position: usize,
    food_id: &'a str,
    name: Option<&'a str>,
    servings: f64,
    calories: f64,
}

fn index_of(position: usize) -> Result<usize, String> {
    position
        .checked_sub(1)
        .ok_or_else(|| "Positions start at 1".to_string())
}

impl LogCommand {
    /// Whether the command changes the diary.
    pub fn modifies(&self) -> bool {
        !matches!(self.command, LogSubcommand::Show { .. })
    }

    pub fn run<S: DiaryStore>(
        &self,
        session: &mut Session<S>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LogSubcommand::Add {
                food,
                servings,
                date,
            } => {
                let date = parse_date(date.as_deref())?;
                let food = session
                    .diary()
                    .catalog
                    .resolve(food)
                    .ok_or_else(|| format!("Food not found: {}", food))?;
                // Only saved foods can be logged.
                if !food.committed {
                    return Err(DiaryError::NotCommitted(food.id.clone()).into());
                }
                let food_id = food.id.clone();
                let command = AddLogEntry::new(date, LogEntry::new(food_id, *servings));
                println!("Done: {}", session.execute(Box::new(command))?);
                Ok(())
            }
            LogSubcommand::Delete { position, date } => {
                let date = parse_date(date.as_deref())?;
                let command = DeleteLogEntry::new(date, index_of(*position)?);
                println!("Done: {}", session.execute(Box::new(command))?);
                Ok(())
            }
            LogSubcommand::Update {
                position,
                servings,
                date,
            } => {
                let date = parse_date(date.as_deref())?;
                let command = UpdateLogEntry::new(date, index_of(*position)?, *servings);
                println!("Done: {}", session.execute(Box::new(command))?);
                Ok(())
            }
            LogSubcommand::Show { date, format } => {
                let date = parse_date(date.as_deref())?;
                show(session, date, format)
            }
        }
    }
}

fn show<S: DiaryStore>(
    session: &Session<S>,
    date: chrono::NaiveDate,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = &session.diary().catalog;
    let entries: Vec<EntryView> = session
        .diary()
        .logs
        .get(date)
        .map(|log| log.entries())
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let food = catalog.get(&entry.food_id);
            EntryView {
                position: i + 1,
                food_id: entry.food_id.as_str(),
                name: food.map(|f| f.name.as_str()),
                servings: entry.servings,
                calories: food.map_or(0.0, |f| f.calories() * entry.servings),
            }
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("Nothing logged on {}.", date);
                return Ok(());
            }
            println!("Log for {}:", date);
            for entry in &entries {
                println!(
                    "  {}) {} {} x{} = {} cal",
                    entry.position,
                    entry.food_id,
                    entry.name.unwrap_or("(unknown food)"),
                    format_amount(entry.servings),
                    format_amount(entry.calories.round())
                );
            }
            let total: f64 = entries.iter().map(|e| e.calories).sum();
            println!("Total: {} cal", format_amount(total.round()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::Parser;
    use tempfile::TempDir;
    use yada_core::{Food, FoodId, FoodKind, TextStore};

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: LogSubcommand,
    }

    fn parse(args: &[&str]) -> LogCommand {
        let cli = TestCli::parse_from(std::iter::once("log").chain(args.iter().copied()));
        LogCommand {
            command: cli.command,
        }
    }

    fn session_with_apple(temp: &TempDir) -> Session<TextStore> {
        let mut session = Session::open(TextStore::new(temp.path())).unwrap();
        let id = session.allocate_id(FoodKind::Basic).unwrap();
        session.add_food(Food::basic(id, "Apple", 95.0)).unwrap();
        session.save().unwrap();
        session
    }

    #[test]
    fn test_add_update_delete() {
        let temp = TempDir::new().unwrap();
        let mut session = session_with_apple(&temp);
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        parse(&["add", "apple", "-s", "2", "-d", "2025-06-01"])
            .run(&mut session)
            .unwrap();
        parse(&["add", "B1", "-s", "3", "-d", "2025-06-01"])
            .run(&mut session)
            .unwrap();
        let log = session.diary().logs.get(date).unwrap();
        assert_eq!(log.entries(), &[LogEntry::new(FoodId::from("B1"), 5.0)]);

        parse(&["update", "1", "1.5", "-d", "2025-06-01"])
            .run(&mut session)
            .unwrap();
        assert_eq!(session.diary().logs.get(date).unwrap().entries()[0].servings, 1.5);

        assert!(parse(&["delete", "2", "-d", "2025-06-01"])
            .run(&mut session)
            .is_err());
        assert!(parse(&["delete", "0", "-d", "2025-06-01"])
            .run(&mut session)
            .is_err());
        parse(&["delete", "1", "-d", "2025-06-01"])
            .run(&mut session)
            .unwrap();
        assert!(session.diary().logs.get(date).is_none());
        assert_eq!(session.history().pending_len(), 4);
    }

    #[test]
    fn test_add_unknown_food() {
        let temp = TempDir::new().unwrap();
        let mut session = session_with_apple(&temp);
        assert!(parse(&["add", "Mango"]).run(&mut session).is_err());
        assert_eq!(session.history().pending_len(), 0);
    }

    #[test]
    fn test_add_unsaved_food_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut session = session_with_apple(&temp);
        let id = session.allocate_id(FoodKind::Basic).unwrap();
        session.add_food(Food::basic(id, "Pear", 100.0)).unwrap();

        let err = parse(&["add", "pear"]).run(&mut session).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiaryError>(),
            Some(DiaryError::NotCommitted(_))
        ));
        assert_eq!(session.history().pending_len(), 1);

        session.save().unwrap();
        parse(&["add", "pear"]).run(&mut session).unwrap();
        assert_eq!(session.history().pending_len(), 1);
    }

    #[test]
    fn test_modifies() {
        assert!(parse(&["add", "B1"]).modifies());
        assert!(!parse(&["show"]).modifies());
    }
}
