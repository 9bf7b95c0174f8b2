use clap::Args;
use yada_core::{DiaryStore, Session};

use super::{parse_date, OutputFormat};

/// Calories consumed on a date against the profile's target
#[derive(Args)]
pub struct SummaryCommand {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    pub date: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl SummaryCommand {
    pub fn run<S: DiaryStore>(&self, session: &Session<S>) -> Result<(), Box<dyn std::error::Error>> {
        let summary = session.summary(parse_date(self.date.as_deref())?);
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text => println!("{}", summary),
        }
        Ok(())
    }
}
