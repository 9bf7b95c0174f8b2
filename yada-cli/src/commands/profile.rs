use clap::{Args, Subcommand};
use yada_core::{
    target_calories, ActivityLevel, CalcMethod, DiaryStore, ProfileUpdate, Session, Sex,
};

use super::{parse_date, OutputFormat};

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Set body measurements from a date onwards
    Set {
        /// Sex (M or F)
        #[arg(long)]
        sex: Option<String>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,

        /// Age in years
        #[arg(long)]
        age: Option<u32>,

        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        /// Activity level (sedentary, lightly-active, moderately-active,
        /// very-active, extra-active)
        #[arg(long)]
        activity: Option<String>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show the profile in effect on a date
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show or set the calorie target method
    Method {
        /// harris-benedict or mifflin-st-jeor
        method: Option<String>,
    },
}

impl ProfileCommand {
    /// Whether the command changes the diary.
    pub fn modifies(&self) -> bool {
        match &self.command {
            ProfileSubcommand::Set { .. } => true,
            ProfileSubcommand::Method { method } => method.is_some(),
            ProfileSubcommand::Show { .. } => false,
        }
    }

    pub fn run<S: DiaryStore>(
        &self,
        session: &mut Session<S>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProfileSubcommand::Set {
                sex,
                height,
                age,
                weight,
                activity,
                date,
            } => {
                let date = parse_date(date.as_deref())?;
                let update = ProfileUpdate {
                    sex: sex
                        .as_deref()
                        .map(str::parse::<Sex>)
                        .transpose()?,
                    height_cm: *height,
                    age_years: *age,
                    weight_kg: *weight,
                    activity: activity
                        .as_deref()
                        .map(str::parse::<ActivityLevel>)
                        .transpose()?,
                };
                let profile = session.update_profile(date, update)?;
                println!("Profile from {}: {}", date, profile);
                Ok(())
            }
            ProfileSubcommand::Show { date, format } => {
                let date = parse_date(date.as_deref())?;
                let method = session.profiles().method();
                let profile = session.profiles().effective(date);
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&profile)?);
                    }
                    OutputFormat::Text => match profile {
                        Some(profile) => {
                            println!("Profile in effect on {} (set {}):", date, profile.date);
                            println!("  {}", profile);
                            println!(
                                "  Target: {:.0} cal ({})",
                                target_calories(profile, method),
                                method
                            );
                        }
                        None => println!("No profile set on or before {}.", date),
                    },
                }
                Ok(())
            }
            ProfileSubcommand::Method { method } => {
                match method {
                    Some(method) => {
                        let method: CalcMethod = method.parse().map_err(|e: String| e)?;
                        session.set_calc_method(method);
                        println!("Calculation method set to {}", method);
                    }
                    None => println!("Calculation method: {}", session.profiles().method()),
                }
                Ok(())
            }
        }
    }
}
