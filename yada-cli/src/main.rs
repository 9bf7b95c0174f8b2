use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yada_core::{Session, TextStore};

mod commands;
mod config;

use commands::{ConfigCommand, FoodCommand, LogCommand, ProfileCommand, SummaryCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "yada")]
#[command(version)]
#[command(about = "Yet another diet assistant: track foods, daily logs and calorie targets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage foods
    Food(FoodCommand),

    /// Log what you ate
    Log(LogCommand),

    /// Manage body profiles and the target method
    Profile(ProfileCommand),

    /// Calories consumed against the target
    Summary(SummaryCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Start an interactive session (default)
    Shell,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level.value))
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;
    init_tracing(&config);

    if let Some(Commands::Config(cmd)) = &cli.command {
        return cmd.run(&config, cli_config_path);
    }

    let store = TextStore::new(config.data_dir.value.clone());
    let mut session = Session::open_with_method(store, config.calc_method.value)?;

    // One-shot write commands are saved straight away.
    let modified = match &cli.command {
        Some(Commands::Food(cmd)) => {
            cmd.run(&mut session)?;
            cmd.modifies()
        }
        Some(Commands::Log(cmd)) => {
            cmd.run(&mut session)?;
            cmd.modifies()
        }
        Some(Commands::Profile(cmd)) => {
            cmd.run(&mut session)?;
            cmd.modifies()
        }
        Some(Commands::Summary(cmd)) => {
            cmd.run(&session)?;
            false
        }
        Some(Commands::Shell) | None => return commands::shell::run(session),
        Some(Commands::Config(_)) => false,
    };

    if modified {
        session.close()?;
    }
    Ok(())
}
