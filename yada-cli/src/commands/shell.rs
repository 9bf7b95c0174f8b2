//! Interactive session: one diary kept open across many commands, with
//! explicit `save` and `undo`.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use yada_core::{DiaryStore, Session};

use super::{FoodCommand, LogCommand, ProfileCommand, SummaryCommand};

#[derive(Parser)]
#[command(name = "yada", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Manage foods
    Food(FoodCommand),

    /// Log what you ate
    Log(LogCommand),

    /// Manage body profiles and the target method
    Profile(ProfileCommand),

    /// Calories consumed against the target
    Summary(SummaryCommand),

    /// Save all changes; saved commands become undoable
    Save,

    /// Undo the most recent saved command
    Undo,

    /// Show unsaved and undoable command counts
    Status,

    /// Save and leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Splits a line into words. Single or double quotes group words
/// containing spaces.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("Unterminated {} quote", q));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Runs one shell line against the session.
pub fn execute_line<S: DiaryStore>(
    session: &mut Session<S>,
    line: &str,
) -> Result<Flow, Box<dyn std::error::Error>> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(Flow::Continue);
    }

    let parsed = match ShellLine::try_parse_from(tokens) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Usage errors and --help both land here.
            e.print()?;
            return Ok(Flow::Continue);
        }
    };

    match parsed.command {
        ShellCommand::Food(cmd) => cmd.run(session)?,
        ShellCommand::Log(cmd) => cmd.run(session)?,
        ShellCommand::Profile(cmd) => cmd.run(session)?,
        ShellCommand::Summary(cmd) => cmd.run(session)?,
        ShellCommand::Save => {
            let promoted = session.save()?;
            println!("Saved. {} command(s) can now be undone.", promoted);
        }
        ShellCommand::Undo => match session.undo()? {
            Some(description) => println!("Undid: {}", description),
            None => println!("Nothing to undo."),
        },
        ShellCommand::Status => println!("{}", session.status()),
        ShellCommand::Exit => {
            session.save()?;
            return Ok(Flow::Exit);
        }
    }
    Ok(Flow::Continue)
}

/// Reads commands from `input` until `exit` or end of input. End of input
/// performs a final save.
pub fn run_with<S: DiaryStore, R: BufRead>(
    mut session: Session<S>,
    mut input: R,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    loop {
        print!("yada> ");
        stdout.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            let promoted = session.close()?;
            tracing::debug!("Closed session, {} command(s) promoted", promoted);
            return Ok(());
        }

        match execute_line(&mut session, &line) {
            Ok(Flow::Exit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

pub fn run<S: DiaryStore>(session: Session<S>) -> Result<(), Box<dyn std::error::Error>> {
    println!("yada {} - type 'help' for commands, 'exit' to save and quit.", yada_core::version());
    run_with(session, io::stdin().lock())
}
