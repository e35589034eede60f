//! Voca CLI
//!
//! Terminal front end for studying vocabulary flashcards against the Voca
//! backend.

mod command;
mod markup;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voca_session::{
    ApiClient, CardEndpoint, Config, CycleOutcome, DifficultyLevel, StudyBackend, StudySession,
    CONFIG_FILE_NAME,
};

use crate::command::{Command, HELP};
use crate::terminal::{render_card, render_status, render_view, CliConfirm, Terminal};

/// Voca - TOEIC vocabulary trainer
///
/// Studies one difficulty level at a time. Each day of a level must be
/// opened before its cards are due; grades are scheduled by the backend's
/// Leitner boxes.
#[derive(Parser, Debug)]
#[command(name = "voca")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: voca.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Base URL of the backend API
    #[arg(long, value_name = "URL", global = true)]
    api_base: Option<String>,

    /// Backend user id
    #[arg(short, long, value_name = "ID", global = true)]
    user_id: Option<u64>,

    /// Display name
    #[arg(long, value_name = "NAME", global = true)]
    username: Option<String>,

    /// Difficulty level (600, 800 or 900)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    level: Option<DifficultyLevel>,

    /// Card route (today or next)
    #[arg(long, value_name = "ENDPOINT", global = true)]
    card_endpoint: Option<CardEndpoint>,

    /// Open pending days without asking
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Study cards interactively (default)
    Study,
    /// Print the day-gating state of every level and exit
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(ref api_base) = args.api_base {
        config.api_base.clone_from(api_base);
    }
    if let Some(user_id) = args.user_id {
        config.user_id = user_id;
    }
    if let Some(ref username) = args.username {
        config.username.clone_from(username);
    }
    if let Some(level) = args.level {
        config.difficulty_level = level;
    }
    if let Some(card_endpoint) = args.card_endpoint {
        config.card_endpoint = card_endpoint;
    }

    // Re-validate after overrides
    config.validate()?;

    let client = ApiClient::from_config(&config)?;
    tracing::info!(api_base = %client.base(), user_id = config.user_id, "Backend client ready");

    match args.command.unwrap_or(Mode::Study) {
        Mode::Status => print_statuses(&client, &config).await,
        Mode::Study => {
            print_config(&config);
            let terminal = Terminal::new();
            let confirmer = if args.yes {
                CliConfirm::Always
            } else {
                CliConfirm::Prompt(terminal.clone())
            };
            let session = StudySession::new(client, confirmer, config.session_context());
            let level_file = config_file(args.config.as_deref())?;
            study(&session, &terminal, &level_file).await
        }
    }
}

/// Loads configuration from `--config` or `voca.json` in the working directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// The file a level switch is remembered in.
fn config_file(config_path: Option<&str>) -> anyhow::Result<PathBuf> {
    match config_path {
        Some(path_str) => Ok(PathBuf::from(path_str)),
        None => Ok(std::env::current_dir()?.join(CONFIG_FILE_NAME)),
    }
}

fn print_config(config: &Config) {
    println!("Signed in as {} (user {})", config.username, config.user_id);
    println!("  Backend: {}", config.api_base);
    println!("  Level: {}", config.difficulty_level.label());
    println!();
}

async fn print_statuses(client: &ApiClient, config: &Config) -> anyhow::Result<()> {
    let levels = client
        .level_statuses(config.user_id)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if levels.is_empty() {
        println!("No levels tracked for user {}", config.user_id);
    }
    for status in &levels {
        println!("{}", render_status(status));
    }
    Ok(())
}

/// Runs the interactive study loop until `q` or end of input.
async fn study(
    session: &StudySession<ApiClient, CliConfirm>,
    terminal: &Terminal,
    config_file: &Path,
) -> anyhow::Result<()> {
    let outcome = session.advance().await;
    print!("{}", render_view(&session.view(), &outcome));

    while let Some(line) = terminal.read_line("> ").await? {
        let outcome = match Command::parse(&line) {
            Command::Grade(grade) => {
                if !session.view().grading_enabled {
                    println!("Nothing to grade right now. Press r to retry.");
                    continue;
                }
                session.submit(grade).await
            }
            Command::Reveal => {
                match session.view().card {
                    Some(card) => print!("{}", render_card(&card, true)),
                    None => println!("No card on screen."),
                }
                continue;
            }
            Command::Level(level) => {
                session.change_level(level);
                remember_level(config_file, level);
                session.advance().await
            }
            Command::Retry => session.retry().await,
            Command::State => {
                println!("{}", serde_json::to_string_pretty(&session.view())?);
                continue;
            }
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
            Command::Empty => continue,
            Command::Invalid(reason) => {
                println!("{reason} (h for help)");
                continue;
            }
        };

        if outcome == CycleOutcome::Ignored {
            println!("Nothing to grade right now.");
            continue;
        }
        print!("{}", render_view(&session.view(), &outcome));
    }

    tracing::info!("Study session ended");
    Ok(())
}

/// Writes the selected level back so the next run starts on it.
fn remember_level(config_file: &Path, level: DifficultyLevel) {
    match Config::save_level(config_file, level) {
        Ok(()) => {
            tracing::debug!(path = %config_file.display(), %level, "Saved level selection");
        }
        Err(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Failed to save level selection");
            println!("Could not remember level {}: {e}", level.label());
        }
    }
}
