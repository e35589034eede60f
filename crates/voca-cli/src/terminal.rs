//! Stdin prompts and screen rendering.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use voca_session::{Card, Confirm, CycleOutcome, LevelStatus, SessionView};

use crate::markup;

/// Line reader shared by the study prompt and confirmations.
#[derive(Debug, Clone)]
pub struct Terminal {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Terminal {
    /// Wraps the process's stdin.
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Prints `prompt` and reads one line. `None` on end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        self.lines.lock().await.next_line().await
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

/// How day-open confirmations are answered.
#[derive(Debug, Clone)]
pub enum CliConfirm {
    /// Ask on stdin.
    Prompt(Terminal),
    /// Accept without asking (`--yes`).
    Always,
}

impl Confirm for CliConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        match self {
            Self::Always => {
                println!("{prompt} yes");
                true
            }
            Self::Prompt(terminal) => match terminal.read_line(&format!("{prompt} [y/N] ")).await {
                Ok(Some(answer)) => is_yes(&answer),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read confirmation");
                    false
                }
            },
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders the session view after an operation.
pub fn render_view(view: &SessionView, outcome: &CycleOutcome) -> String {
    let mut out = String::new();
    let header = if view.header.is_empty() {
        format!("[{}]", view.level.label())
    } else {
        format!("[{} | {}]", view.level.label(), view.header)
    };
    out.push_str(&header);
    out.push('\n');

    match (outcome, &view.card) {
        (CycleOutcome::Superseded, _) => out.push_str("(a newer request replaced this one)\n"),
        (_, Some(card)) if view.grading_enabled => {
            out.push_str(&render_card(card, false));
            if let Some(notice) = &view.message {
                out.push_str(&format!("! {notice}\n"));
            }
            out.push_str("Grade: 1) again  2) good  3) perfect   m) meaning\n");
        }
        _ => match view.phase.as_str() {
            "empty" => {
                let message = view.message.as_deref().unwrap_or("no card available");
                out.push_str(&format!("Nothing to study: {message}\n"));
                out.push_str("Press r to check again or l <level> to switch.\n");
            }
            "error" => {
                let message = view.message.as_deref().unwrap_or("something went wrong");
                out.push_str(&format!("Error: {message}\n"));
                out.push_str("Press r to retry.\n");
            }
            "idle" => out.push_str("Press r to start.\n"),
            phase => out.push_str(&format!("({phase})\n")),
        },
    }
    out
}

/// Renders a card; the meaning and Korean example only when `reveal` is set.
pub fn render_card(card: &Card, reveal: bool) -> String {
    let vocab = &card.vocab;
    let mut out = format!("\n  {}   (box {})\n", vocab.word, card.leitner_label());
    if let Some(example) = &vocab.example_en {
        out.push_str(&format!("  {}\n", markup::to_ansi(example)));
    }
    if reveal {
        out.push_str(&format!("  = {}\n", vocab.meaning));
        if let Some(example) = &vocab.example_kr {
            out.push_str(&format!("  {}\n", markup::to_ansi(example)));
        }
    }
    out.push('\n');
    out
}

/// Renders one line of the `status` subcommand.
pub fn render_status(status: &LevelStatus) -> String {
    let level = status
        .difficulty_level
        .parse::<voca_session::DifficultyLevel>()
        .map_or_else(|_| status.difficulty_level.clone(), |l| l.label().to_string());
    let gate = match (status.open_day(), status.next_day()) {
        (Some(day), _) => format!("Day {day} open"),
        (None, Some(day)) => format!("Day {day} pending"),
        (None, None) => "all days complete".to_string(),
    };
    let cycles = status.cycles_completed.unwrap_or(0);
    format!("{level:<6} {gate:<20} cycles completed: {cycles}")
}
