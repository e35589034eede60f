//! Commands typed at the study prompt.

use voca_session::{DifficultyLevel, Grade};

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  1 | again      grade: not recalled
  2 | good       grade: recalled with hesitation
  3 | perfect    grade: recalled immediately
  m              show meaning and Korean example
  l <level>      switch level (600, 800, 900)
  r              retry the study cycle
  s              show session state as JSON
  h              show this help
  q              quit";

/// A parsed study-prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Grade the card on screen.
    Grade(Grade),
    /// Reveal the meaning of the card on screen.
    Reveal,
    /// Switch to another level.
    Level(DifficultyLevel),
    /// Run the cycle again.
    Retry,
    /// Print the session view.
    State,
    /// Print help.
    Help,
    /// Leave the study loop.
    Quit,
    /// Nothing typed.
    Empty,
    /// Not understood; carries the reason.
    Invalid(String),
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Self::Empty;
        };

        match head.to_lowercase().as_str() {
            "m" | "meaning" => Self::Reveal,
            "r" | "retry" => Self::Retry,
            "s" | "state" => Self::State,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            "l" | "level" => match words.next() {
                Some(level) => level
                    .parse::<DifficultyLevel>()
                    .map_or_else(Self::Invalid, Self::Level),
                None => Self::Invalid("usage: l <600|800|900>".to_string()),
            },
            _ => line
                .parse::<Grade>()
                .map_or_else(|_| Self::Invalid(format!("unknown command '{line}'")), Self::Grade),
        }
    }
}
