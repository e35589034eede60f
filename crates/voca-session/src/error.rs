//! Error types for the Voca study session.
//!
//! This module defines the error hierarchy for every session operation:
//! backend calls, day gating, review submission, configuration loading and
//! state machine transitions.

use std::path::PathBuf;

use crate::model::DifficultyLevel;

/// A specialized `Result` type for Voca session operations.
pub type Result<T> = std::result::Result<T, VocaError>;

/// Errors that can occur while running a study session.
///
/// The first five variants form the taxonomy the controller renders to the
/// user. The rest cover configuration and internal bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum VocaError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Transport failure or a non-2xx response from the backend.
    ///
    /// Carries the server's `detail` message when one was provided, otherwise
    /// an operation-specific fallback.
    #[error("{message}")]
    Network {
        /// Human-readable description of the failure.
        message: String,
    },

    /// The requested level or card has no server-side record.
    #[error("{message}")]
    NotFound {
        /// Human-readable description of what is missing.
        message: String,
    },

    // ========================================================================
    // Day Gating Errors
    // ========================================================================
    /// The learner declined to open the next study day.
    #[error("Day {day} was not started today. Use a reminder or return to the dashboard.")]
    UserDeclined {
        /// The day the learner was asked to open.
        day: u32,
    },

    /// Every day of the level's sequence has been studied.
    #[error("All days of level {level} are complete (cycle completion must be confirmed)")]
    CycleComplete {
        /// The exhausted level.
        level: DifficultyLevel,
    },

    // ========================================================================
    // Contract Errors
    // ========================================================================
    /// An operation was attempted without its required session state.
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Which precondition was violated.
        message: String,
    },

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current phase.
        from: String,
        /// The attempted transition.
        to: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your voca.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VocaError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `UserDeclined` error for the given day.
    #[must_use]
    pub const fn user_declined(day: u32) -> Self {
        Self::UserDeclined { day }
    }

    /// Creates a new `CycleComplete` error for the given level.
    #[must_use]
    pub const fn cycle_complete(level: DifficultyLevel) -> Self {
        Self::CycleComplete { level }
    }

    /// Creates a new `Precondition` error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns `true` for a missing record, which some callers render as an
    /// empty state rather than an error banner.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if retrying the cycle cannot succeed until something
    /// outside the session changes.
    ///
    /// The controller never retries on its own; this only tells a front end
    /// whether offering a retry button makes sense.
    #[must_use]
    pub const fn is_terminal_for_level(&self) -> bool {
        matches!(self, Self::CycleComplete { .. })
    }
}
