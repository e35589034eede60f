//! Configuration for the Voca study session.
//!
//! Holds the backend location and the externally persisted user/level
//! selection. The controller never reads this mid-cycle; front ends build a
//! [`SessionContext`](crate::SessionContext) from it once.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VocaError};
use crate::model::{DifficultyLevel, SessionContext, User};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "voca.json";

/// Default backend base URL; the API is mounted under `/voca/api`.
fn default_api_base() -> String {
    "http://127.0.0.1:8000/voca/api".to_string()
}

/// Default user id used before a login has been persisted.
const fn default_user_id() -> u64 {
    1
}

/// Default display name.
fn default_username() -> String {
    "learner".to_string()
}

/// Which backend route serves the next card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardEndpoint {
    /// `GET /cards/today?user_id=&difficulty_level=` (default).
    #[default]
    Today,
    /// `GET /cards/next?user_id=&difficulty_level=&day=`.
    Next,
}

impl CardEndpoint {
    /// Parses a string into a `CardEndpoint`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "next" => Some(Self::Next),
            _ => None,
        }
    }

    /// The route path relative to the API base.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Today => "/cards/today",
            Self::Next => "/cards/next",
        }
    }
}

impl std::str::FromStr for CardEndpoint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s)
            .ok_or_else(|| format!("invalid card endpoint '{s}': expected one of 'today', 'next'"))
    }
}

impl<'de> Deserialize<'de> for CardEndpoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for CardEndpoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Today => "today",
            Self::Next => "next",
        };
        serializer.serialize_str(s)
    }
}

/// Main configuration for a study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL every endpoint is mounted under.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Backend user id of the learner.
    #[serde(default = "default_user_id")]
    pub user_id: u64,

    /// Display name of the learner.
    #[serde(default = "default_username")]
    pub username: String,

    /// Selected difficulty level.
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,

    /// Route used to fetch the next card.
    #[serde(default)]
    pub card_endpoint: CardEndpoint,

    /// Per-request timeout in seconds. Unset means requests may hang.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_id: default_user_id(),
            username: default_username(),
            difficulty_level: DifficultyLevel::default(),
            card_endpoint: CardEndpoint::default(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `voca.json`; returns the default configuration when absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            VocaError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `voca.json` inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the (validated) default configuration.
    ///
    /// # Errors
    ///
    /// Returns `VocaError::ConfigParseError` if the file cannot be read or
    /// holds invalid JSON, and `VocaError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(VocaError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| VocaError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Persists `level` as the `difficultyLevel` of the file at `path`.
    ///
    /// Other keys in the file are kept as written, so CLI overrides never
    /// leak into it. A missing file is created holding only the level.
    ///
    /// # Errors
    ///
    /// Returns `VocaError::ConfigParseError` if the existing file is not a
    /// JSON object, and `VocaError::Io` if it cannot be read or written.
    pub fn save_level(path: &Path, level: DifficultyLevel) -> Result<()> {
        let mut document = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<serde_json::Value>(&contents)
                .map_err(|e| VocaError::config_parse(path, e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::json!({}),
            Err(e) => return Err(e.into()),
        };

        let Some(fields) = document.as_object_mut() else {
            return Err(VocaError::config_parse(path, "expected a JSON object"));
        };
        fields.insert(
            "difficultyLevel".to_string(),
            serde_json::Value::String(level.as_str().to_string()),
        );

        std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// - `apiBase` must be an `http://` or `https://` URL
    /// - `userId` must be greater than 0
    /// - `username` must not be empty
    /// - `requestTimeoutSecs`, when set, must be greater than 0
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base.trim();
        if base.is_empty() {
            return Err(VocaError::config_validation(
                "apiBase must not be empty",
                "Set apiBase in your voca.json, e.g. http://127.0.0.1:8000/voca/api",
            ));
        }

        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(VocaError::config_validation(
                format!("apiBase '{base}' is not an http(s) URL"),
                "Prefix apiBase with http:// or https://",
            ));
        }

        if self.user_id == 0 {
            return Err(VocaError::config_validation(
                "userId must be greater than 0",
                "Set userId to the id of a registered user in your voca.json",
            ));
        }

        if self.username.trim().is_empty() {
            return Err(VocaError::config_validation(
                "username must not be empty",
                "Set username in your voca.json",
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(VocaError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Remove requestTimeoutSecs to disable timeouts, or set it to at least 1",
            ));
        }

        Ok(())
    }

    /// Per-request timeout, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Builds the session context this configuration describes.
    #[must_use]
    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(
            User::new(self.user_id, self.username.clone()),
            self.difficulty_level,
        )
    }
}
