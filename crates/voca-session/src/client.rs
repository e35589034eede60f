//! Typed HTTP client for the scheduling backend.
//!
//! The backend owns Leitner scheduling, card selection and persistence. This
//! module only speaks its JSON API:
//!
//! - `GET /levels/status?user_id=` - Day-gating state of every level
//! - `POST /levels/day/open` - Open the next study day of a level
//! - `GET /cards/today?user_id=&difficulty_level=` - Next due card
//!   (or `GET /cards/next?user_id=&difficulty_level=&day=`)
//! - `POST /review` - Submit a grade for a card
//!
//! Failures carry the server's `{ "detail": ... }` message when one is sent.
//!
//! # Example
//!
//! ```no_run
//! use voca_session::{ApiClient, StudyBackend};
//!
//! # async fn example() -> voca_session::Result<()> {
//! let client = ApiClient::new("http://127.0.0.1:8000/voca/api")?;
//! let levels = client.level_statuses(1).await?;
//! println!("{} levels tracked", levels.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{CardEndpoint, Config};
use crate::error::{Result, VocaError};
use crate::model::{Card, DifficultyLevel, Grade, LevelStatus, LevelStatusList, ReviewAck};

// ============================================================================
// Backend Trait
// ============================================================================

/// The four backend operations a study session needs.
///
/// Implemented over HTTP by [`ApiClient`]; tests substitute in-memory fakes.
pub trait StudyBackend: Send + Sync {
    /// Fetches the day-gating state of every level for `user_id`.
    fn level_statuses(
        &self,
        user_id: u64,
    ) -> impl Future<Output = Result<Vec<LevelStatus>>> + Send;

    /// Opens `day` of `level` and returns the day the server opened.
    fn open_day(
        &self,
        user_id: u64,
        level: DifficultyLevel,
        day: u32,
    ) -> impl Future<Output = Result<u32>> + Send;

    /// Fetches the next due card of `day`.
    ///
    /// Returns `VocaError::NotFound` when no card is due.
    fn today_card(
        &self,
        user_id: u64,
        level: DifficultyLevel,
        day: u32,
    ) -> impl Future<Output = Result<Card>> + Send;

    /// Records `grade` for `vocab_id`.
    fn submit_review(
        &self,
        user_id: u64,
        vocab_id: u64,
        grade: Grade,
    ) -> impl Future<Output = Result<ReviewAck>> + Send;
}

impl<T: StudyBackend> StudyBackend for Arc<T> {
    fn level_statuses(
        &self,
        user_id: u64,
    ) -> impl Future<Output = Result<Vec<LevelStatus>>> + Send {
        (**self).level_statuses(user_id)
    }

    fn open_day(
        &self,
        user_id: u64,
        level: DifficultyLevel,
        day: u32,
    ) -> impl Future<Output = Result<u32>> + Send {
        (**self).open_day(user_id, level, day)
    }

    fn today_card(
        &self,
        user_id: u64,
        level: DifficultyLevel,
        day: u32,
    ) -> impl Future<Output = Result<Card>> + Send {
        (**self).today_card(user_id, level, day)
    }

    fn submit_review(
        &self,
        user_id: u64,
        vocab_id: u64,
        grade: Grade,
    ) -> impl Future<Output = Result<ReviewAck>> + Send {
        (**self).submit_review(user_id, vocab_id, grade)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /levels/day/open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDayRequest {
    /// The learner.
    pub user_id: u64,
    /// The level whose day is opened.
    pub difficulty_level: DifficultyLevel,
    /// The day to open.
    pub day: u32,
}

/// Response body for `POST /levels/day/open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDayResponse {
    /// The day the server opened.
    pub day: u32,
}

/// Request body for `POST /review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// The learner.
    pub user_id: u64,
    /// The graded vocabulary.
    pub vocab_id: u64,
    /// The grade, sent as `again`, `good` or `perfect`.
    pub grade: Grade,
}

/// Error body returned by the backend on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error. Validation failures send a structured
    /// value here instead of a string.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// The detail message, if the server sent a non-empty string.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP implementation of [`StudyBackend`].
///
/// Holds no session state; every call is independent and none is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    card_endpoint: CardEndpoint,
}

impl ApiClient {
    /// Creates a client for the API mounted at `base`.
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| VocaError::network(format!("HTTP client build failed: {e}")))?;
        Ok(Self::with_http(http, base))
    }

    /// Creates a client from configuration, applying its timeout and card
    /// endpoint.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| VocaError::network(format!("HTTP client build failed: {e}")))?;
        Ok(Self::with_http(http, config.api_base.clone()).with_card_endpoint(config.card_endpoint))
    }

    /// Creates a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim().trim_end_matches('/').to_string();
        Self {
            http,
            base,
            card_endpoint: CardEndpoint::default(),
        }
    }

    /// Selects the route used to fetch cards.
    #[must_use]
    pub fn with_card_endpoint(mut self, card_endpoint: CardEndpoint) -> Self {
        self.card_endpoint = card_endpoint;
        self
    }

    /// The normalised base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Maps a transport failure to a `Network` error.
    fn transport_error(path: &str, fallback: &str, error: &reqwest::Error) -> VocaError {
        warn!(path, error = %error, "Backend request failed");
        VocaError::network(format!("{fallback}: {error}"))
    }
}

/// Decodes a backend response.
///
/// A 2xx body is decoded as `T`. Otherwise the `detail` message (or
/// `fallback`) becomes the error; a 404 maps to `NotFound` only when
/// `not_found` supplies the message to use without a `detail`.
async fn read_json<T: DeserializeOwned>(
    response: Response,
    path: &str,
    fallback: &str,
    not_found: Option<&str>,
) -> Result<T> {
    let status = response.status();
    debug!(path, status = %status, "Backend responded");

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            warn!(path, error = %e, "Backend sent an undecodable body");
            VocaError::network(format!("invalid response body ({fallback}): {e}"))
        });
    }

    let detail = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.message());

    match (status, not_found) {
        (StatusCode::NOT_FOUND, Some(missing)) => {
            let message = detail.unwrap_or_else(|| missing.to_string());
            debug!(path, message = %message, "Backend reported nothing found");
            Err(VocaError::not_found(message))
        }
        _ => {
            let message = detail.unwrap_or_else(|| fallback.to_string());
            warn!(path, status = %status, message = %message, "Backend returned an error");
            Err(VocaError::network(message))
        }
    }
}

impl StudyBackend for ApiClient {
    #[instrument(level = "debug", skip(self))]
    async fn level_statuses(&self, user_id: u64) -> Result<Vec<LevelStatus>> {
        const PATH: &str = "/levels/status";
        const FALLBACK: &str = "failed to load level status";

        let response = self
            .http
            .get(self.url(PATH))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| Self::transport_error(PATH, FALLBACK, &e))?;

        let body: LevelStatusList = read_json(response, PATH, FALLBACK, None).await?;
        Ok(body.levels)
    }

    #[instrument(level = "debug", skip(self))]
    async fn open_day(&self, user_id: u64, level: DifficultyLevel, day: u32) -> Result<u32> {
        const PATH: &str = "/levels/day/open";
        const FALLBACK: &str = "failed to open day";

        let request = OpenDayRequest {
            user_id,
            difficulty_level: level,
            day,
        };
        let response = self
            .http
            .post(self.url(PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(PATH, FALLBACK, &e))?;

        let body: OpenDayResponse = read_json(response, PATH, FALLBACK, None).await?;
        Ok(body.day)
    }

    #[instrument(level = "debug", skip(self))]
    async fn today_card(&self, user_id: u64, level: DifficultyLevel, day: u32) -> Result<Card> {
        const FALLBACK: &str = "failed to load card";

        let path = self.card_endpoint.path();
        let mut query = vec![
            ("user_id", user_id.to_string()),
            ("difficulty_level", level.as_str().to_string()),
        ];
        if self.card_endpoint == CardEndpoint::Next {
            query.push(("day", day.to_string()));
        }

        let response = self
            .http
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .map_err(|e| Self::transport_error(path, FALLBACK, &e))?;

        let missing = format!("no vocabulary for Day {day}");
        read_json(response, path, FALLBACK, Some(&missing)).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn submit_review(&self, user_id: u64, vocab_id: u64, grade: Grade) -> Result<ReviewAck> {
        const PATH: &str = "/review";
        const FALLBACK: &str = "review failed";

        let request = ReviewRequest {
            user_id,
            vocab_id,
            grade,
        };
        let response = self
            .http
            .post(self.url(PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(PATH, FALLBACK, &e))?;

        read_json(response, PATH, FALLBACK, None).await
    }
}

// ============================================================================
// Tests
// ============================================================================
