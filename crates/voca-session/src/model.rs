//! Domain types shared by the backend client and the session controller.
//!
//! Wire shapes follow the backend's JSON: snake_case field names, optional
//! fields defaulting to absent, and difficulty levels that may arrive as
//! either strings or integers.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// DifficultyLevel
// ============================================================================

/// A difficulty tier of the vocabulary set.
///
/// The wire form is the tier's score as a string (`"600"`, `"800"`, `"900"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DifficultyLevel {
    /// The 600-point tier.
    L600,
    /// The 800-point tier (default).
    #[default]
    L800,
    /// The 900-point tier.
    L900,
}

impl DifficultyLevel {
    /// All levels in ascending order.
    pub const ALL: [Self; 3] = [Self::L600, Self::L800, Self::L900];

    /// Returns the wire form of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L600 => "600",
            Self::L800 => "800",
            Self::L900 => "900",
        }
    }

    /// Returns a short label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::L600 => "600+",
            Self::L800 => "800+",
            Self::L900 => "900+",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s.trim() {
            "600" => Some(Self::L600),
            "800" => Some(Self::L800),
            "900" => Some(Self::L900),
            _ => None,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| {
            format!("invalid difficulty level '{s}': expected one of '600', '800', '900'")
        })
    }
}

impl Serialize for DifficultyLevel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DifficultyLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = StringOrNumber::deserialize(deserializer)?.into_string();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A JSON scalar that may be encoded as either a string or an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(i64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(StringOrNumber::deserialize(deserializer)?.into_string())
}

fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}

// ============================================================================
// User and SessionContext
// ============================================================================

/// The signed-in learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user id.
    pub id: u64,
    /// Display name.
    pub username: String,
}

impl User {
    /// Creates a new `User`.
    #[must_use]
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Who is studying and at which level.
///
/// Injected into the controller at construction and replaced wholesale on a
/// level change; a running cycle works from the copy it started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The learner.
    pub user: User,
    /// The selected difficulty level.
    pub level: DifficultyLevel,
}

impl SessionContext {
    /// Creates a new `SessionContext`.
    #[must_use]
    pub const fn new(user: User, level: DifficultyLevel) -> Self {
        Self { user, level }
    }
}

// ============================================================================
// LevelStatus
// ============================================================================

/// Day-gating state for one (user, level) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    /// The level this status describes, in wire form.
    #[serde(deserialize_with = "string_or_number")]
    pub difficulty_level: String,

    /// The day currently open for study, if any.
    #[serde(default)]
    pub open_day: Option<u32>,

    /// The day that would be opened next, if any.
    #[serde(default)]
    pub next_day: Option<u32>,

    /// How many full passes over the level have been completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles_completed: Option<u32>,
}

impl LevelStatus {
    /// Returns `true` if this status belongs to `level`.
    #[must_use]
    pub fn is_for(&self, level: DifficultyLevel) -> bool {
        self.difficulty_level.trim() == level.as_str()
    }

    /// The open day, treating day `0` as absent.
    #[must_use]
    pub fn open_day(&self) -> Option<u32> {
        self.open_day.filter(|day| *day > 0)
    }

    /// The next day, treating day `0` as absent.
    #[must_use]
    pub fn next_day(&self) -> Option<u32> {
        self.next_day.filter(|day| *day > 0)
    }

    /// Short header text: `Day N` when a day is open, `Next Day N` when one
    /// is pending, empty otherwise.
    #[must_use]
    pub fn header(&self) -> String {
        match (self.open_day(), self.next_day()) {
            (Some(day), _) => format!("Day {day}"),
            (None, Some(day)) => format!("Next Day {day}"),
            (None, None) => String::new(),
        }
    }
}

/// Response body of `GET /levels/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelStatusList {
    /// One entry per level the backend tracks for the user.
    #[serde(default)]
    pub levels: Vec<LevelStatus>,
}

// ============================================================================
// Vocab and Card
// ============================================================================

/// A vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocab {
    /// Backend vocabulary id.
    pub id: u64,
    /// The headword.
    pub word: String,
    /// Its meaning.
    pub meaning: String,
    /// English example sentence; may contain `**bold**` spans.
    #[serde(default)]
    pub example_en: Option<String>,
    /// Korean example sentence; may contain `**bold**` spans.
    #[serde(default)]
    pub example_kr: Option<String>,
    /// Level the entry belongs to, in wire form.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub difficulty_level: Option<String>,
    /// Day the entry is scheduled under.
    #[serde(default)]
    pub day: Option<u32>,
    /// Optional topic tag.
    #[serde(default)]
    pub topic: Option<String>,
}

/// A flashcard as served by the backend.
///
/// Immutable once displayed; the next fetch replaces it entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// The vocabulary on the card.
    pub vocab: Vocab,
    /// Leitner box; absent for a card never reviewed.
    #[serde(default)]
    pub leitner_level: Option<u32>,
    /// When the card is next due.
    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
    /// Whether the card has left the review rotation.
    #[serde(default)]
    pub is_mastered: Option<bool>,
}

impl Card {
    /// The id to grade this card under.
    #[must_use]
    pub const fn vocab_id(&self) -> u64 {
        self.vocab.id
    }

    /// Leitner box for display, `new` when the card was never reviewed.
    #[must_use]
    pub fn leitner_label(&self) -> String {
        self.leitner_level
            .map_or_else(|| "new".to_string(), |level| level.to_string())
    }
}

// ============================================================================
// Grade and ReviewAck
// ============================================================================

/// Self-assessed recall quality for a shown card.
///
/// Ordered by confidence: `Again < Good < Perfect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Not recalled.
    Again,
    /// Recalled with hesitation.
    Good,
    /// Recalled immediately.
    Perfect,
}

impl Grade {
    /// All grades in ascending order.
    pub const ALL: [Self; 3] = [Self::Again, Self::Good, Self::Perfect];

    /// Returns the wire form of this grade.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Good => "good",
            Self::Perfect => "perfect",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" | "1" => Ok(Self::Again),
            "good" | "2" => Ok(Self::Good),
            "perfect" | "3" => Ok(Self::Perfect),
            _ => Err(format!(
                "invalid grade '{s}': expected one of 'again', 'good', 'perfect'"
            )),
        }
    }
}

/// Response body of `POST /review`.
///
/// The session only relies on the request succeeding; the fields are kept
/// for logging and display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAck {
    /// The reviewing user.
    #[serde(default)]
    pub user_id: Option<u64>,
    /// The graded vocabulary.
    #[serde(default)]
    pub vocab_id: Option<u64>,
    /// The grade as recorded.
    #[serde(default)]
    pub grade: Option<Grade>,
    /// New Leitner box.
    #[serde(default)]
    pub leitner_level: Option<u32>,
    /// When the card is next due.
    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
    /// Whether the card is now mastered.
    #[serde(default)]
    pub is_mastered: Option<bool>,
    /// Server timestamp of the review.
    #[serde(default)]
    pub studied_at: Option<NaiveDateTime>,
}

// ============================================================================
// Tests
// ============================================================================
