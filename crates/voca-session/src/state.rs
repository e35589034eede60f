//! Session state machine for the study controller.
//!
//! The controller never mutates [`SessionState`] directly. Every change goes
//! through [`SessionState::apply`], which checks the cycle sequence number
//! and the legality of the transition in the current phase:
//!
//! ```text
//! Idle -> ResolvingStatus -> (AwaitingConfirmation -> OpeningDay) -> FetchingCard
//!      -> Ready <-> Submitting -> ResolvingStatus ...
//! ResolvingStatus | AwaitingConfirmation | OpeningDay | FetchingCard -> Error
//! FetchingCard -> Empty
//! ```
//!
//! `Begin` and `Reset` are accepted from any phase; they open a new cycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VocaError};
use crate::model::{Card, DifficultyLevel, Grade, LevelStatus, SessionContext};

// ============================================================================
// Phase
// ============================================================================

/// Where the current cycle is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    /// No cycle has started for the current level.
    #[default]
    Idle,
    /// Fetching the level status.
    ResolvingStatus,
    /// Waiting for the learner to confirm opening `day`.
    AwaitingConfirmation {
        /// The day to be opened.
        day: u32,
    },
    /// Opening `day` on the backend.
    OpeningDay {
        /// The day being opened.
        day: u32,
    },
    /// Fetching the next card of `day`.
    FetchingCard {
        /// The open day.
        day: u32,
    },
    /// A card is shown and may be graded.
    Ready {
        /// The card on screen.
        card: Card,
        /// Why the previous submission of this card failed, if it did.
        notice: Option<String>,
    },
    /// A grade for `card` is in flight.
    Submitting {
        /// The card being graded.
        card: Card,
        /// The grade sent.
        grade: Grade,
    },
    /// Nothing is due for the open day.
    Empty {
        /// Why nothing is shown.
        message: String,
    },
    /// The cycle failed.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl Phase {
    /// Returns the phase name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingStatus => "resolving_status",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::OpeningDay { .. } => "opening_day",
            Self::FetchingCard { .. } => "fetching_card",
            Self::Ready { .. } => "ready",
            Self::Submitting { .. } => "submitting",
            Self::Empty { .. } => "empty",
            Self::Error { .. } => "error",
        }
    }

    /// Returns `true` if grading actions are enabled.
    ///
    /// Only `Ready` enables grading.
    ///
    /// # Examples
    ///
    /// ```
    /// use voca_session::Phase;
    ///
    /// assert!(!Phase::Idle.grading_enabled());
    /// assert!(!Phase::Empty { message: "nothing due".into() }.grading_enabled());
    /// ```
    #[must_use]
    pub const fn grading_enabled(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` while a backend call or a confirmation is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::ResolvingStatus
                | Self::AwaitingConfirmation { .. }
                | Self::OpeningDay { .. }
                | Self::FetchingCard { .. }
                | Self::Submitting { .. }
        )
    }

    /// The card on screen, if any.
    #[must_use]
    pub const fn card(&self) -> Option<&Card> {
        match self {
            Self::Ready { card, .. } | Self::Submitting { card, .. } => Some(card),
            _ => None,
        }
    }

    /// The message to show, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ready { notice, .. } => notice.as_deref(),
            Self::Empty { message } | Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// The day the cycle is working on, before a card is shown.
    #[must_use]
    pub const fn pending_day(&self) -> Option<u32> {
        match self {
            Self::AwaitingConfirmation { day }
            | Self::OpeningDay { day }
            | Self::FetchingCard { day } => Some(*day),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Transition
// ============================================================================

/// A settled step of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A new cycle starts; the current card is dropped.
    Begin,
    /// The level changed; everything is dropped.
    Reset,
    /// The level status arrived.
    ///
    /// Stores the status without leaving `ResolvingStatus`; the published
    /// view differs from the previous one only in its header.
    StatusResolved(LevelStatus),
    /// The learner is being asked to open `day`.
    ConfirmationRequested {
        /// The day to be opened.
        day: u32,
    },
    /// The learner accepted; `day` is being opened.
    OpeningDay {
        /// The day being opened.
        day: u32,
    },
    /// `day` is open; its card is being fetched.
    DayOpen {
        /// The open day.
        day: u32,
        /// The status the day was read from.
        status: LevelStatus,
    },
    /// The next card arrived.
    CardLoaded(Card),
    /// Nothing is due.
    NoCardDue {
        /// Why nothing is shown.
        message: String,
    },
    /// A cycle step failed.
    Failed {
        /// What went wrong.
        message: String,
    },
    /// A grade was sent for the shown card.
    SubmitStarted(Grade),
    /// The grade was rejected; the card stays.
    SubmitFailed {
        /// What went wrong.
        message: String,
    },
}

impl Transition {
    /// Returns the transition name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Reset => "reset",
            Self::StatusResolved(_) => "status_resolved",
            Self::ConfirmationRequested { .. } => "confirmation_requested",
            Self::OpeningDay { .. } => "opening_day",
            Self::DayOpen { .. } => "day_open",
            Self::CardLoaded(_) => "card_loaded",
            Self::NoCardDue { .. } => "no_card_due",
            Self::Failed { .. } => "failed",
            Self::SubmitStarted(_) => "submit_started",
            Self::SubmitFailed { .. } => "submit_failed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What [`SessionState::apply`] did with a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The state changed.
    Changed,
    /// The transition belonged to a superseded cycle and was dropped.
    Stale {
        /// The current cycle.
        current: u64,
    },
}

// ============================================================================
// SessionState
// ============================================================================

/// Process-local state of one study session.
///
/// Rebuilt on every level change; never persisted.
#[derive(Debug, Clone)]
pub struct SessionState {
    seq: u64,
    context: SessionContext,
    phase: Phase,
    status: Option<LevelStatus>,
    updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates an `Idle` state for `context`.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self {
            seq: 0,
            context,
            phase: Phase::Idle,
            status: None,
            updated_at: Utc::now(),
        }
    }

    /// The current cycle's sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// The context new cycles run with.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The latest level status seen for the current level.
    #[must_use]
    pub const fn status(&self) -> Option<&LevelStatus> {
        self.status.as_ref()
    }

    /// When the state last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Opens a new cycle and returns its sequence number.
    ///
    /// Results still in flight for earlier cycles become stale.
    pub fn begin_cycle(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Switches to `level`, opening a new cycle, and returns its sequence
    /// number.
    pub fn switch_level(&mut self, level: DifficultyLevel) -> u64 {
        self.context.level = level;
        self.begin_cycle()
    }

    /// Applies `transition` on behalf of cycle `seq`.
    ///
    /// # Errors
    ///
    /// - `Precondition` for a grade submitted while no card is shown.
    /// - `InvalidStateTransition` for any other transition that is illegal
    ///   in the current phase.
    ///
    /// In both cases the state is left unchanged.
    pub fn apply(&mut self, seq: u64, transition: Transition) -> Result<Applied> {
        if seq != self.seq {
            return Ok(Applied::Stale { current: self.seq });
        }

        let phase = std::mem::take(&mut self.phase);
        match Self::next_phase(phase, transition, &mut self.status) {
            Ok(next) => {
                self.phase = next;
                self.updated_at = Utc::now();
                Ok(Applied::Changed)
            }
            Err((previous, err)) => {
                self.phase = previous;
                Err(err)
            }
        }
    }

    #[allow(clippy::result_large_err)]
    fn next_phase(
        phase: Phase,
        transition: Transition,
        status: &mut Option<LevelStatus>,
    ) -> std::result::Result<Phase, (Phase, VocaError)> {
        use Transition as T;

        let next = match (phase, transition) {
            (_, T::Begin) => Phase::ResolvingStatus,
            (_, T::Reset) => {
                *status = None;
                Phase::Idle
            }
            (Phase::ResolvingStatus, T::StatusResolved(resolved)) => {
                *status = Some(resolved);
                Phase::ResolvingStatus
            }
            (Phase::ResolvingStatus, T::ConfirmationRequested { day }) => {
                Phase::AwaitingConfirmation { day }
            }
            (Phase::AwaitingConfirmation { day }, T::OpeningDay { day: opening })
                if day == opening =>
            {
                Phase::OpeningDay { day }
            }
            (Phase::ResolvingStatus | Phase::OpeningDay { .. }, T::DayOpen { day, status: open }) => {
                *status = Some(open);
                Phase::FetchingCard { day }
            }
            (Phase::FetchingCard { .. }, T::CardLoaded(card)) => Phase::Ready { card, notice: None },
            (Phase::FetchingCard { .. }, T::NoCardDue { message }) => Phase::Empty { message },
            (
                Phase::ResolvingStatus
                | Phase::AwaitingConfirmation { .. }
                | Phase::OpeningDay { .. }
                | Phase::FetchingCard { .. },
                T::Failed { message },
            ) => Phase::Error { message },
            (Phase::Ready { card, .. }, T::SubmitStarted(grade)) => Phase::Submitting { card, grade },
            (Phase::Submitting { card, .. }, T::SubmitFailed { message }) => Phase::Ready {
                card,
                notice: Some(message),
            },
            (phase, T::SubmitStarted(_)) => {
                let err = VocaError::precondition(format!("no card to grade while {phase}"));
                return Err((phase, err));
            }
            (phase, transition) => {
                let err = VocaError::invalid_transition(&phase, &transition);
                return Err((phase, err));
            }
        };
        Ok(next)
    }

    /// A serialisable snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            seq: self.seq,
            level: self.context.level,
            phase: self.phase.name().to_string(),
            grading_enabled: self.phase.grading_enabled(),
            pending: self.phase.is_pending(),
            card: self.phase.card().cloned(),
            header: self.status.as_ref().map(LevelStatus::header).unwrap_or_default(),
            day: self.phase.pending_day(),
            message: self.phase.message().map(str::to_string),
        }
    }
}

// ============================================================================
// SessionView
// ============================================================================

/// What a front end renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// The current cycle.
    pub seq: u64,
    /// The selected level.
    pub level: DifficultyLevel,
    /// Name of the current phase.
    pub phase: String,
    /// Whether grading controls are enabled.
    pub grading_enabled: bool,
    /// Whether a request or confirmation is outstanding.
    pub pending: bool,
    /// The card on screen.
    pub card: Option<Card>,
    /// `Day N`, `Next Day N`, or empty.
    ///
    /// Shows the last known status, so a new cycle keeps the previous
    /// cycle's header until its own status arrives.
    pub header: String,
    /// The day being confirmed, opened or fetched.
    pub day: Option<u32>,
    /// Notice, empty-state or error message.
    pub message: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
