//! Day gating: decide whether today's study day is open, must be opened
//! after the learner confirms, or cannot be opened because the level's day
//! sequence is exhausted.
//!
//! ```text
//! open_day set                 -> AlreadyOpen(open_day)     no side effects
//! open_day unset, next_day = N -> confirm("Start Day N?")  -> open_day(N) -> re-fetch status
//! both unset                   -> CycleComplete
//! ```

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::StudyBackend;
use crate::error::{Result, VocaError};
use crate::levels::resolve_level_status;
use crate::model::{LevelStatus, SessionContext};

// ============================================================================
// Confirmation Capability
// ============================================================================

/// Asks the learner a yes/no question.
///
/// The cycle waits on the answer; the rest of the application does not.
pub trait Confirm: Send + Sync {
    /// Shows `prompt` and resolves to `true` if the learner accepts.
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send;
}

impl<T: Confirm> Confirm for Arc<T> {
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send {
        (**self).confirm(prompt)
    }
}

/// A [`Confirm`] that always gives the same answer without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        debug!(prompt, answer = self.0, "Auto-answering confirmation");
        self.0
    }
}

/// The prompt shown before opening `day`.
#[must_use]
pub fn open_day_prompt(day: u32) -> String {
    format!("Start Day {day} today?")
}

// ============================================================================
// Gate Decision
// ============================================================================

/// What a level status requires before cards can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// A day is already open.
    AlreadyOpen(u32),
    /// The given day must be opened, after confirmation.
    NeedsOpening(u32),
    /// The level's day sequence is exhausted.
    Exhausted,
}

impl GateAction {
    /// Classifies a level status.
    ///
    /// An open day wins over a pending next day; an already-open day is
    /// never reopened.
    #[must_use]
    pub fn classify(status: &LevelStatus) -> Self {
        match (status.open_day(), status.next_day()) {
            (Some(day), _) => Self::AlreadyOpen(day),
            (None, Some(day)) => Self::NeedsOpening(day),
            (None, None) => Self::Exhausted,
        }
    }
}

/// Progress reported by [`DayGate::ensure_open`] before each suspension
/// point. Returning `ControlFlow::Break` from the observer abandons the gate
/// without further prompts or requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    /// About to ask the learner to open `day`.
    AwaitingConfirmation {
        /// The day to be opened.
        day: u32,
    },
    /// The learner accepted; about to open `day`.
    OpeningDay {
        /// The day being opened.
        day: u32,
    },
}

/// The open study day the cycle may fetch cards for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDay {
    /// The open day.
    pub day: u32,
    /// The level status the day was read from.
    pub status: LevelStatus,
    /// Whether this gate opened the day.
    pub opened: bool,
}

/// Result of running the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// A day is open.
    Open(OpenDay),
    /// The observer abandoned the gate.
    Interrupted,
}

// ============================================================================
// DayGate
// ============================================================================

/// Ensures a study day is open for a (user, level) pair.
#[derive(Debug)]
pub struct DayGate<'a, B, C> {
    backend: &'a B,
    confirmer: &'a C,
}

impl<'a, B: StudyBackend, C: Confirm> DayGate<'a, B, C> {
    /// Creates a gate over `backend` that asks `confirmer` before opening.
    #[must_use]
    pub const fn new(backend: &'a B, confirmer: &'a C) -> Self {
        Self { backend, confirmer }
    }

    /// Ensures a day is open, opening the next one if the learner agrees.
    ///
    /// After opening, the status is fetched again and its `open_day` is
    /// taken as authoritative. If the fresh status still shows no open day,
    /// the day acknowledged by the open request is used.
    ///
    /// # Errors
    ///
    /// - `UserDeclined` if the learner refuses; nothing is opened.
    /// - `CycleComplete` if the level has no day left to open.
    /// - Any backend error from the open request or the re-fetch.
    pub async fn ensure_open<F>(
        &self,
        ctx: &SessionContext,
        status: LevelStatus,
        mut observe: F,
    ) -> Result<GateOutcome>
    where
        F: FnMut(GateStep) -> ControlFlow<()> + Send,
    {
        let day = match GateAction::classify(&status) {
            GateAction::AlreadyOpen(day) => {
                debug!(day, level = %ctx.level, "Study day already open");
                return Ok(GateOutcome::Open(OpenDay {
                    day,
                    status,
                    opened: false,
                }));
            }
            GateAction::Exhausted => {
                info!(level = %ctx.level, "Every day of the level is complete");
                return Err(VocaError::cycle_complete(ctx.level));
            }
            GateAction::NeedsOpening(day) => day,
        };

        if observe(GateStep::AwaitingConfirmation { day }).is_break() {
            return Ok(GateOutcome::Interrupted);
        }

        if !self.confirmer.confirm(&open_day_prompt(day)).await {
            info!(day, level = %ctx.level, "Learner declined to open the day");
            return Err(VocaError::user_declined(day));
        }

        if observe(GateStep::OpeningDay { day }).is_break() {
            return Ok(GateOutcome::Interrupted);
        }

        let acknowledged = self.backend.open_day(ctx.user.id, ctx.level, day).await?;
        info!(day = acknowledged, level = %ctx.level, "Opened study day");

        let refreshed = resolve_level_status(self.backend, ctx.user.id, ctx.level).await?;
        let day = refreshed.open_day().unwrap_or_else(|| {
            warn!(
                acknowledged,
                level = %ctx.level,
                "Re-fetched status shows no open day; using the acknowledged day"
            );
            acknowledged
        });

        Ok(GateOutcome::Open(OpenDay {
            day,
            status: refreshed,
            opened: true,
        }))
    }
}
