//! The Study Session Controller.
//!
//! A [`StudySession`] sequences one cycle at a time:
//! Level Status Resolver -> Day Gate -> Card Feed, and after a graded card,
//! the Review Submitter followed by a fresh cycle. Every settled result is
//! applied through the [`SessionState`] reducer under the cycle's sequence
//! number, so results from a superseded cycle never reach the screen.
//!
//! Nothing here retries. A failed step leaves the session in `Error` (or
//! `Empty`) until the caller invokes [`StudySession::retry`].

use std::ops::ControlFlow;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cards::{fetch_today_card, submit_review, TodayCard};
use crate::client::StudyBackend;
use crate::day_gate::{Confirm, DayGate, GateOutcome, GateStep};
use crate::error::{Result, VocaError};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::levels::resolve_level_status;
use crate::model::{DifficultyLevel, Grade, SessionContext};
use crate::state::{Applied, Phase, SessionState, SessionView, Transition};

/// How a controller operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A card is shown.
    Ready,
    /// Nothing is due for the open day.
    Empty,
    /// The cycle (or submission) failed with this message.
    Failed(String),
    /// A newer cycle started before this one settled.
    Superseded,
    /// The request did not apply in the current phase; nothing happened.
    Ignored,
}

/// Drives study cycles for one learner.
///
/// Generic over the backend and the confirmation capability so tests can
/// substitute fakes. All methods take `&self`; concurrent calls are allowed
/// and the most recently started cycle wins.
#[derive(Debug)]
pub struct StudySession<B, C> {
    backend: B,
    confirmer: C,
    state: Mutex<SessionState>,
    events: EventBroadcaster,
}

impl<B: StudyBackend, C: Confirm> StudySession<B, C> {
    /// Creates an `Idle` session for `context`.
    pub fn new(backend: B, confirmer: C, context: SessionContext) -> Self {
        Self::with_events(backend, confirmer, context, EventBroadcaster::default())
    }

    /// Creates a session publishing on `events`.
    pub fn with_events(
        backend: B,
        confirmer: C,
        context: SessionContext,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            backend,
            confirmer,
            state: Mutex::new(SessionState::new(context)),
            events,
        }
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The backend this session talks to.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// A snapshot for rendering.
    pub fn view(&self) -> SessionView {
        self.lock().view()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase().clone()
    }

    /// The context new cycles run with.
    pub fn context(&self) -> SessionContext {
        self.lock().context().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // The state is only replaced wholesale by the reducer.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Switches the session to `level`.
    ///
    /// Any cycle in flight becomes stale and the session returns to `Idle`.
    /// Call [`advance`](Self::advance) to start studying the new level.
    pub fn change_level(&self, level: DifficultyLevel) {
        let mut state = self.lock();
        let previous = state.context().level;
        let seq = state.switch_level(level);
        info!(from = %previous, to = %level, seq, "Difficulty level changed");
        self.apply_locked(&mut state, seq, Transition::Reset);
    }

    /// Starts a fresh cycle: status, day gate, then the next card.
    ///
    /// The card on screen is dropped before any request is sent.
    pub async fn advance(&self) -> CycleOutcome {
        let (seq, ctx) = {
            let mut state = self.lock();
            let seq = state.begin_cycle();
            self.apply_locked(&mut state, seq, Transition::Begin);
            (seq, state.context().clone())
        };
        self.run_cycle(seq, &ctx).await
    }

    /// Re-runs the whole cycle. The only way out of `Error` and `Empty`.
    pub async fn retry(&self) -> CycleOutcome {
        info!("Retrying study cycle");
        self.advance().await
    }

    /// Grades the card on screen.
    ///
    /// Does nothing unless the session is `Ready`. On success a new cycle
    /// starts at once; on failure the same card stays on screen with the
    /// error as a notice so the grade can be resent.
    pub async fn submit(&self, grade: Grade) -> CycleOutcome {
        let (seq, ctx, card) = {
            let mut state = self.lock();
            let Some(card) = state.phase().card().cloned() else {
                debug!(%grade, phase = %state.phase(), "No card to grade");
                return CycleOutcome::Ignored;
            };
            let seq = state.seq();
            if let Err(e) = state.apply(seq, Transition::SubmitStarted(grade)) {
                debug!(%grade, error = %e, "Grade ignored");
                return CycleOutcome::Ignored;
            }
            self.publish(&state, seq, "submit_started");
            (seq, state.context().clone(), card)
        };

        match submit_review(&self.backend, &ctx, &card, grade).await {
            Ok(ack) => {
                self.events.send(SessionEvent::review_recorded(seq, ack));
                let next = {
                    let mut state = self.lock();
                    if state.seq() == seq {
                        let next = state.begin_cycle();
                        self.apply_locked(&mut state, next, Transition::Begin);
                        Some((next, state.context().clone()))
                    } else {
                        None
                    }
                };
                match next {
                    Some((next, ctx)) => self.run_cycle(next, &ctx).await,
                    None => CycleOutcome::Superseded,
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(vocab_id = card.vocab_id(), %grade, error = %message, "Review submission failed");
                if self.dispatch(seq, Transition::SubmitFailed {
                    message: message.clone(),
                }) {
                    CycleOutcome::Failed(message)
                } else {
                    CycleOutcome::Superseded
                }
            }
        }
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    async fn run_cycle(&self, seq: u64, ctx: &SessionContext) -> CycleOutcome {
        info!(seq, level = %ctx.level, user_id = ctx.user.id, "Starting study cycle");

        match self.cycle_steps(seq, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                match &e {
                    VocaError::UserDeclined { .. } | VocaError::CycleComplete { .. } => {
                        info!(seq, message = %message, "Study cycle stopped");
                    }
                    _ => warn!(seq, error = %message, "Study cycle failed"),
                }
                if self.dispatch(seq, Transition::Failed {
                    message: message.clone(),
                }) {
                    CycleOutcome::Failed(message)
                } else {
                    CycleOutcome::Superseded
                }
            }
        }
    }

    async fn cycle_steps(&self, seq: u64, ctx: &SessionContext) -> Result<CycleOutcome> {
        let status = resolve_level_status(&self.backend, ctx.user.id, ctx.level).await?;
        if !self.dispatch(seq, Transition::StatusResolved(status.clone())) {
            return Ok(CycleOutcome::Superseded);
        }

        let gate = DayGate::new(&self.backend, &self.confirmer);
        let outcome = gate
            .ensure_open(ctx, status, |step| {
                let transition = match step {
                    GateStep::AwaitingConfirmation { day } => {
                        Transition::ConfirmationRequested { day }
                    }
                    GateStep::OpeningDay { day } => Transition::OpeningDay { day },
                };
                if self.dispatch(seq, transition) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            })
            .await?;

        let GateOutcome::Open(open) = outcome else {
            return Ok(CycleOutcome::Superseded);
        };
        if !self.dispatch(seq, Transition::DayOpen {
            day: open.day,
            status: open.status,
        }) {
            return Ok(CycleOutcome::Superseded);
        }

        let (transition, outcome) = match fetch_today_card(&self.backend, ctx, open.day).await? {
            TodayCard::Card(card) => (Transition::CardLoaded(card), CycleOutcome::Ready),
            TodayCard::NoneDue { message } => (Transition::NoCardDue { message }, CycleOutcome::Empty),
        };
        if self.dispatch(seq, transition) {
            Ok(outcome)
        } else {
            Ok(CycleOutcome::Superseded)
        }
    }

    // ========================================================================
    // State Updates
    // ========================================================================

    /// Applies `transition` for cycle `seq`; returns `true` if it took effect.
    fn dispatch(&self, seq: u64, transition: Transition) -> bool {
        let mut state = self.lock();
        self.apply_locked(&mut state, seq, transition)
    }

    fn apply_locked(&self, state: &mut SessionState, seq: u64, transition: Transition) -> bool {
        let name = transition.name();
        let from = state.phase().name();
        match state.apply(seq, transition) {
            Ok(Applied::Changed) => {
                debug!(seq, transition = name, from, to = state.phase().name(), "Applied transition");
                self.publish(state, seq, name);
                true
            }
            Ok(Applied::Stale { current }) => {
                debug!(seq, current, transition = name, "Discarding result of superseded cycle");
                self.events
                    .send(SessionEvent::discarded(seq, current, name));
                false
            }
            Err(e) => {
                warn!(seq, error = %e, "Rejected transition");
                false
            }
        }
    }

    fn publish(&self, state: &SessionState, seq: u64, transition: &str) {
        self.events
            .send(SessionEvent::transition(seq, transition, state.view()));
    }
}

// ============================================================================
// Tests
// ============================================================================
