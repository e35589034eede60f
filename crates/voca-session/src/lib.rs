//! Voca Study Session
//!
//! Flashcard study cycles against the Voca scheduling backend: level status,
//! day gating with learner confirmation, card fetching, review submission,
//! and the controller that sequences them.

pub mod cards;
pub mod client;
pub mod config;
pub mod day_gate;
pub mod error;
pub mod events;
pub mod levels;
pub mod model;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use cards::{fetch_today_card, submit_review, TodayCard};
pub use client::{ApiClient, ErrorResponse, OpenDayRequest, OpenDayResponse, ReviewRequest, StudyBackend};
pub use config::{CardEndpoint, Config, CONFIG_FILE_NAME};
pub use day_gate::{open_day_prompt, AutoConfirm, Confirm, DayGate, GateAction, GateOutcome, GateStep, OpenDay};
pub use error::{Result, VocaError};
pub use events::{EventBroadcaster, SessionEvent};
pub use levels::resolve_level_status;
pub use model::{
    Card, DifficultyLevel, Grade, LevelStatus, LevelStatusList, ReviewAck, SessionContext, User,
    Vocab,
};
pub use session::{CycleOutcome, StudySession};
pub use state::{Applied, Phase, SessionState, SessionView, Transition};
