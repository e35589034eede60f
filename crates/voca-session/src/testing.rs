//! In-memory backend and confirmation fakes for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::client::StudyBackend;
use crate::day_gate::Confirm;
use crate::error::{Result, VocaError};
use crate::model::{Card, DifficultyLevel, Grade, LevelStatus, ReviewAck, Vocab};

/// Builds a level status.
pub fn status(level: &str, open_day: Option<u32>, next_day: Option<u32>) -> LevelStatus {
    LevelStatus {
        difficulty_level: level.to_string(),
        open_day,
        next_day,
        cycles_completed: None,
    }
}

/// Builds a card for `word` scheduled on `day`.
pub fn card(id: u64, word: &str, day: u32) -> Card {
    Card {
        vocab: Vocab {
            id,
            word: word.to_string(),
            meaning: format!("meaning of {word}"),
            example_en: Some(format!("Use **{word}** in a sentence.")),
            example_kr: None,
            difficulty_level: None,
            day: Some(day),
            topic: None,
        },
        leitner_level: Some(1),
        next_review_date: None,
        is_mastered: Some(false),
    }
}

/// Pauses a call until the test releases it.
#[derive(Debug, Clone, Default)]
pub struct Hold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    /// Resolves once the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the held call continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Every request the fake received.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub status_fetches: usize,
    pub opened_days: Vec<(DifficultyLevel, u32)>,
    pub card_fetches: Vec<(DifficultyLevel, u32)>,
    pub reviews: Vec<(u64, Grade)>,
}

#[derive(Debug, Default)]
struct FakeState {
    statuses: Vec<LevelStatus>,
    cards: HashMap<DifficultyLevel, VecDeque<Card>>,
    status_error: Option<String>,
    open_error: Option<String>,
    card_error: Option<String>,
    review_error: Option<String>,
    opened_day_override: Option<u32>,
    acknowledged_day_override: Option<u32>,
    keep_closed: bool,
    status_holds: HashMap<usize, Hold>,
    card_holds: HashMap<usize, Hold>,
    calls: Calls,
}

/// A scripted [`StudyBackend`].
///
/// Opening a day marks it open in the stored status unless
/// [`without_marking_open`](Self::without_marking_open) is set. Cards are
/// served from a per-level queue; a successful review pops the front card.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_status(self, status: LevelStatus) -> Self {
        self.edit(|s| s.statuses.push(status))
    }

    pub fn with_cards(self, level: DifficultyLevel, cards: impl IntoIterator<Item = Card>) -> Self {
        self.edit(|s| s.cards.entry(level).or_default().extend(cards))
    }

    pub fn failing_status(self, message: &str) -> Self {
        self.edit(|s| s.status_error = Some(message.to_string()))
    }

    pub fn failing_open(self, message: &str) -> Self {
        self.edit(|s| s.open_error = Some(message.to_string()))
    }

    pub fn failing_cards(self, message: &str) -> Self {
        self.edit(|s| s.card_error = Some(message.to_string()))
    }

    pub fn failing_review(self, message: &str) -> Self {
        self.edit(|s| s.review_error = Some(message.to_string()))
    }

    /// The open request acknowledges (and opens) `day` instead of the one
    /// requested.
    pub fn opening_day_as(self, day: u32) -> Self {
        self.edit(|s| s.opened_day_override = Some(day))
    }

    /// The open request answers `day` but opens the one requested.
    pub fn acknowledging_day_as(self, day: u32) -> Self {
        self.edit(|s| s.acknowledged_day_override = Some(day))
    }

    /// The open request succeeds but the stored status is left unchanged.
    pub fn without_marking_open(self) -> Self {
        self.edit(|s| s.keep_closed = true)
    }

    /// Clears every injected failure.
    pub fn recover(&self) {
        let mut s = self.state.lock().unwrap();
        s.status_error = None;
        s.open_error = None;
        s.card_error = None;
        s.review_error = None;
    }

    /// Holds the `n`th status fetch (1-based) until released.
    pub fn hold_status_fetch(&self, n: usize) -> Hold {
        let hold = Hold::default();
        self.state
            .lock()
            .unwrap()
            .status_holds
            .insert(n, hold.clone());
        hold
    }

    /// Holds the `n`th card fetch (1-based) until released.
    pub fn hold_card_fetch(&self, n: usize) -> Hold {
        let hold = Hold::default();
        self.state.lock().unwrap().card_holds.insert(n, hold.clone());
        hold
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }
}

impl StudyBackend for FakeBackend {
    async fn level_statuses(&self, _user_id: u64) -> Result<Vec<LevelStatus>> {
        let hold = {
            let mut s = self.state.lock().unwrap();
            s.calls.status_fetches += 1;
            let n = s.calls.status_fetches;
            s.status_holds.remove(&n)
        };
        if let Some(hold) = hold {
            hold.pass().await;
        }

        let s = self.state.lock().unwrap();
        match &s.status_error {
            Some(message) => Err(VocaError::network(message.clone())),
            None => Ok(s.statuses.clone()),
        }
    }

    async fn open_day(&self, _user_id: u64, level: DifficultyLevel, day: u32) -> Result<u32> {
        let mut s = self.state.lock().unwrap();
        s.calls.opened_days.push((level, day));
        if let Some(message) = &s.open_error {
            return Err(VocaError::network(message.clone()));
        }

        let opened = s.opened_day_override.unwrap_or(day);
        if !s.keep_closed {
            for status in s.statuses.iter_mut().filter(|st| st.is_for(level)) {
                status.open_day = Some(opened);
                status.next_day = None;
            }
        }
        Ok(s.acknowledged_day_override.unwrap_or(opened))
    }

    async fn today_card(&self, _user_id: u64, level: DifficultyLevel, day: u32) -> Result<Card> {
        let hold = {
            let mut s = self.state.lock().unwrap();
            s.calls.card_fetches.push((level, day));
            let n = s.calls.card_fetches.len();
            s.card_holds.remove(&n)
        };
        if let Some(hold) = hold {
            hold.pass().await;
        }

        let s = self.state.lock().unwrap();
        if let Some(message) = &s.card_error {
            return Err(VocaError::network(message.clone()));
        }
        s.cards
            .get(&level)
            .and_then(VecDeque::front)
            .cloned()
            .ok_or_else(|| VocaError::not_found(format!("no vocabulary for Day {day}")))
    }

    async fn submit_review(&self, user_id: u64, vocab_id: u64, grade: Grade) -> Result<ReviewAck> {
        let mut s = self.state.lock().unwrap();
        s.calls.reviews.push((vocab_id, grade));
        if let Some(message) = &s.review_error {
            return Err(VocaError::network(message.clone()));
        }

        for queue in s.cards.values_mut() {
            if queue.front().is_some_and(|c| c.vocab_id() == vocab_id) {
                queue.pop_front();
            }
        }
        Ok(ReviewAck {
            user_id: Some(user_id),
            vocab_id: Some(vocab_id),
            grade: Some(grade),
            ..ReviewAck::default()
        })
    }
}

/// A [`Confirm`] stub answering from a script and recording its prompts.
///
/// Answers `false` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
    hold: Mutex<Option<Hold>>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Holds the next confirmation until released.
    pub fn hold_next(&self) -> Hold {
        let hold = Hold::default();
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirm for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.pass().await;
        }
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}
