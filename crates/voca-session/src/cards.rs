//! Card Feed and Review Submitter.

use tracing::{debug, info};

use crate::client::StudyBackend;
use crate::error::{Result, VocaError};
use crate::model::{Card, Grade, ReviewAck, SessionContext};

/// What the Card Feed found for an open day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodayCard {
    /// The next due card.
    Card(Card),
    /// Nothing is due. Rendered as an empty state, not an error.
    NoneDue {
        /// Why nothing is shown.
        message: String,
    },
}

/// Fetches the next due card of `day` for the context's user and level.
///
/// A missing card becomes [`TodayCard::NoneDue`]; every other failure is
/// returned as is.
pub async fn fetch_today_card<B: StudyBackend>(
    backend: &B,
    ctx: &SessionContext,
    day: u32,
) -> Result<TodayCard> {
    match backend.today_card(ctx.user.id, ctx.level, day).await {
        Ok(card) => {
            debug!(
                vocab_id = card.vocab_id(),
                word = %card.vocab.word,
                day,
                "Fetched card"
            );
            Ok(TodayCard::Card(card))
        }
        Err(VocaError::NotFound { message }) => {
            let message = if message.trim().is_empty() {
                format!("no vocabulary for Day {day}")
            } else {
                message
            };
            info!(day, level = %ctx.level, %message, "No card due");
            Ok(TodayCard::NoneDue { message })
        }
        Err(e) => Err(e),
    }
}

/// Records `grade` for `card`.
pub async fn submit_review<B: StudyBackend>(
    backend: &B,
    ctx: &SessionContext,
    card: &Card,
    grade: Grade,
) -> Result<ReviewAck> {
    let ack = backend
        .submit_review(ctx.user.id, card.vocab_id(), grade)
        .await?;
    info!(
        vocab_id = card.vocab_id(),
        %grade,
        leitner_level = ?ack.leitner_level,
        "Review recorded"
    );
    Ok(ack)
}
