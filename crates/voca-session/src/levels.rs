//! Level status resolution.

use tracing::debug;

use crate::client::StudyBackend;
use crate::error::{Result, VocaError};
use crate::model::{DifficultyLevel, LevelStatus};

/// Fetches the day-gating state of `level` for `user_id`.
///
/// One request, no retries. A level missing from the server's list is
/// `NotFound`; transport and non-2xx failures surface as `Network`.
pub async fn resolve_level_status<B: StudyBackend>(
    backend: &B,
    user_id: u64,
    level: DifficultyLevel,
) -> Result<LevelStatus> {
    let levels = backend.level_statuses(user_id).await?;
    let status = levels
        .into_iter()
        .find(|status| status.is_for(level))
        .ok_or_else(|| VocaError::not_found("level status not found"))?;

    debug!(
        %level,
        open_day = ?status.open_day(),
        next_day = ?status.next_day(),
        "Resolved level status"
    );
    Ok(status)
}
