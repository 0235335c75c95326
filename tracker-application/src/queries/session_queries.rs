use tracing::error;
use tracker_domain::{DiagnosticsReport, GameRecord, LiveState};

use crate::{AppError, AppState};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

pub async fn live_state(state: &AppState) -> Result<LiveState, AppError> {
    let tracker = state.tracker.lock().await;
    Ok(tracker.pipeline.live_state())
}

pub async fn recent_history(
    state: &AppState,
    limit: Option<usize>,
) -> Result<Vec<GameRecord>, AppError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }
    state.sink.recent_history(limit).await.map_err(|err| {
        error!("failed to read history: {:#}", err);
        AppError::Internal(err)
    })
}

pub async fn diagnostics(state: &AppState) -> Result<DiagnosticsReport, AppError> {
    let tracker = state.tracker.lock().await;
    Ok(tracker.pipeline.diagnostics(tracker.pending_history.len()))
}
