use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use tracker_application::queries::session_queries;
use tracker_application::AppState;
use tracker_domain::{DiagnosticsReport, GameRecord, LiveState};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn live_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LiveState>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let live = session_queries::live_state(&state).await?;
    Ok(Json(live))
}

pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<GameRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let records = session_queries::recent_history(&state, query.limit).await?;
    Ok(Json(records))
}

pub async fn diagnostics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DiagnosticsReport>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let report = session_queries::diagnostics(&state).await?;
    Ok(Json(report))
}
