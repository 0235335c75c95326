use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::{error, warn};

use tracker_application::commands::run_poll_cycle;
use tracker_application::AppState;
use tracker_domain::PollReport;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    match timeout(timeout_duration, state.health.check_sink()).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => return StatusCode::SERVICE_UNAVAILABLE,
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    if let Ok(Ok(sources)) = timeout(timeout_duration, state.health.check_sources()).await {
        for (source, ok) in sources {
            if !ok {
                warn!(%source, "log source not readable");
            }
        }
    }
    StatusCode::OK
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}

pub async fn trigger_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PollReport>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let report = run_poll_cycle(&state).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liveness_is_always_ok() {
        assert_eq!(health_live().await, StatusCode::OK);
    }
}
