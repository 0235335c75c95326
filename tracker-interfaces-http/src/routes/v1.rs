use axum::Router;

use tracker_application::AppState;

use crate::handlers::{ops_handlers, session_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sessions/live",
            axum::routing::get(session_handlers::live_state),
        )
        .route(
            "/v1/sessions/history",
            axum::routing::get(session_handlers::history),
        )
        .route(
            "/v1/sessions/diagnostics",
            axum::routing::get(session_handlers::diagnostics),
        )
        .route("/v1/ops/poll", axum::routing::post(ops_handlers::trigger_poll))
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
