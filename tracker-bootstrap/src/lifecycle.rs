use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tracker_application::commands::run_poll_cycle;
use tracker_application::AppState;
use tracker_infrastructure::schedule_polls;
use tracker_interfaces_http::build_router;

use crate::context::AppContext;

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_standalone() -> Result<()> {
    let context = AppContext::new().await?;
    let state = context.state;

    let poller = tokio::spawn(schedule_polls(state.clone()));

    if state.config.http_enabled {
        let app = build_router_with_layers(state.clone());
        let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    poller.abort();
    info!("shutting down");
    Ok(())
}

/// Batch mode: one cycle, then exit.
pub async fn run_once() -> Result<()> {
    let context = AppContext::new().await?;
    run_cycle_once(&context.state).await
}

async fn run_cycle_once(state: &AppState) -> Result<()> {
    let report = run_poll_cycle(state).await?;
    info!(
        lines = report.lines_read,
        completed = report.games_completed,
        open = report.open_games,
        "single poll cycle complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_infrastructure::AppConfig;

    #[tokio::test]
    async fn single_cycle_writes_outputs_from_log_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let broker = dir.path().join("bnetd.log");
        let game = dir.path().join("d2cs.log");
        std::fs::write(
            &broker,
            "Dec 20 09:36:40 [info ] _client_charloginreq: [3] character Sorcy(*mike) ok\n",
        )
        .expect("write broker log");
        std::fs::write(
            &game,
            "Dec 20 09:36:44 [info ] d2cs_game_create: game baal-01 (pass ) created\n\
             Dec 20 09:36:50 [info ] game_add_character: added character Sorcy to game baal-01\n\
             Dec 20 09:39:50 [info ] game_del_character: removed character Sorcy from game baal-01\n\
             Dec 20 09:40:01 [info ] game_destroy: game baal-01 removed from game list\n",
        )
        .expect("write game log");

        let config = AppConfig {
            broker_log_path: broker.to_string_lossy().to_string(),
            game_log_path: game.to_string_lossy().to_string(),
            output_dir: dir.path().join("out").to_string_lossy().to_string(),
            reference_year: Some(2025),
            http_enabled: false,
            ..AppConfig::default()
        };
        let context = AppContext::from_config(&config).expect("context");
        run_cycle_once(&context.state).await.expect("cycle");

        let out = dir.path().join("out");
        assert!(out.join("live_state.json").exists());
        let history = std::fs::read_to_string(out.join("history.jsonl")).expect("history");
        assert_eq!(history.lines().count(), 1);
        assert!(history.contains("\"account\":\"mike\""));
        assert!(out.join("games").join("20251220093644000_baal-01.json").exists());
    }
}
