use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use tracker_application::commands::run_poll_cycle;
use tracker_application::AppState;

/// Runs a poll cycle every `poll_interval_seconds`, starting immediately.
pub async fn schedule_polls(state: AppState) {
    let period = Duration::from_secs(state.config.poll_interval_seconds.max(1));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("polling logs every {}s", period.as_secs());

    loop {
        ticker.tick().await;
        if let Err(err) = run_poll_cycle(&state).await {
            error!("poll cycle failed: {}", err);
        }
    }
}
