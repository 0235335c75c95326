use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;

use tracker_application::{AppState, Metrics, TrackerState};
use tracker_domain::services::{EventExtractor, IngestPipeline};
use tracker_infrastructure::{AppConfig, DefaultHealthService, FileLineSource, JsonFileSink};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let extractor = EventExtractor::build(&config.to_extractor_config())
            .context("failed to build event patterns")?;
        let pipeline = IngestPipeline::new(extractor, &config.to_correlator_config());

        let line_source = Arc::new(FileLineSource::new(
            runtime_config.sources.clone(),
            runtime_config.tail_lines,
        ));
        let sink = Arc::new(JsonFileSink::new(
            runtime_config.output_dir.clone(),
            runtime_config.recent_games_count,
        ));
        let health = Arc::new(DefaultHealthService::new(sink.clone(), line_source.clone()));

        for log in &runtime_config.sources {
            info!(source = %log.source, path = %log.path, "tracking log");
        }

        let state = AppState {
            config: runtime_config,
            line_source,
            sink,
            health,
            tracker: Arc::new(Mutex::new(TrackerState::new(pipeline))),
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
