use std::sync::Arc;

use tokio::sync::Mutex;
use tracker_domain::ports::{HealthCheckService, LineSource, SnapshotSink};
use tracker_domain::services::IngestPipeline;
use tracker_domain::{GameRecord, RuntimeConfig};

use crate::Metrics;

/// Engine state guarded by one lock for the length of a poll cycle.
pub struct TrackerState {
    pub pipeline: IngestPipeline,
    /// Drained records the sink has not accepted yet.
    pub pending_history: Vec<GameRecord>,
}

impl TrackerState {
    pub fn new(pipeline: IngestPipeline) -> Self {
        Self {
            pipeline,
            pending_history: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub line_source: Arc<dyn LineSource>,
    pub sink: Arc<dyn SnapshotSink>,
    pub health: Arc<dyn HealthCheckService>,
    pub tracker: Arc<Mutex<TrackerState>>,
    pub metrics: Arc<Metrics>,
}
