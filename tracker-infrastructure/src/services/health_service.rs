use std::sync::Arc;

use async_trait::async_trait;
use tracker_domain::ports::{HealthCheckService, LineSource, SnapshotSink};
use tracker_domain::LogSource;

pub struct DefaultHealthService {
    sink: Arc<dyn SnapshotSink>,
    line_source: Arc<dyn LineSource>,
}

impl DefaultHealthService {
    pub fn new(sink: Arc<dyn SnapshotSink>, line_source: Arc<dyn LineSource>) -> Self {
        Self { sink, line_source }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_sink(&self) -> anyhow::Result<bool> {
        self.sink.ping().await.map(|_| true)
    }

    async fn check_sources(&self) -> anyhow::Result<Vec<(LogSource, bool)>> {
        let mut results = Vec::new();
        for source in self.line_source.sources() {
            results.push((source, self.line_source.ping(source).await.is_ok()));
        }
        Ok(results)
    }
}
