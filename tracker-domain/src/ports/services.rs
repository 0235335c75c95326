use async_trait::async_trait;

use crate::value_objects::LogSource;

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_sink(&self) -> anyhow::Result<bool>;
    async fn check_sources(&self) -> anyhow::Result<Vec<(LogSource, bool)>>;
}
