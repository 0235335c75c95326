use async_trait::async_trait;

use crate::value_objects::LogSource;

#[async_trait]
pub trait LineSource: Send + Sync {
    /// Complete lines appended since the previous call, oldest first.
    async fn read_new_lines(&self, source: LogSource) -> anyhow::Result<Vec<String>>;
    fn sources(&self) -> Vec<LogSource>;
    async fn ping(&self, source: LogSource) -> anyhow::Result<()>;
}
