use async_trait::async_trait;

use crate::entities::{GameRecord, LiveState};

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write_live_state(&self, state: &LiveState) -> anyhow::Result<()>;
    async fn append_history(&self, records: &[GameRecord]) -> anyhow::Result<()>;
    /// Newest first.
    async fn recent_history(&self, limit: usize) -> anyhow::Result<Vec<GameRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}
