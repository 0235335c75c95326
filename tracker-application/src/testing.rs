// In-memory port fakes for poll-cycle tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracker_domain::ports::{HealthCheckService, LineSource, SnapshotSink};
use tracker_domain::services::{EventExtractor, IngestPipeline};
use tracker_domain::{CorrelatorConfig, GameRecord, LiveState, LogSource, RuntimeConfig};

use crate::{AppState, Metrics, TrackerState};

#[derive(Default)]
pub struct FakeLineSource {
    lines: StdMutex<HashMap<LogSource, Vec<String>>>,
    failing: StdMutex<HashSet<LogSource>>,
}

impl FakeLineSource {
    pub fn push(&self, source: LogSource, lines: &[&str]) {
        let mut guard = self.lines.lock().expect("lines lock");
        guard
            .entry(source)
            .or_default()
            .extend(lines.iter().map(|line| line.to_string()));
    }

    pub fn fail(&self, source: LogSource) {
        self.failing.lock().expect("failing lock").insert(source);
    }
}

#[async_trait]
impl LineSource for FakeLineSource {
    async fn read_new_lines(&self, source: LogSource) -> anyhow::Result<Vec<String>> {
        if self.failing.lock().expect("failing lock").contains(&source) {
            return Err(anyhow!("{source} log is missing"));
        }
        let mut guard = self.lines.lock().expect("lines lock");
        Ok(guard.remove(&source).unwrap_or_default())
    }

    fn sources(&self) -> Vec<LogSource> {
        LogSource::ALL.to_vec()
    }

    async fn ping(&self, _source: LogSource) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSink {
    live: StdMutex<Option<LiveState>>,
    history: StdMutex<Vec<GameRecord>>,
    failing: AtomicBool,
}

impl FakeSink {
    pub fn live(&self) -> Option<LiveState> {
        self.live.lock().expect("live lock").clone()
    }

    pub fn history(&self) -> Vec<GameRecord> {
        self.history.lock().expect("history lock").clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("sink unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for FakeSink {
    async fn write_live_state(&self, state: &LiveState) -> anyhow::Result<()> {
        self.check()?;
        *self.live.lock().expect("live lock") = Some(state.clone());
        Ok(())
    }

    async fn append_history(&self, records: &[GameRecord]) -> anyhow::Result<()> {
        self.check()?;
        self.history
            .lock()
            .expect("history lock")
            .extend_from_slice(records);
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> anyhow::Result<Vec<GameRecord>> {
        self.check()?;
        let history = self.history.lock().expect("history lock");
        Ok(history.iter().rev().take(limit).cloned().collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.check()
    }
}

pub struct FakeHealth;

#[async_trait]
impl HealthCheckService for FakeHealth {
    async fn check_sink(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn check_sources(&self) -> anyhow::Result<Vec<(LogSource, bool)>> {
        Ok(LogSource::ALL.iter().map(|source| (*source, true)).collect())
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        output_dir: "./output".to_string(),
        http_enabled: false,
        poll_interval_seconds: 30,
        request_timeout_seconds: 15,
        recent_games_count: 100,
        tail_lines: 1000,
        sources: Vec::new(),
    }
}

pub fn app_state(line_source: Arc<FakeLineSource>, sink: Arc<FakeSink>) -> AppState {
    let extractor = EventExtractor::with_defaults().expect("default patterns compile");
    let pipeline = IngestPipeline::new(
        extractor,
        &CorrelatorConfig {
            reference_year: 2025,
            latest_line_at: None,
            ghost_timeout_seconds: 21_600,
            min_history_duration_seconds: 30,
        },
    );
    AppState {
        config: runtime_config(),
        line_source,
        sink,
        health: Arc::new(FakeHealth),
        tracker: Arc::new(Mutex::new(TrackerState::new(pipeline))),
        metrics: Arc::new(Metrics::default()),
    }
}
