use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use tracker_domain::ports::SnapshotSink;
use tracker_domain::{GameRecord, LiveState};

use crate::utils::write_atomic;

pub const LIVE_STATE_FILE: &str = "live_state.json";
pub const HISTORY_FILE: &str = "history.jsonl";
pub const RECENT_GAMES_FILE: &str = "recent_games.json";
pub const GAMES_DIR: &str = "games";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LiveDocument<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    state: &'a LiveState,
}

/// Writes the dashboard documents under one output directory.
pub struct JsonFileSink {
    output_dir: PathBuf,
    recent_games_count: usize,
    write_lock: Mutex<()>,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>, recent_games_count: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            recent_games_count,
            write_lock: Mutex::new(()),
        }
    }

    async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.output_dir.join(GAMES_DIR))
            .await
            .with_context(|| format!("failed to create {}", self.output_dir.display()))
    }

    async fn read_recent(&self) -> Result<Vec<GameRecord>> {
        let path = self.output_dir.join(RECENT_GAMES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read(&path).await?;
        match serde_json::from_slice(&content) {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!("ignoring unreadable {}: {}", path.display(), err);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl SnapshotSink for JsonFileSink {
    async fn write_live_state(&self, state: &LiveState) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_dirs().await?;
        let document = LiveDocument {
            generated_at: Utc::now(),
            state,
        };
        let body = serde_json::to_vec_pretty(&document)?;
        write_atomic(&self.output_dir.join(LIVE_STATE_FILE), &body).await
    }

    /// Writes per-game files, then `recent_games.json`, then appends to
    /// `history.jsonl`. A call that fails earlier leaves history untouched.
    async fn append_history(&self, records: &[GameRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        self.ensure_dirs().await?;

        for record in records {
            let path = self
                .output_dir
                .join(GAMES_DIR)
                .join(format!("{}.json", file_stem(&record.game_id)));
            write_atomic(&path, &serde_json::to_vec_pretty(record)?).await?;
        }

        let mut recent: Vec<GameRecord> = records.iter().rev().cloned().collect();
        recent.extend(
            self.read_recent()
                .await?
                .into_iter()
                .filter(|old| records.iter().all(|new| new.game_id != old.game_id)),
        );
        recent.truncate(self.recent_games_count);
        write_atomic(
            &self.output_dir.join(RECENT_GAMES_FILE),
            &serde_json::to_vec_pretty(&recent)?,
        )
        .await?;

        let mut lines = Vec::new();
        for record in records {
            serde_json::to_writer(&mut lines, record)?;
            lines.push(b'\n');
        }
        let history_path = self.output_dir.join(HISTORY_FILE);
        let mut history = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&history_path)
            .await
            .with_context(|| format!("failed to open {}", history_path.display()))?;
        history.write_all(&lines).await?;
        history.flush().await?;
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let path = self.output_dir.join(HISTORY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        let mut records = Vec::new();
        for line in content.lines().rev() {
            if records.len() >= limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GameRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => warn!("skipping unreadable history line: {}", err),
            }
        }
        Ok(records)
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_dirs().await?;
        let metadata = fs::metadata(&self.output_dir).await?;
        if metadata.permissions().readonly() {
            return Err(anyhow!("{} is read-only", self.output_dir.display()));
        }
        Ok(())
    }
}

fn file_stem(game_id: &str) -> String {
    game_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
