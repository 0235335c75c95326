// Runtime configuration and cycle reports

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::value_objects::{EventKind, LogSource, TimestampFormat};

pub const DEFAULT_GHOST_TIMEOUT_SECONDS: i64 = 6 * 60 * 60;
pub const DEFAULT_MIN_HISTORY_DURATION_SECONDS: i64 = 30;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub output_dir: String,
    pub http_enabled: bool,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub recent_games_count: usize,
    pub tail_lines: usize,
    pub sources: Vec<SourceLog>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLog {
    pub source: LogSource,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatorConfig {
    pub reference_year: i32,
    /// When set, a source whose first line would be dated after this instant
    /// starts in the year before `reference_year`.
    pub latest_line_at: Option<NaiveDateTime>,
    pub ghost_timeout_seconds: i64,
    pub min_history_duration_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub source: LogSource,
    pub kind: EventKind,
    pub regex: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    pub timestamp_formats: HashMap<LogSource, TimestampFormat>,
    pub patterns: Vec<PatternConfig>,
}

impl ExtractorConfig {
    pub fn timestamp_format(&self, source: LogSource) -> TimestampFormat {
        self.timestamp_formats
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.default_timestamp_format())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollReport {
    pub lines_read: usize,
    pub events_applied: usize,
    pub games_completed: usize,
    pub games_ghosted: usize,
    pub history_written: usize,
    pub pending_history: usize,
    pub open_games: usize,
    pub skipped_sources: Vec<LogSource>,
    pub watermark: Option<NaiveDateTime>,
}
