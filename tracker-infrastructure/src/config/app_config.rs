use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use tracker_domain::{
    CorrelatorConfig, ExtractorConfig, LogSource, PatternConfig, RuntimeConfig, SourceLog,
    TimestampFormat, DEFAULT_GHOST_TIMEOUT_SECONDS, DEFAULT_MIN_HISTORY_DURATION_SECONDS,
};

use crate::config::validation::{validate_patterns, validate_positive, validate_reference_year};
use crate::utils::{current_year, latest_plausible_line_at, resolve_path};

pub const CONFIG_ENV: &str = "REALM_TRACKER_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub broker_log_path: String,
    pub game_log_path: String,
    pub host_log_path: Option<String>,
    pub output_dir: String,
    pub tail_lines: usize,
    pub poll_interval_seconds: u64,
    /// Unset means the current year, with lines dated after today moved back a year.
    pub reference_year: Option<i32>,
    pub ghost_timeout_seconds: i64,
    pub min_history_duration_seconds: i64,
    pub recent_games_count: usize,
    pub http_enabled: bool,
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub request_timeout_seconds: u64,
    pub timestamp_formats: HashMap<LogSource, TimestampFormat>,
    pub patterns: Vec<PatternConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            broker_log_path: "/usr/local/pvpgn/var/pvpgn/logs/bnetd.log".to_string(),
            game_log_path: "/usr/local/pvpgn/var/pvpgn/logs/d2cs.log".to_string(),
            host_log_path: None,
            output_dir: "./output".to_string(),
            tail_lines: 1000,
            poll_interval_seconds: 30,
            reference_year: None,
            ghost_timeout_seconds: DEFAULT_GHOST_TIMEOUT_SECONDS,
            min_history_duration_seconds: DEFAULT_MIN_HISTORY_DURATION_SECONDS,
            recent_games_count: 100,
            http_enabled: true,
            bind_addr: "127.0.0.1:3235".to_string(),
            api_token: None,
            request_timeout_seconds: 15,
            timestamp_formats: HashMap::new(),
            patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads from `REALM_TRACKER_CONFIG` (default `./config.toml`).
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path)).await
    }

    pub async fn load_from(file_path: &Path) -> Result<Self> {
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path)
                .await
                .with_context(|| format!("failed to read {}", file_path.display()))?;
            Self::from_toml_str(&content)?
        } else {
            warn!("config.toml not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config")
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(host_log_path) = &self.host_log_path {
            if host_log_path.trim().is_empty() {
                self.host_log_path = None;
            }
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.broker_log_path = resolve_path(base, &self.broker_log_path);
        self.game_log_path = resolve_path(base, &self.game_log_path);
        self.host_log_path = self
            .host_log_path
            .as_deref()
            .map(|path| resolve_path(base, path));
        self.output_dir = resolve_path(base, &self.output_dir);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.output_dir.trim().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        validate_positive("poll_interval_seconds", self.poll_interval_seconds as i64)?;
        validate_positive("ghost_timeout_seconds", self.ghost_timeout_seconds)?;
        validate_positive("tail_lines", self.tail_lines as i64)?;
        validate_positive("recent_games_count", self.recent_games_count as i64)?;
        validate_positive("request_timeout_seconds", self.request_timeout_seconds as i64)?;
        if self.min_history_duration_seconds < 0 {
            return Err(anyhow!("min_history_duration_seconds must not be negative"));
        }
        if let Some(year) = self.reference_year {
            validate_reference_year(year)?;
        }
        validate_patterns(&self.to_extractor_config())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let mut sources = vec![
            SourceLog {
                source: LogSource::Broker,
                path: self.broker_log_path.clone(),
            },
            SourceLog {
                source: LogSource::GameServer,
                path: self.game_log_path.clone(),
            },
        ];
        if let Some(path) = &self.host_log_path {
            sources.push(SourceLog {
                source: LogSource::GameHost,
                path: path.clone(),
            });
        }
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            output_dir: self.output_dir.clone(),
            http_enabled: self.http_enabled,
            poll_interval_seconds: self.poll_interval_seconds,
            request_timeout_seconds: self.request_timeout_seconds,
            recent_games_count: self.recent_games_count,
            tail_lines: self.tail_lines,
            sources,
        }
    }

    pub fn to_correlator_config(&self) -> CorrelatorConfig {
        let (reference_year, latest_line_at) = match self.reference_year {
            Some(year) => (year, None),
            None => (current_year(), Some(latest_plausible_line_at())),
        };
        CorrelatorConfig {
            reference_year,
            latest_line_at,
            ghost_timeout_seconds: self.ghost_timeout_seconds,
            min_history_duration_seconds: self.min_history_duration_seconds,
        }
    }

    pub fn to_extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timestamp_formats: self.timestamp_formats.clone(),
            patterns: self.patterns.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("REALM_TRACKER_BROKER_LOG_PATH") {
            self.broker_log_path = value;
        }
        if let Ok(value) = env::var("REALM_TRACKER_GAME_LOG_PATH") {
            self.game_log_path = value;
        }
        if let Ok(value) = env::var("REALM_TRACKER_HOST_LOG_PATH") {
            self.host_log_path = Some(value);
        }
        if let Ok(value) = env::var("REALM_TRACKER_OUTPUT_DIR") {
            self.output_dir = value;
        }
        if let Ok(value) = env::var("REALM_TRACKER_TAIL_LINES") {
            self.tail_lines = value.parse().unwrap_or(self.tail_lines);
        }
        if let Ok(value) = env::var("REALM_TRACKER_POLL_INTERVAL_SECONDS") {
            self.poll_interval_seconds = value.parse().unwrap_or(self.poll_interval_seconds);
        }
        if let Ok(value) = env::var("REALM_TRACKER_REFERENCE_YEAR") {
            self.reference_year = value.parse().ok().or(self.reference_year);
        }
        if let Ok(value) = env::var("REALM_TRACKER_GHOST_TIMEOUT_SECONDS") {
            self.ghost_timeout_seconds = value.parse().unwrap_or(self.ghost_timeout_seconds);
        }
        if let Ok(value) = env::var("REALM_TRACKER_MIN_HISTORY_DURATION_SECONDS") {
            self.min_history_duration_seconds =
                value.parse().unwrap_or(self.min_history_duration_seconds);
        }
        if let Ok(value) = env::var("REALM_TRACKER_RECENT_GAMES_COUNT") {
            self.recent_games_count = value.parse().unwrap_or(self.recent_games_count);
        }
        if let Ok(value) = env::var("REALM_TRACKER_HTTP_ENABLED") {
            self.http_enabled = value.parse().unwrap_or(self.http_enabled);
        }
        if let Ok(value) = env::var("REALM_TRACKER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("REALM_TRACKER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("REALM_TRACKER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}
