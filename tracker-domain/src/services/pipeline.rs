// Ingest pipeline
// Extract, normalize, merge and fold one batch of lines per source

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::entities::{
    CorrelatorConfig, DiagnosticsReport, GameRecord, LineDiagnostics, LiveState, LogEvent,
};
use crate::errors::{CorrelationIssue, TimestampError};
use crate::services::correlator::Correlator;
use crate::services::extractor::EventExtractor;
use crate::services::normalizer::TimestampNormalizer;
use crate::value_objects::LogSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBatch {
    pub source: LogSource,
    pub lines: Vec<String>,
}

impl SourceBatch {
    pub fn new(source: LogSource, lines: Vec<String>) -> Self {
        Self { source, lines }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub lines_read: usize,
    pub events_extracted: usize,
    pub unmatched_lines: usize,
    pub malformed: Vec<TimestampError>,
    pub issues: Vec<CorrelationIssue>,
    pub games_ghosted: usize,
    pub watermark: Option<NaiveDateTime>,
}

pub struct IngestPipeline {
    extractor: EventExtractor,
    normalizers: HashMap<LogSource, TimestampNormalizer>,
    correlator: Correlator,
    lines: LineDiagnostics,
}

impl IngestPipeline {
    pub fn new(extractor: EventExtractor, config: &CorrelatorConfig) -> Self {
        let normalizers = LogSource::ALL
            .iter()
            .map(|source| {
                let format = extractor
                    .grammar(*source)
                    .map(|grammar| grammar.format())
                    .unwrap_or_else(|| source.default_timestamp_format());
                let normalizer = TimestampNormalizer::new(format, config.reference_year)
                    .with_latest_line_at(config.latest_line_at);
                (*source, normalizer)
            })
            .collect();
        Self {
            extractor,
            normalizers,
            correlator: Correlator::new(config),
            lines: LineDiagnostics::default(),
        }
    }

    /// Folds every batch merged by timestamp. Games idle past the ghost timeout
    /// are evicted whenever an event advances the watermark, before that event
    /// is applied. Equal timestamps keep source order then line order.
    pub fn ingest(&mut self, mut batches: Vec<SourceBatch>) -> IngestOutcome {
        batches.sort_by_key(|batch| batch.source);

        let mut outcome = IngestOutcome::default();
        let mut events: Vec<LogEvent> = Vec::new();
        for batch in &batches {
            for line in &batch.lines {
                outcome.lines_read += 1;
                let Some(raw) = self.extractor.extract(batch.source, line) else {
                    outcome.unmatched_lines += 1;
                    continue;
                };
                let Some(normalizer) = self.normalizers.get_mut(&batch.source) else {
                    continue;
                };
                match normalizer.normalize(&raw.timestamp_token) {
                    Ok(timestamp) => {
                        outcome.events_extracted += 1;
                        events.push(raw.into_event(timestamp));
                    }
                    Err(error) => outcome.malformed.push(error),
                }
            }
        }
        events.sort_by_key(|event| event.timestamp);

        for event in &events {
            if self
                .correlator
                .watermark()
                .map_or(true, |watermark| event.timestamp > watermark)
            {
                outcome.games_ghosted += self.correlator.evict_expired(event.timestamp);
            }
            outcome.issues.extend(self.correlator.apply(event));
        }
        outcome.watermark = self.correlator.watermark();

        self.lines.lines_read += outcome.lines_read as u64;
        self.lines.unmatched_lines += outcome.unmatched_lines as u64;
        self.lines.malformed_timestamps += outcome.malformed.len() as u64;
        self.lines.events_extracted += outcome.events_extracted as u64;
        outcome
    }

    pub fn drain_completed(&mut self) -> Vec<GameRecord> {
        self.correlator.drain_completed()
    }

    pub fn live_state(&self) -> LiveState {
        self.correlator.live_state()
    }

    pub fn diagnostics(&self, pending_history: usize) -> DiagnosticsReport {
        DiagnosticsReport {
            lines: self.lines.clone(),
            correlation: self.correlator.diagnostics().clone(),
            open_games: self.correlator.open_game_count(),
            pending_history,
            watermark: self.correlator.watermark(),
        }
    }
}
