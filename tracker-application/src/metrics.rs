use std::sync::atomic::{AtomicU64, Ordering};

use tracker_domain::services::IngestOutcome;
use tracker_domain::CorrelationIssue;

#[derive(Debug, Default)]
pub struct Metrics {
    poll_cycles: AtomicU64,
    poll_errors: AtomicU64,
    lines_read: AtomicU64,
    events_extracted: AtomicU64,
    unmatched_lines: AtomicU64,
    malformed_timestamps: AtomicU64,
    orphan_events: AtomicU64,
    duplicate_games: AtomicU64,
    games_completed: AtomicU64,
    games_ghosted: AtomicU64,
    history_written: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self, outcome: &IngestOutcome) {
        self.poll_cycles.fetch_add(1, Ordering::Relaxed);
        self.lines_read
            .fetch_add(outcome.lines_read as u64, Ordering::Relaxed);
        self.events_extracted
            .fetch_add(outcome.events_extracted as u64, Ordering::Relaxed);
        self.unmatched_lines
            .fetch_add(outcome.unmatched_lines as u64, Ordering::Relaxed);
        self.malformed_timestamps
            .fetch_add(outcome.malformed.len() as u64, Ordering::Relaxed);
        self.games_ghosted
            .fetch_add(outcome.games_ghosted as u64, Ordering::Relaxed);
        for issue in &outcome.issues {
            match issue {
                CorrelationIssue::OrphanEvent { .. } => {
                    self.orphan_events.fetch_add(1, Ordering::Relaxed);
                }
                CorrelationIssue::AnomalousDuplicateGame { .. } => {
                    self.duplicate_games.fetch_add(1, Ordering::Relaxed);
                    self.games_ghosted.fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            }
        }
    }

    pub fn record_completed(&self, count: usize) {
        self.games_completed
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_history_written(&self, count: usize) {
        self.history_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_cycles(&self) -> u64 {
        self.poll_cycles.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("realm_tracker_poll_cycles_total", &self.poll_cycles),
            ("realm_tracker_poll_errors_total", &self.poll_errors),
            ("realm_tracker_lines_read_total", &self.lines_read),
            ("realm_tracker_events_extracted_total", &self.events_extracted),
            ("realm_tracker_unmatched_lines_total", &self.unmatched_lines),
            ("realm_tracker_malformed_timestamps_total", &self.malformed_timestamps),
            ("realm_tracker_orphan_events_total", &self.orphan_events),
            ("realm_tracker_duplicate_games_total", &self.duplicate_games),
            ("realm_tracker_games_completed_total", &self.games_completed),
            ("realm_tracker_games_ghosted_total", &self.games_ghosted),
            ("realm_tracker_history_records_written_total", &self.history_written),
        ];

        let mut body = String::new();
        for (name, counter) in counters {
            body.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        body
    }
}
