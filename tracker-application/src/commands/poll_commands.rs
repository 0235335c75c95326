use tracing::{debug, info, warn};
use tracker_domain::services::{IngestOutcome, SourceBatch};
use tracker_domain::{CorrelationIssue, PollReport};

use crate::{AppError, AppState};

/// Reads new lines from every source, folds them, and flushes live state and
/// completed games to the sink. Cycles are serialized on the tracker lock.
pub async fn run_poll_cycle(state: &AppState) -> Result<PollReport, AppError> {
    let mut tracker = state.tracker.lock().await;
    let mut report = PollReport::default();

    let mut batches = Vec::new();
    for source in state.line_source.sources() {
        match state.line_source.read_new_lines(source).await {
            Ok(lines) => batches.push(SourceBatch::new(source, lines)),
            Err(err) => {
                warn!(%source, "skipping log source this cycle: {:#}", err);
                report.skipped_sources.push(source);
            }
        }
    }

    let outcome = tracker.pipeline.ingest(batches);
    log_outcome(&outcome);
    state.metrics.record_ingest(&outcome);

    let completed = tracker.pipeline.drain_completed();
    state.metrics.record_completed(completed.len());
    report.games_completed = completed.len();
    tracker.pending_history.extend(completed);

    if !tracker.pending_history.is_empty() {
        if let Err(err) = state.sink.append_history(&tracker.pending_history).await {
            state.metrics.record_poll_error();
            warn!(
                pending = tracker.pending_history.len(),
                "failed to append history, keeping records for next cycle: {:#}", err
            );
            return Err(AppError::Internal(err));
        }
        report.history_written = tracker.pending_history.len();
        state.metrics.record_history_written(report.history_written);
        tracker.pending_history.clear();
    }

    let live = tracker.pipeline.live_state();
    if let Err(err) = state.sink.write_live_state(&live).await {
        state.metrics.record_poll_error();
        warn!("failed to write live state: {:#}", err);
        return Err(AppError::Internal(err));
    }

    report.lines_read = outcome.lines_read;
    report.events_applied = outcome.events_extracted;
    report.games_ghosted = outcome.games_ghosted
        + outcome
            .issues
            .iter()
            .filter(|issue| matches!(issue, CorrelationIssue::AnomalousDuplicateGame { .. }))
            .count();
    report.pending_history = tracker.pending_history.len();
    report.open_games = live.open_games.len();
    report.watermark = outcome.watermark;

    info!(
        lines = report.lines_read,
        events = report.events_applied,
        completed = report.games_completed,
        ghosted = report.games_ghosted,
        open = report.open_games,
        "poll cycle finished"
    );
    Ok(report)
}

fn log_outcome(outcome: &IngestOutcome) {
    if outcome.unmatched_lines > 0 {
        debug!(count = outcome.unmatched_lines, "unmatched log lines");
    }
    for error in &outcome.malformed {
        debug!("dropped line: {}", error);
    }
    for issue in &outcome.issues {
        match issue {
            CorrelationIssue::AnomalousDuplicateGame { .. }
            | CorrelationIssue::NegativeDuration { .. } => warn!("{}", issue),
            CorrelationIssue::OrphanEvent { .. } | CorrelationIssue::IncompleteEvent { .. } => {
                debug!("{}", issue)
            }
        }
    }
}
