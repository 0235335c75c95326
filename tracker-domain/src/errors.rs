// Domain errors

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::value_objects::{EventField, EventKind, LogSource};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("malformed timestamp: {token:?}")]
    Malformed { token: String },
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid timestamp prefix for {origin}: {error}")]
    InvalidPrefix {
        origin: LogSource,
        #[source]
        error: regex::Error,
    },
    #[error("invalid {kind} pattern for {origin}: {error}")]
    Invalid {
        origin: LogSource,
        kind: EventKind,
        #[source]
        error: regex::Error,
    },
    #[error("{kind} pattern for {origin} is missing capture group `{capture}`")]
    MissingCapture {
        origin: LogSource,
        kind: EventKind,
        capture: &'static str,
    },
}

/// Non-fatal findings reported by the correlator while folding events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationIssue {
    #[error("game {name:?} created at {created_at} reopened before it was destroyed")]
    AnomalousDuplicateGame {
        name: String,
        created_at: NaiveDateTime,
    },
    #[error("{kind} for {game:?} has no open game")]
    OrphanEvent {
        kind: EventKind,
        game: String,
        character: Option<String>,
    },
    #[error("{character:?} in {game:?} left {seconds}s before joining")]
    NegativeDuration {
        game: String,
        character: String,
        seconds: i64,
    },
    #[error("{kind} event without `{field}`")]
    IncompleteEvent { kind: EventKind, field: EventField },
}
