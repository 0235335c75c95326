// Retention and eviction policy

use chrono::{Duration, NaiveDateTime};

use crate::entities::{CorrelatorConfig, Game};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryVerdict {
    Keep,
    NoParticipants,
    TooShort,
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    ghost_timeout: Duration,
    min_history_duration: Duration,
}

impl RetentionPolicy {
    pub fn new(ghost_timeout_seconds: i64, min_history_duration_seconds: i64) -> Self {
        Self {
            ghost_timeout: Duration::seconds(ghost_timeout_seconds),
            min_history_duration: Duration::seconds(min_history_duration_seconds),
        }
    }

    pub fn from_config(config: &CorrelatorConfig) -> Self {
        Self::new(
            config.ghost_timeout_seconds,
            config.min_history_duration_seconds,
        )
    }

    pub fn ghost_timeout(&self) -> Duration {
        self.ghost_timeout
    }

    /// `now` is the event watermark, never the wall clock.
    pub fn is_expired(&self, game: &Game, now: NaiveDateTime) -> bool {
        now - game.last_activity > self.ghost_timeout
    }

    pub fn ghost_closure_at(&self, game: &Game) -> NaiveDateTime {
        game.last_activity + self.ghost_timeout
    }

    /// Closure instant for a game displaced by a newer game with the same name.
    pub fn superseded_closure_at(&self, game: &Game, successor_created_at: NaiveDateTime) -> NaiveDateTime {
        self.ghost_closure_at(game)
            .min(successor_created_at)
            .max(game.created_at)
    }

    pub fn history_verdict(&self, game: &Game) -> HistoryVerdict {
        if game.participations.is_empty() {
            return HistoryVerdict::NoParticipants;
        }
        match game.destroyed_at {
            Some(destroyed_at) if destroyed_at - game.created_at < self.min_history_duration => {
                HistoryVerdict::TooShort
            }
            _ => HistoryVerdict::Keep,
        }
    }
}
