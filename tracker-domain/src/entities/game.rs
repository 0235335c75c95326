// Game and participation entities
// A game session reconstructed from log evidence

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::{EventFields, LogEvent};
use crate::utils::seconds_between;
use crate::value_objects::{EventKind, GameId, GameSettings, LogSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Requested,
    Created,
    Active,
    Destroyed,
    Ghosted,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Destroyed | GameState::Ghosted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameAnomaly {
    /// Closed because a newer game with the same name opened first.
    DuplicateOpen,
    /// At least one participation ended before it began.
    NegativeDuration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participation {
    pub character: String,
    pub account: Option<String>,
    pub joined_at: NaiveDateTime,
    pub left_at: Option<NaiveDateTime>,
    pub playtime_seconds: Option<i64>,
    pub anomalous: bool,
    pub level: Option<u32>,
    pub class: Option<String>,
    pub ip: Option<String>,
}

impl Participation {
    pub fn open(character: &str, account: Option<String>, joined_at: NaiveDateTime) -> Self {
        Self {
            character: character.to_string(),
            account,
            joined_at,
            left_at: None,
            playtime_seconds: None,
            anomalous: false,
            level: None,
            class: None,
            ip: None,
        }
    }

    /// Fills missing details from an event line. Level always takes the
    /// latest reported value.
    pub fn absorb(&mut self, fields: &EventFields) {
        if self.account.is_none() {
            self.account = fields.account.clone();
        }
        if self.class.is_none() {
            self.class = fields.class.clone();
        }
        if self.ip.is_none() {
            self.ip = fields.ip.clone();
        }
        if fields.level.is_some() {
            self.level = fields.level;
        }
    }

    pub fn is_open(&self) -> bool {
        self.left_at.is_none()
    }

    /// Closes the participation and returns the signed playtime in seconds.
    /// A leave before the join is kept as-is and flagged.
    pub fn close(&mut self, left_at: NaiveDateTime) -> i64 {
        if let Some(seconds) = self.playtime_seconds {
            return seconds;
        }
        let seconds = seconds_between(self.joined_at, left_at);
        self.left_at = Some(left_at);
        self.playtime_seconds = Some(seconds);
        self.anomalous = left_at < self.joined_at;
        seconds
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub name: String,
    pub state: GameState,
    pub created_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub destroyed_at: Option<NaiveDateTime>,
    pub ghosted: bool,
    pub last_activity: NaiveDateTime,
    pub participations: Vec<Participation>,
    pub sources: BTreeSet<LogSource>,
    pub accounts: BTreeSet<String>,
    pub evidence: BTreeSet<(LogSource, EventKind)>,
    pub anomalies: Vec<GameAnomaly>,
    /// Numeric id the game host assigned.
    pub host_id: Option<u64>,
    pub settings: Option<GameSettings>,
}

impl Game {
    /// Opens a game from a creation event.
    pub fn open(name: &str, event: &LogEvent) -> Self {
        let state = if event.kind == EventKind::GameCreated {
            GameState::Created
        } else {
            GameState::Requested
        };
        let mut game = Self {
            name: name.to_string(),
            state,
            created_at: event.timestamp,
            started_at: None,
            destroyed_at: None,
            ghosted: false,
            last_activity: event.timestamp,
            participations: Vec::new(),
            sources: BTreeSet::new(),
            accounts: BTreeSet::new(),
            evidence: BTreeSet::new(),
            anomalies: Vec::new(),
            host_id: None,
            settings: None,
        };
        game.absorb(&event.fields);
        game.touch(event);
        game.evidence.insert((event.source, event.kind));
        game
    }

    pub fn id(&self) -> GameId {
        GameId::new(self.name.clone(), self.created_at)
    }

    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn absorb(&mut self, fields: &EventFields) {
        if self.host_id.is_none() {
            self.host_id = fields.id;
        }
        if self.settings.is_none() {
            self.settings = fields.settings.clone();
        }
    }

    /// True when `fields` carries the host id this game already has.
    pub fn same_host_game(&self, fields: &EventFields) -> bool {
        matches!((self.host_id, fields.id), (Some(known), Some(id)) if known == id)
    }

    pub fn touch(&mut self, event: &LogEvent) {
        self.sources.insert(event.source);
        if event.timestamp > self.last_activity {
            self.last_activity = event.timestamp;
        }
    }

    pub fn open_participation_mut(&mut self, character: &str) -> Option<&mut Participation> {
        self.participations
            .iter_mut()
            .rev()
            .find(|p| p.is_open() && p.character == character)
    }

    pub fn lifetime_seconds(&self) -> Option<i64> {
        self.destroyed_at
            .map(|destroyed_at| seconds_between(self.created_at, destroyed_at))
    }

    pub fn flag(&mut self, anomaly: GameAnomaly) {
        if !self.anomalies.contains(&anomaly) {
            self.anomalies.push(anomaly);
        }
    }

    /// Terminal transition. Returns `(character, seconds)` for every
    /// participation this force-closed with a negative duration.
    pub fn close(&mut self, at: NaiveDateTime, ghosted: bool) -> Vec<(String, i64)> {
        if self.destroyed_at.is_some() {
            return Vec::new();
        }
        self.destroyed_at = Some(at);
        self.ghosted = ghosted;
        self.state = if ghosted {
            GameState::Ghosted
        } else {
            GameState::Destroyed
        };
        let mut negative = Vec::new();
        for participation in self.participations.iter_mut().filter(|p| p.is_open()) {
            let seconds = participation.close(at);
            if participation.anomalous {
                negative.push((participation.character.clone(), seconds));
            }
        }
        if !negative.is_empty() {
            self.flag(GameAnomaly::NegativeDuration);
        }
        negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EventFields;
    use chrono::{Duration, NaiveDate};

    fn at(seconds: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid instant")
            + Duration::seconds(seconds)
    }

    #[test]
    fn close_sets_destroyed_at_once() {
        let event = LogEvent::new(
            at(0),
            LogSource::GameServer,
            EventKind::GameCreated,
            EventFields::game("g1"),
        );
        let mut game = Game::open("g1", &event);
        game.close(at(10), false);
        game.close(at(99), true);
        assert_eq!(game.destroyed_at, Some(at(10)));
        assert_eq!(game.state, GameState::Destroyed);
        assert!(!game.ghosted);
    }

    #[test]
    fn participation_close_flags_negative_duration() {
        let mut participation = Participation::open("Alice", None, at(30));
        let seconds = participation.close(at(20));
        assert_eq!(seconds, -10);
        assert!(participation.anomalous);
        assert_eq!(participation.left_at, Some(at(20)));
    }

    #[test]
    fn participation_absorbs_missing_details_and_latest_level() {
        let mut participation = Participation::open("Sorcy", None, at(0));
        let enter = EventFields {
            account: Some("mike".to_string()),
            level: Some(91),
            class: Some("Sorceress".to_string()),
            ip: Some("10.0.0.5".to_string()),
            ..EventFields::character("g1", "Sorcy")
        };
        participation.absorb(&enter);
        let leave = EventFields {
            account: Some("other".to_string()),
            level: Some(92),
            ..EventFields::character("g1", "Sorcy")
        };
        participation.absorb(&leave);
        assert_eq!(participation.account.as_deref(), Some("mike"));
        assert_eq!(participation.level, Some(92));
        assert_eq!(participation.class.as_deref(), Some("Sorceress"));
        assert_eq!(participation.ip.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn game_keeps_first_host_id_and_settings() {
        let fields = EventFields {
            id: Some(17),
            settings: GameSettings::parse("exp,hell,softcore,ladder"),
            ..EventFields::game("g1")
        };
        let event = LogEvent::new(at(0), LogSource::GameHost, EventKind::GameCreated, fields);
        let mut game = Game::open("g1", &event);
        game.absorb(&EventFields {
            id: Some(18),
            ..EventFields::game("g1")
        });
        assert_eq!(game.host_id, Some(17));
        assert!(game.same_host_game(&event.fields));
        assert!(!game.same_host_game(&EventFields::game("g1")));
        assert_eq!(
            game.settings.as_ref().and_then(|s| s.difficulty.as_deref()),
            Some("hell")
        );
    }
}
