// Event entity
// One fact extracted from one log line

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::value_objects::{EventField, EventKind, GameSettings, LogSource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Full class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GameSettings>,
}

impl EventFields {
    pub fn game(name: &str) -> Self {
        Self {
            game: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn character(game: &str, character: &str) -> Self {
        Self {
            game: Some(game.to_string()),
            character: Some(character.to_string()),
            ..Self::default()
        }
    }

    pub fn with_account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }

    pub fn get(&self, field: EventField) -> Option<String> {
        match field {
            EventField::Game => self.game.clone(),
            EventField::Character => self.character.clone(),
            EventField::Account => self.account.clone(),
            EventField::Id => self.id.map(|id| id.to_string()),
            EventField::Level => self.level.map(|level| level.to_string()),
            EventField::Class => self.class.clone(),
            EventField::Ip => self.ip.clone(),
            EventField::Settings => self.settings.as_ref().map(GameSettings::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: NaiveDateTime,
    pub source: LogSource,
    pub kind: EventKind,
    pub fields: EventFields,
}

impl LogEvent {
    pub fn new(
        timestamp: NaiveDateTime,
        source: LogSource,
        kind: EventKind,
        fields: EventFields,
    ) -> Self {
        Self {
            timestamp,
            source,
            kind,
            fields,
        }
    }
}

/// An event whose timestamp is still the raw token from the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub source: LogSource,
    pub timestamp_token: String,
    pub kind: EventKind,
    pub fields: EventFields,
}

impl RawEvent {
    pub fn into_event(self, timestamp: NaiveDateTime) -> LogEvent {
        LogEvent::new(timestamp, self.source, self.kind, self.fields)
    }
}
