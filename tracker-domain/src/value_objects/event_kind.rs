// Event kind value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GameCreateRequested,
    GameCreated,
    GameStarted,
    CharacterJoined,
    CharacterLeft,
    AccountJoinedGame,
    CharacterLoginCorrelation,
    GameDestroyed,
}

/// A named capture an event pattern can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Game,
    Character,
    Account,
    Id,
    Level,
    Class,
    Ip,
    Settings,
}

impl EventField {
    pub fn capture_name(&self) -> &'static str {
        match self {
            EventField::Game => "game",
            EventField::Character => "character",
            EventField::Account => "account",
            EventField::Id => "id",
            EventField::Level => "level",
            EventField::Class => "class",
            EventField::Ip => "ip",
            EventField::Settings => "settings",
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GameCreateRequested => "game_create_requested",
            EventKind::GameCreated => "game_created",
            EventKind::GameStarted => "game_started",
            EventKind::CharacterJoined => "character_joined",
            EventKind::CharacterLeft => "character_left",
            EventKind::AccountJoinedGame => "account_joined_game",
            EventKind::CharacterLoginCorrelation => "character_login_correlation",
            EventKind::GameDestroyed => "game_destroyed",
        }
    }

    /// Captures a pattern for this kind must define.
    pub fn required_fields(&self) -> &'static [EventField] {
        match self {
            EventKind::GameCreateRequested
            | EventKind::GameCreated
            | EventKind::GameStarted
            | EventKind::GameDestroyed => &[EventField::Game],
            EventKind::CharacterJoined | EventKind::CharacterLeft => {
                &[EventField::Game, EventField::Character]
            }
            EventKind::AccountJoinedGame => &[EventField::Game, EventField::Account],
            EventKind::CharacterLoginCorrelation => &[EventField::Character, EventField::Account],
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capture_name())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
