// Log source value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which log stream a line was read from.
///
/// Variant order is the tie-break order for lines with equal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// Connection broker (`bnetd.log`).
    Broker,
    /// Game-session coordinator (`d2cs.log`).
    GameServer,
    /// Game host (`d2gs.log`).
    GameHost,
}

impl LogSource {
    pub const ALL: [LogSource; 3] = [LogSource::Broker, LogSource::GameServer, LogSource::GameHost];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Broker => "broker",
            LogSource::GameServer => "game_server",
            LogSource::GameHost => "game_host",
        }
    }

    pub fn default_timestamp_format(&self) -> super::TimestampFormat {
        match self {
            LogSource::Broker | LogSource::GameServer => super::TimestampFormat::Syslog,
            LogSource::GameHost => super::TimestampFormat::SlashMillis,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
