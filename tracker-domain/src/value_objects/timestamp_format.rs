// Timestamp grammar value object

use serde::{Deserialize, Serialize};

/// Partial, year-less timestamp grammars found at the start of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `Dec 20 09:36:44` (day may be space padded).
    Syslog,
    /// `12/20 09:36:44.123` (fraction optional).
    SlashMillis,
}

impl TimestampFormat {
    /// Anchored pattern cutting the timestamp token off the front of a line.
    pub fn prefix_pattern(&self) -> &'static str {
        match self {
            TimestampFormat::Syslog => r"^\s*(?P<ts>[A-Za-z]{3}\s+\d{1,2}\s+\d{1,2}:\d{2}:\d{2})",
            TimestampFormat::SlashMillis => {
                r"^\s*(?P<ts>\d{1,2}/\d{1,2}\s+\d{1,2}:\d{2}:\d{2}(?:\.\d{1,6})?)"
            }
        }
    }
}
