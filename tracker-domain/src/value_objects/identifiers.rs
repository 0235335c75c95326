// Identifier value objects

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identity of one reconstructed game.
///
/// Game names are recycled by players, so the name alone never identifies a
/// session; the creation instant disambiguates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId {
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl GameId {
    pub fn new(name: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            created_at,
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.created_at.format("%Y%m%d%H%M%S%3f"), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn game_id_includes_creation_instant() {
        let created_at = NaiveDate::from_ymd_opt(2025, 12, 20)
            .and_then(|d| d.and_hms_milli_opt(9, 36, 44, 120))
            .expect("valid instant");
        let id = GameId::new("baal-run", created_at);
        assert_eq!(id.to_string(), "20251220093644120_baal-run");
    }

    #[test]
    fn same_name_different_creation_is_distinct() {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid instant");
        let first = GameId::new("g1", base);
        let second = GameId::new("g1", base + chrono::Duration::seconds(20));
        assert_ne!(first, second);
        assert_ne!(first.to_string(), second.to_string());
    }
}
