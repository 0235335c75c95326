// Game settings value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Options reported by the game host, e.g. `exp,hell,hardcore,ladder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub expansion: bool,
    pub difficulty: Option<String>,
    pub hardcore: bool,
    pub ladder: bool,
}

impl GameSettings {
    /// Parses the comma list the host prints after a game id. Missing
    /// trailing parts read as classic defaults.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let first = parts.first().copied().filter(|part| !part.is_empty())?;
        let part = |index: usize| parts.get(index).copied().filter(|value| !value.is_empty());
        Some(Self {
            expansion: first.eq_ignore_ascii_case("exp"),
            difficulty: part(1).map(str::to_ascii_lowercase),
            hardcore: part(2).map_or(false, |mode| mode.eq_ignore_ascii_case("hardcore")),
            ladder: part(3).map_or(false, |ladder| ladder.eq_ignore_ascii_case("ladder")),
        })
    }
}

impl fmt::Display for GameSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            if self.expansion { "exp" } else { "classic" },
            self.difficulty.as_deref().unwrap_or("normal"),
            if self.hardcore { "hardcore" } else { "softcore" },
            if self.ladder { "ladder" } else { "nonladder" },
        )
    }
}

/// Full class name for the host's three-letter abbreviation.
pub fn character_class_name(abbreviation: &str) -> &str {
    match abbreviation {
        "Ama" => "Amazon",
        "Ass" => "Assassin",
        "Bar" => "Barbarian",
        "Dru" => "Druid",
        "Nec" => "Necromancer",
        "Pal" => "Paladin",
        "Sor" => "Sorceress",
        other => other,
    }
}
