// Snapshot entities
// Serializable views of games handed to the sink and the HTTP layer

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::{Game, GameAnomaly, GameState, Participation};
use crate::value_objects::{GameSettings, LogSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub character: String,
    pub account: Option<String>,
    pub joined_at: NaiveDateTime,
    pub left_at: Option<NaiveDateTime>,
    pub playtime_seconds: Option<i64>,
    pub anomalous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl ParticipationRecord {
    fn from_participation(
        participation: &Participation,
        account_index: &HashMap<String, String>,
    ) -> Self {
        Self {
            character: participation.character.clone(),
            account: participation
                .account
                .clone()
                .or_else(|| account_index.get(&participation.character).cloned()),
            joined_at: participation.joined_at,
            left_at: participation.left_at,
            playtime_seconds: participation.playtime_seconds,
            anomalous: participation.anomalous,
            level: participation.level,
            class: participation.class.clone(),
            ip: participation.ip.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: String,
    pub name: String,
    pub state: GameState,
    pub created_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub destroyed_at: Option<NaiveDateTime>,
    pub ghosted: bool,
    pub duration_seconds: Option<i64>,
    pub sources: Vec<LogSource>,
    pub accounts: Vec<String>,
    pub anomalies: Vec<GameAnomaly>,
    pub players: Vec<ParticipationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_game_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GameSettings>,
}

impl GameRecord {
    /// Builds a record, resolving missing accounts from the login side table.
    pub fn from_game(game: &Game, account_index: &HashMap<String, String>) -> Self {
        let players: Vec<ParticipationRecord> = game
            .participations
            .iter()
            .map(|p| ParticipationRecord::from_participation(p, account_index))
            .collect();
        let mut accounts = game.accounts.clone();
        accounts.extend(players.iter().filter_map(|p| p.account.clone()));
        Self {
            game_id: game.id().to_string(),
            name: game.name.clone(),
            state: game.state,
            created_at: game.created_at,
            started_at: game.started_at,
            destroyed_at: game.destroyed_at,
            ghosted: game.ghosted,
            duration_seconds: game.lifetime_seconds(),
            sources: game.sources.iter().copied().collect(),
            accounts: accounts.into_iter().collect(),
            anomalies: game.anomalies.clone(),
            players,
            host_game_id: game.host_id,
            settings: game.settings.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenParticipation {
    pub game_id: String,
    pub game_name: String,
    pub character: String,
    pub account: Option<String>,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub watermark: Option<NaiveDateTime>,
    pub open_games: Vec<GameRecord>,
    pub open_participations: Vec<OpenParticipation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDiagnostics {
    pub lines_read: u64,
    pub unmatched_lines: u64,
    pub malformed_timestamps: u64,
    pub events_extracted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationDiagnostics {
    pub events_applied: u64,
    pub orphan_events: u64,
    pub duplicate_games: u64,
    pub duplicate_joins: u64,
    pub duplicate_closures: u64,
    pub negative_durations: u64,
    pub incomplete_events: u64,
    pub games_destroyed: u64,
    pub games_ghosted: u64,
    pub history_excluded_empty: u64,
    pub history_excluded_short: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub lines: LineDiagnostics,
    pub correlation: CorrelationDiagnostics,
    pub open_games: usize,
    pub pending_history: usize,
    pub watermark: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EventFields, LogEvent};
    use crate::value_objects::EventKind;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn game_record_serializes_with_camel_case_keys() {
        let created = NaiveDate::from_ymd_opt(2025, 12, 20)
            .and_then(|d| d.and_hms_milli_opt(9, 36, 44, 120))
            .expect("valid instant");
        let event = LogEvent::new(
            created,
            LogSource::GameServer,
            EventKind::GameCreated,
            EventFields::game("baal-run"),
        );
        let mut game = Game::open("baal-run", &event);
        game.participations
            .push(Participation::open("Sorcy", None, created + Duration::seconds(5)));
        game.close(created + Duration::seconds(65), false);

        let mut index = HashMap::new();
        index.insert("Sorcy".to_string(), "mike".to_string());
        let record = GameRecord::from_game(&game, &index);
        let value = serde_json::to_value(&record).expect("serialize");

        assert_eq!(value["gameId"], "20251220093644120_baal-run");
        assert_eq!(value["state"], "destroyed");
        assert_eq!(value["durationSeconds"], 65);
        assert_eq!(value["sources"][0], "game_server");
        assert_eq!(value["accounts"][0], "mike");
        assert_eq!(value["players"][0]["playtimeSeconds"], 60);
        assert_eq!(value["players"][0]["account"], "mike");
        assert_eq!(value["players"][0]["anomalous"], false);
        assert!(value.get("settings").is_none());
        assert!(value["players"][0].get("level").is_none());
    }

    #[test]
    fn host_details_are_serialized_when_known() {
        let created = NaiveDate::from_ymd_opt(2025, 12, 20)
            .and_then(|d| d.and_hms_opt(9, 36, 44))
            .expect("valid instant");
        let fields = EventFields {
            id: Some(17),
            settings: GameSettings::parse("exp,hell,hardcore,ladder"),
            ..EventFields::game("hc-baal")
        };
        let event = LogEvent::new(created, LogSource::GameHost, EventKind::GameCreated, fields);
        let mut game = Game::open("hc-baal", &event);
        let mut player = Participation::open("Sorcy", Some("mike".to_string()), created);
        player.level = Some(92);
        player.class = Some("Sorceress".to_string());
        player.ip = Some("10.0.0.5".to_string());
        game.participations.push(player);

        let value = serde_json::to_value(GameRecord::from_game(&game, &HashMap::new()))
            .expect("serialize");
        assert_eq!(value["hostGameId"], 17);
        assert_eq!(value["settings"]["difficulty"], "hell");
        assert_eq!(value["settings"]["hardcore"], true);
        assert_eq!(value["settings"]["ladder"], true);
        assert_eq!(value["settings"]["expansion"], true);
        assert_eq!(value["players"][0]["level"], 92);
        assert_eq!(value["players"][0]["class"], "Sorceress");
        assert_eq!(value["players"][0]["ip"], "10.0.0.5");
    }
}
