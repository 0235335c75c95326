// Event extraction
// Ordered per-source matcher tables; first matching pattern wins

use std::collections::HashMap;

use regex::Regex;

use crate::entities::{EventFields, ExtractorConfig, RawEvent};
use crate::errors::PatternError;
use crate::value_objects::{
    character_class_name, EventField, EventKind, GameSettings, LogSource, TimestampFormat,
};

/// Longest fallback token handed to the normalizer when the prefix grammar fails.
const FALLBACK_TOKEN_LEN: usize = 20;

/// Built-in phrase tables, in match order.
pub fn default_patterns(source: LogSource) -> &'static [(EventKind, &'static str)] {
    match source {
        LogSource::Broker => &[
            (
                EventKind::GameCreateRequested,
                r#"game_create:.*?game\s+"(?P<game>[^"]+)""#,
            ),
            (
                EventKind::GameStarted,
                r#"_client_startgame4.*?game\s+"(?P<game>[^"]+)""#,
            ),
            (
                EventKind::AccountJoinedGame,
                r#""(?P<account>[^"]+)"\s+joined\s+game\s+"(?P<game>[^"]+)""#,
            ),
            (
                EventKind::CharacterLoginCorrelation,
                r"charloginreq.*?character\s+(?P<character>[^\s(]+)\(\*(?P<account>[^)\s]+)\)",
            ),
            (
                EventKind::GameDestroyed,
                r#"game_destroy.*?game\s+"(?P<game>[^"]+)""#,
            ),
        ],
        LogSource::GameServer => &[
            (
                EventKind::GameCreated,
                r"d2cs_game_create:.*?game\s+(?P<game>\S+)",
            ),
            (
                EventKind::CharacterJoined,
                r"game_add_character:.*?character\s+(?P<character>\S+)\s+to\s+game\s+(?P<game>\S+)",
            ),
            (
                EventKind::CharacterLeft,
                r"game_del_character:.*?character\s+(?P<character>\S+)\s+from\s+game\s+(?P<game>\S+)",
            ),
            (
                EventKind::GameDestroyed,
                r"game_destroy:.*?game\s+(?P<game>\S+)\s+removed",
            ),
        ],
        LogSource::GameHost => &[
            (
                EventKind::GameCreated,
                r"D2CSCreateEmptyGame:.*?[Cc]reated game\s+'(?P<game>[^']+)'(?:,\s*(?:id=)?(?P<id>\d+))?(?:\s*,\s*(?P<settings>[^,\s]+(?:,[^,\s]+){1,3}))?",
            ),
            (
                EventKind::GameCreated,
                r"D2GSGameListInsert:.*?game(?:\s+list)?\s*'(?P<game>[^']+)'(?:.*?id=(?P<id>\d+))?",
            ),
            (
                EventKind::CharacterJoined,
                r"D2GSCBEnterGame:\s*(?P<character>[^\s(]+)\(\*(?P<account>[^)]+)\)(?:\[L=(?P<level>\d+),C=(?P<class>[^\]]+)\])?(?:@(?P<ip>[^\s]+))?.*?game\s*'(?P<game>[^']+)'(?:,\s*id=(?P<id>\d+))?(?:\((?P<settings>[^)]*)\))?",
            ),
            (
                EventKind::CharacterLeft,
                r"D2GSCBLeaveGame:\s*(?P<character>[^\s(]+)\(\*(?P<account>[^)]+)\)(?:\[L=(?P<level>\d+),C=(?P<class>[^\]]+)\])?.*?game\s*'(?P<game>[^']+)'(?:,\s*id=(?P<id>\d+))?(?:\((?P<settings>[^)]*)\))?",
            ),
            (
                EventKind::GameDestroyed,
                r"D2GSCBCloseGame:.*?game\s*'(?P<game>[^']+)'(?:,\s*id=(?P<id>\d+))?",
            ),
        ],
    }
}

#[derive(Debug, Clone)]
pub struct EventPattern {
    kind: EventKind,
    regex: Regex,
}

impl EventPattern {
    /// Compiles a pattern and checks it captures everything `kind` needs.
    pub fn new(source: LogSource, kind: EventKind, pattern: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|error| PatternError::Invalid {
            origin: source,
            kind,
            error,
        })?;
        for field in kind.required_fields() {
            let capture = field.capture_name();
            if !regex.capture_names().flatten().any(|name| name == capture) {
                return Err(PatternError::MissingCapture {
                    origin: source,
                    kind,
                    capture,
                });
            }
        }
        Ok(Self { kind, regex })
    }

    fn capture(&self, line: &str) -> Option<EventFields> {
        let captures = self.regex.captures(line)?;
        let text = |field: EventField| {
            captures
                .name(field.capture_name())
                .map(|m| m.as_str().to_string())
                .filter(|value| !value.is_empty())
        };
        Some(EventFields {
            game: text(EventField::Game),
            character: text(EventField::Character),
            account: text(EventField::Account),
            id: text(EventField::Id).and_then(|value| value.parse().ok()),
            level: text(EventField::Level).and_then(|value| value.parse().ok()),
            class: text(EventField::Class).map(|abbr| character_class_name(&abbr).to_string()),
            ip: text(EventField::Ip),
            settings: text(EventField::Settings).and_then(|raw| GameSettings::parse(&raw)),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SourceGrammar {
    format: TimestampFormat,
    prefix: Regex,
    patterns: Vec<EventPattern>,
}

impl SourceGrammar {
    pub fn new(
        source: LogSource,
        format: TimestampFormat,
        patterns: Vec<EventPattern>,
    ) -> Result<Self, PatternError> {
        let prefix = Regex::new(format.prefix_pattern())
            .map_err(|error| PatternError::InvalidPrefix { origin: source, error })?;
        Ok(Self {
            format,
            prefix,
            patterns,
        })
    }

    pub fn format(&self) -> TimestampFormat {
        self.format
    }

    fn timestamp_token(&self, line: &str) -> String {
        match self.prefix.captures(line).and_then(|c| c.name("ts")) {
            Some(token) => token.as_str().to_string(),
            None => line.trim_start().chars().take(FALLBACK_TOKEN_LEN).collect(),
        }
    }
}

/// Pure line-to-event matcher.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    grammars: HashMap<LogSource, SourceGrammar>,
}

impl EventExtractor {
    /// Configured patterns for a source replace that source's defaults.
    pub fn build(config: &ExtractorConfig) -> Result<Self, PatternError> {
        let mut grammars = HashMap::new();
        for source in LogSource::ALL {
            let configured: Vec<_> = config
                .patterns
                .iter()
                .filter(|pattern| pattern.source == source)
                .collect();
            let patterns = if configured.is_empty() {
                default_patterns(source)
                    .iter()
                    .map(|(kind, pattern)| EventPattern::new(source, *kind, pattern))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                configured
                    .into_iter()
                    .map(|pattern| EventPattern::new(source, pattern.kind, &pattern.regex))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let grammar = SourceGrammar::new(source, config.timestamp_format(source), patterns)?;
            grammars.insert(source, grammar);
        }
        Ok(Self { grammars })
    }

    pub fn with_defaults() -> Result<Self, PatternError> {
        Self::build(&ExtractorConfig::default())
    }

    pub fn grammar(&self, source: LogSource) -> Option<&SourceGrammar> {
        self.grammars.get(&source)
    }

    /// Returns the first matching event, or `None` for noise.
    pub fn extract(&self, source: LogSource, line: &str) -> Option<RawEvent> {
        let grammar = self.grammars.get(&source)?;
        grammar.patterns.iter().find_map(|pattern| {
            pattern.capture(line).map(|fields| RawEvent {
                source,
                timestamp_token: grammar.timestamp_token(line),
                kind: pattern.kind,
                fields,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PatternConfig;

    fn extractor() -> EventExtractor {
        EventExtractor::with_defaults().expect("default patterns compile")
    }

    #[test]
    fn broker_create_request_captures_game() {
        let line = r#"Dec 20 09:36:44 [info ] game_create: game "baal-run-01" (pass "") type 4(Diablo II Closed) created"#;
        let event = extractor().extract(LogSource::Broker, line).expect("event");
        assert_eq!(event.kind, EventKind::GameCreateRequested);
        assert_eq!(event.timestamp_token, "Dec 20 09:36:44");
        assert_eq!(event.fields.game.as_deref(), Some("baal-run-01"));
    }

    #[test]
    fn broker_login_correlation_captures_account() {
        let line = "Dec 20 09:30:01 [info ] _client_charloginreq: [3] character Sorcy(*mike) logged in";
        let event = extractor().extract(LogSource::Broker, line).expect("event");
        assert_eq!(event.kind, EventKind::CharacterLoginCorrelation);
        assert_eq!(event.fields.character.as_deref(), Some("Sorcy"));
        assert_eq!(event.fields.account.as_deref(), Some("mike"));
        assert_eq!(event.fields.game, None);
    }

    #[test]
    fn broker_account_join_captures_both_names() {
        let line = r#"Dec 20 09:37:02 [info ] _client_joingame: [5] "mike" joined game "baal-run-01""#;
        let event = extractor().extract(LogSource::Broker, line).expect("event");
        assert_eq!(event.kind, EventKind::AccountJoinedGame);
        assert_eq!(event.fields.account.as_deref(), Some("mike"));
        assert_eq!(event.fields.game.as_deref(), Some("baal-run-01"));
    }

    #[test]
    fn game_server_lines_map_to_lifecycle_kinds() {
        let extractor = extractor();
        let cases = [
            (
                "Dec 20 09:36:44 [info ] d2cs_game_create: game baal-run-01 (pass ) created by Sorcy",
                EventKind::GameCreated,
            ),
            (
                "Dec 20 09:36:50 [info ] game_add_character: added character Sorcy to game baal-run-01",
                EventKind::CharacterJoined,
            ),
            (
                "Dec 20 09:50:10 [info ] game_del_character: removed character Sorcy from game baal-run-01",
                EventKind::CharacterLeft,
            ),
            (
                "Dec 20 09:50:12 [info ] game_destroy: game baal-run-01 removed from game list",
                EventKind::GameDestroyed,
            ),
        ];
        for (line, kind) in cases {
            let event = extractor.extract(LogSource::GameServer, line).expect("event");
            assert_eq!(event.kind, kind, "line: {line}");
            assert_eq!(event.fields.game.as_deref(), Some("baal-run-01"));
        }
    }

    #[test]
    fn game_host_enter_captures_character_account_and_id() {
        let line = "12/20 09:36:51.250 D2GSCBEnterGame: Sorcy(*mike)[L=92,C=Sor]@10.0.0.5 enter game 'baal-run-01', id=17(exp,hell,softcore,ladder)";
        let event = extractor().extract(LogSource::GameHost, line).expect("event");
        assert_eq!(event.kind, EventKind::CharacterJoined);
        assert_eq!(event.timestamp_token, "12/20 09:36:51.250");
        assert_eq!(event.fields.character.as_deref(), Some("Sorcy"));
        assert_eq!(event.fields.account.as_deref(), Some("mike"));
        assert_eq!(event.fields.id, Some(17));
        assert_eq!(event.fields.level, Some(92));
        assert_eq!(event.fields.class.as_deref(), Some("Sorceress"));
        assert_eq!(event.fields.ip.as_deref(), Some("10.0.0.5"));
        let settings = event.fields.settings.expect("settings");
        assert!(settings.expansion);
        assert_eq!(settings.difficulty.as_deref(), Some("hell"));
        assert!(settings.ladder);
    }

    #[test]
    fn game_host_leave_captures_level_and_account() {
        let line = "12/20 10:02:11.004 D2GSCBLeaveGame: Sorcy(*mike)[L=93,C=Sor] leave game 'baal-run-01', id=17(exp,hell,softcore,ladder)";
        let event = extractor().extract(LogSource::GameHost, line).expect("event");
        assert_eq!(event.kind, EventKind::CharacterLeft);
        assert_eq!(event.fields.account.as_deref(), Some("mike"));
        assert_eq!(event.fields.level, Some(93));
        assert_eq!(event.fields.ip, None);
    }

    #[test]
    fn game_host_creation_phrases_capture_id_and_settings() {
        let extractor = extractor();
        let created = "12/20 09:36:44.100 D2CSCreateEmptyGame: Created game 'hc-cows', 40,exp,nightmare,hardcore,nonladder, seqno=812";
        let event = extractor.extract(LogSource::GameHost, created).expect("event");
        assert_eq!(event.kind, EventKind::GameCreated);
        assert_eq!(event.fields.game.as_deref(), Some("hc-cows"));
        assert_eq!(event.fields.id, Some(40));
        let settings = event.fields.settings.expect("settings");
        assert_eq!(settings.difficulty.as_deref(), Some("nightmare"));
        assert!(settings.hardcore);
        assert!(!settings.ladder);

        let listed = "12/20 09:36:44.102 D2GSGameListInsert: insert game 'hc-cows' to game list, id=40";
        let event = extractor.extract(LogSource::GameHost, listed).expect("event");
        assert_eq!(event.kind, EventKind::GameCreated);
        assert_eq!(event.fields.game.as_deref(), Some("hc-cows"));
        assert_eq!(event.fields.id, Some(40));
    }

    #[test]
    fn unmatched_lines_yield_nothing() {
        let line = "Dec 20 09:36:44 [info ] server_process: listening on 0.0.0.0:6112";
        assert!(extractor().extract(LogSource::Broker, line).is_none());
    }

    #[test]
    fn extraction_is_pure() {
        let extractor = extractor();
        let line = "Dec 20 09:36:50 [info ] game_add_character: added character Sorcy to game g1";
        assert_eq!(
            extractor.extract(LogSource::GameServer, line),
            extractor.extract(LogSource::GameServer, line)
        );
    }

    #[test]
    fn configured_patterns_replace_source_defaults() {
        let config = ExtractorConfig {
            patterns: vec![PatternConfig {
                source: LogSource::GameServer,
                kind: EventKind::GameCreated,
                regex: r"NEW (?P<game>\S+)".to_string(),
            }],
            ..ExtractorConfig::default()
        };
        let extractor = EventExtractor::build(&config).expect("build");
        let replaced = "Dec 20 09:36:44 d2cs_game_create: game g1 created";
        assert!(extractor.extract(LogSource::GameServer, replaced).is_none());
        let custom = extractor
            .extract(LogSource::GameServer, "Dec 20 09:36:44 NEW g2")
            .expect("event");
        assert_eq!(custom.fields.game.as_deref(), Some("g2"));
        let broker = r#"Dec 20 09:36:44 game_create: game "g3" created"#;
        assert!(extractor.extract(LogSource::Broker, broker).is_some());
    }

    #[test]
    fn pattern_missing_required_capture_is_rejected() {
        let error = EventPattern::new(
            LogSource::GameServer,
            EventKind::CharacterJoined,
            r"added (?P<character>\S+)",
        )
        .expect_err("missing game capture");
        assert!(matches!(
            error,
            PatternError::MissingCapture { capture: "game", .. }
        ));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let error = EventPattern::new(LogSource::Broker, EventKind::GameDestroyed, r"(?P<game>")
            .expect_err("invalid regex");
        assert!(matches!(error, PatternError::Invalid { .. }));
    }

    #[test]
    fn line_without_prefix_keeps_leading_text_as_token() {
        let line = "garbage game_destroy: game g1 removed";
        let event = extractor().extract(LogSource::GameServer, line).expect("event");
        assert_eq!(event.timestamp_token, "garbage game_destroy");
    }
}
