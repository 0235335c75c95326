// Session correlator
// Single-threaded fold of log events into game and participation lifecycles

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;

use crate::entities::{
    CorrelationDiagnostics, CorrelatorConfig, Game, GameAnomaly, GameRecord, GameState, LiveState,
    LogEvent, OpenParticipation, Participation,
};
use crate::errors::CorrelationIssue;
use crate::services::retention::{HistoryVerdict, RetentionPolicy};
use crate::value_objects::{EventField, EventKind};

/// Creation evidence from a new (source, kind) pair, or carrying the host id the
/// open game already has, confirms that game inside this window.
pub const CONFIRMATION_WINDOW_SECONDS: i64 = 60;

#[derive(Debug)]
pub struct Correlator {
    retention: RetentionPolicy,
    open: HashMap<String, Game>,
    /// Name to closure instant of the latest closed game with that name.
    recently_closed: HashMap<String, NaiveDateTime>,
    account_index: HashMap<String, String>,
    completed: VecDeque<Game>,
    watermark: Option<NaiveDateTime>,
    diagnostics: CorrelationDiagnostics,
}

impl Correlator {
    pub fn new(config: &CorrelatorConfig) -> Self {
        Self {
            retention: RetentionPolicy::from_config(config),
            open: HashMap::new(),
            recently_closed: HashMap::new(),
            account_index: HashMap::new(),
            completed: VecDeque::new(),
            watermark: None,
            diagnostics: CorrelationDiagnostics::default(),
        }
    }

    pub fn watermark(&self) -> Option<NaiveDateTime> {
        self.watermark
    }

    pub fn diagnostics(&self) -> &CorrelationDiagnostics {
        &self.diagnostics
    }

    pub fn open_game(&self, name: &str) -> Option<&Game> {
        self.open.get(name)
    }

    pub fn open_game_count(&self) -> usize {
        self.open.len()
    }

    /// Folds one event. Never fails; findings are returned for the caller to log.
    pub fn apply(&mut self, event: &LogEvent) -> Vec<CorrelationIssue> {
        self.diagnostics.events_applied += 1;
        if self.watermark.map_or(true, |w| event.timestamp > w) {
            self.watermark = Some(event.timestamp);
        }

        let mut issues = Vec::new();
        if let Err(issue) = self.dispatch(event, &mut issues) {
            self.count(&issue);
            issues.push(issue);
        }
        issues
    }

    fn dispatch(
        &mut self,
        event: &LogEvent,
        issues: &mut Vec<CorrelationIssue>,
    ) -> Result<(), CorrelationIssue> {
        if event.kind == EventKind::CharacterLoginCorrelation {
            let character = required(event, EventField::Character)?;
            let account = required(event, EventField::Account)?;
            self.account_index.insert(character, account);
            return Ok(());
        }

        let name = required(event, EventField::Game)?;
        match event.kind {
            EventKind::GameCreateRequested | EventKind::GameCreated => {
                self.on_creation(&name, event, issues);
                Ok(())
            }
            EventKind::GameStarted => {
                let game = self.open.get_mut(&name).ok_or_else(|| orphan(event, &name))?;
                game.touch(event);
                game.started_at.get_or_insert(event.timestamp);
                game.state = GameState::Active;
                Ok(())
            }
            EventKind::CharacterJoined => {
                let character = required(event, EventField::Character)?;
                let game = self.open.get_mut(&name).ok_or_else(|| orphan(event, &name))?;
                game.touch(event);
                game.absorb(&event.fields);
                game.state = GameState::Active;
                if let Some(account) = &event.fields.account {
                    game.accounts.insert(account.clone());
                }
                match game.open_participation_mut(&character) {
                    Some(existing) => {
                        existing.absorb(&event.fields);
                        self.diagnostics.duplicate_joins += 1;
                    }
                    None => {
                        let mut participation =
                            Participation::open(&character, None, event.timestamp);
                        participation.absorb(&event.fields);
                        game.participations.push(participation);
                    }
                }
                Ok(())
            }
            EventKind::CharacterLeft => {
                let character = required(event, EventField::Character)?;
                let game = self.open.get_mut(&name).ok_or_else(|| orphan(event, &name))?;
                let participation = game
                    .open_participation_mut(&character)
                    .ok_or_else(|| orphan(event, &name))?;
                participation.absorb(&event.fields);
                let seconds = participation.close(event.timestamp);
                let negative = participation.anomalous;
                game.touch(event);
                if negative {
                    game.flag(GameAnomaly::NegativeDuration);
                    return Err(CorrelationIssue::NegativeDuration {
                        game: name,
                        character,
                        seconds,
                    });
                }
                Ok(())
            }
            EventKind::AccountJoinedGame => {
                let account = required(event, EventField::Account)?;
                let game = self.open.get_mut(&name).ok_or_else(|| orphan(event, &name))?;
                game.touch(event);
                for participation in game.participations.iter_mut() {
                    if participation.account.is_none() {
                        participation.account = Some(account.clone());
                    }
                }
                game.accounts.insert(account);
                Ok(())
            }
            EventKind::GameDestroyed => {
                match self.open.remove(&name) {
                    Some(mut game) => {
                        game.touch(event);
                        self.diagnostics.games_destroyed += 1;
                        self.close_game(game, event.timestamp, false, issues);
                        Ok(())
                    }
                    None if self.recently_closed.contains_key(&name) => {
                        self.diagnostics.duplicate_closures += 1;
                        Ok(())
                    }
                    None => Err(orphan(event, &name)),
                }
            }
            EventKind::CharacterLoginCorrelation => Ok(()),
        }
    }

    fn on_creation(&mut self, name: &str, event: &LogEvent, issues: &mut Vec<CorrelationIssue>) {
        if let Some(game) = self.open.get_mut(name) {
            let evidence = (event.source, event.kind);
            let within_window = (event.timestamp - game.created_at).num_seconds().abs()
                <= CONFIRMATION_WINDOW_SECONDS;
            let same_game =
                !game.evidence.contains(&evidence) || game.same_host_game(&event.fields);
            if within_window && same_game {
                game.evidence.insert(evidence);
                game.absorb(&event.fields);
                game.touch(event);
                if event.kind == EventKind::GameCreated && game.state == GameState::Requested {
                    game.state = GameState::Created;
                    game.created_at = event.timestamp;
                }
                return;
            }
        }

        if let Some(mut previous) = self.open.remove(name) {
            let closed_at = self.retention.superseded_closure_at(&previous, event.timestamp);
            previous.flag(GameAnomaly::DuplicateOpen);
            let issue = CorrelationIssue::AnomalousDuplicateGame {
                name: name.to_string(),
                created_at: previous.created_at,
            };
            self.count(&issue);
            issues.push(issue);
            self.diagnostics.games_ghosted += 1;
            self.close_game(previous, closed_at, true, issues);
        }

        self.open.insert(name.to_string(), Game::open(name, event));
    }

    fn close_game(
        &mut self,
        mut game: Game,
        at: NaiveDateTime,
        ghosted: bool,
        issues: &mut Vec<CorrelationIssue>,
    ) {
        for (character, seconds) in game.close(at, ghosted) {
            let issue = CorrelationIssue::NegativeDuration {
                game: game.name.clone(),
                character,
                seconds,
            };
            self.count(&issue);
            issues.push(issue);
        }
        for participation in game.participations.iter_mut() {
            if participation.account.is_none() {
                participation.account = self.account_index.get(&participation.character).cloned();
            }
            if let Some(account) = &participation.account {
                game.accounts.insert(account.clone());
            }
        }
        self.recently_closed.insert(game.name.clone(), at);
        self.completed.push_back(game);
    }

    fn count(&mut self, issue: &CorrelationIssue) {
        match issue {
            CorrelationIssue::AnomalousDuplicateGame { .. } => self.diagnostics.duplicate_games += 1,
            CorrelationIssue::OrphanEvent { .. } => self.diagnostics.orphan_events += 1,
            CorrelationIssue::NegativeDuration { .. } => self.diagnostics.negative_durations += 1,
            CorrelationIssue::IncompleteEvent { .. } => self.diagnostics.incomplete_events += 1,
        }
    }

    /// Ghosts every open game idle for longer than the timeout at `now`.
    /// Returns how many games were ghosted.
    pub fn evict_expired(&mut self, now: NaiveDateTime) -> usize {
        let mut expired: Vec<(NaiveDateTime, String)> = self
            .open
            .values()
            .filter(|game| self.retention.is_expired(game, now))
            .map(|game| (game.last_activity, game.name.clone()))
            .collect();
        expired.sort();

        let mut issues = Vec::new();
        for (_, name) in &expired {
            if let Some(game) = self.open.remove(name) {
                let closed_at = self.retention.ghost_closure_at(&game);
                self.diagnostics.games_ghosted += 1;
                self.close_game(game, closed_at, true, &mut issues);
            }
        }

        let horizon = now - self.retention.ghost_timeout();
        self.recently_closed.retain(|_, closed_at| *closed_at >= horizon);
        expired.len()
    }

    /// Games closed since the last drain, in closure order, history filters applied.
    pub fn drain_completed(&mut self) -> Vec<GameRecord> {
        let mut records = Vec::new();
        while let Some(game) = self.completed.pop_front() {
            match self.retention.history_verdict(&game) {
                HistoryVerdict::Keep => records.push(GameRecord::from_game(&game, &self.account_index)),
                HistoryVerdict::NoParticipants => self.diagnostics.history_excluded_empty += 1,
                HistoryVerdict::TooShort => self.diagnostics.history_excluded_short += 1,
            }
        }
        records
    }

    pub fn live_state(&self) -> LiveState {
        let mut games: Vec<&Game> = self.open.values().collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));

        let mut live = LiveState {
            watermark: self.watermark,
            ..LiveState::default()
        };
        for game in games {
            let record = GameRecord::from_game(game, &self.account_index);
            for participation in record.players.iter().filter(|p| p.left_at.is_none()) {
                live.open_participations.push(OpenParticipation {
                    game_id: record.game_id.clone(),
                    game_name: game.name.clone(),
                    character: participation.character.clone(),
                    account: participation.account.clone(),
                    joined_at: participation.joined_at,
                });
            }
            live.open_games.push(record);
        }
        live
    }
}

fn required(event: &LogEvent, field: EventField) -> Result<String, CorrelationIssue> {
    event
        .fields
        .get(field)
        .ok_or(CorrelationIssue::IncompleteEvent {
            kind: event.kind,
            field,
        })
}

fn orphan(event: &LogEvent, game: &str) -> CorrelationIssue {
    CorrelationIssue::OrphanEvent {
        kind: event.kind,
        game: game.to_string(),
        character: event.fields.character.clone(),
    }
}
