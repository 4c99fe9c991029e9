//! Match state machine.
//!
//! Owns the active [`Match`], the history of archived matches and the UI
//! flags that travel with a snapshot. Phases:
//!
//! ```text
//! NoActiveMatch -> Running <-> Paused -> Finished -> (archived) NoActiveMatch
//! ```
//!
//! The machine performs no I/O; durability is layered on top by
//! [`crate::services::MatchService`].

use std::collections::HashSet;

use crate::clock;
use crate::error::{Error, Result};
use crate::ledger::{self, ScoreRemoval};
use crate::models::{
    Direction, Match, MatchId, PlayerId, Roster, ScoreEvent, ScoreType, SyncPayload, UiFlags,
};

const DEFAULT_OPPONENT_NAME: &str = "Opponent Team";

/// Upper bound on a stored elapsed time (about 285 years).
const MAX_ELAPSED_MS: i64 = 1 << 53;

/// Phase of the state machine, derived from the active match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    NoActiveMatch,
    Running,
    Paused,
    /// Finished and waiting for the post-game confirmation.
    Finished,
}

/// Engine behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// New matches start with the clock stopped.
    pub start_paused: bool,
    /// Points removed by one opponent undo.
    pub opponent_undo_points: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_paused: true,
            opponent_undo_points: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    roster: Roster,
    config: EngineConfig,
    active: Option<Match>,
    history: Vec<Match>,
    ui: UiFlags,
}

impl MatchStateMachine {
    pub fn new(roster: Roster, config: EngineConfig) -> Self {
        Self {
            roster,
            config,
            active: None,
            history: Vec::new(),
            ui: UiFlags::default(),
        }
    }

    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    pub const fn config(&self) -> EngineConfig {
        self.config
    }

    pub const fn active_match(&self) -> Option<&Match> {
        self.active.as_ref()
    }

    /// Archived matches, newest first.
    pub fn history(&self) -> &[Match] {
        &self.history
    }

    pub const fn ui(&self) -> &UiFlags {
        &self.ui
    }

    pub fn phase(&self) -> MatchPhase {
        match &self.active {
            None => MatchPhase::NoActiveMatch,
            Some(game) if game.is_finished => MatchPhase::Finished,
            Some(game) if game.pause_time_ms.is_some() => MatchPhase::Paused,
            Some(_) => MatchPhase::Running,
        }
    }

    /// Elapsed time of the active match for display ticks.
    pub fn elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        self.active
            .as_ref()
            .map(|game| clock::elapsed_ms(game, now_ms))
    }

    /// Total of our score events in the active match.
    pub fn total_score(&self) -> u32 {
        self.active.as_ref().map_or(0, ledger::total_score)
    }

    fn live_match(&mut self) -> Result<&mut Match> {
        let game = self
            .active
            .as_mut()
            .ok_or_else(|| Error::Validation("no active match".to_string()))?;
        if game.is_finished {
            return Err(Error::MatchFinished);
        }
        Ok(game)
    }

    pub fn start_match(&mut self, opponent_name: &str, is_home: bool, now_ms: i64) -> Result<MatchPhase> {
        if self.active.is_some() {
            return Err(Error::Validation(
                "a match is already active; finish and archive it first".to_string(),
            ));
        }

        let opponent_name = match opponent_name.trim() {
            "" => DEFAULT_OPPONENT_NAME,
            name => name,
        };
        let mut game = Match::new(opponent_name, is_home, now_ms, self.config.start_paused);
        ledger::reset_sessions(&mut game, &self.roster);
        if !self.config.start_paused {
            ledger::open_sessions(&mut game, now_ms);
        }

        tracing::debug!(match_id = %game.id, opponent = %game.opponent_name, "Match started");
        self.active = Some(game);
        self.ui.is_start_modal_open = false;
        self.ui.opponent_name_input.clear();
        Ok(self.phase())
    }

    pub fn record_score(
        &mut self,
        player_id: &PlayerId,
        score_type: ScoreType,
        now_ms: i64,
    ) -> Result<ScoreEvent> {
        let roster = self.roster.clone();
        ledger::record_score(self.live_match()?, &roster, player_id, score_type, now_ms)
    }

    pub fn undo_last_score(&mut self) -> Result<Option<ScoreEvent>> {
        ledger::undo_last_score(self.live_match()?)
    }

    pub fn remove_score(&mut self, log_id: &str) -> Result<ScoreRemoval> {
        let roster = self.roster.clone();
        ledger::remove_score(self.live_match()?, &roster, log_id)
    }

    pub fn record_opponent_score(&mut self, score_type: ScoreType) -> Result<u32> {
        ledger::add_opponent_score(self.live_match()?, score_type)
    }

    pub fn undo_opponent_score(&mut self) -> Result<u32> {
        let amount = self.config.opponent_undo_points;
        ledger::undo_opponent_score(self.live_match()?, amount)
    }

    pub fn record_tackle(&mut self, player_id: &PlayerId, now_ms: i64) -> Result<u32> {
        let roster = self.roster.clone();
        ledger::record_tackle(self.live_match()?, &roster, player_id, now_ms)
    }

    pub fn toggle_substitution(&mut self, player_id: &PlayerId, now_ms: i64) -> Result<Direction> {
        let roster = self.roster.clone();
        ledger::toggle_substitution(self.live_match()?, &roster, player_id, now_ms)
    }

    pub fn set_home(&mut self, is_home: bool) -> Result<()> {
        self.live_match()?.is_home = is_home;
        Ok(())
    }

    /// Running -> Paused closes every open session; Paused -> Running reopens
    /// sessions for on-field players.
    pub fn toggle_pause(&mut self, now_ms: i64) -> Result<MatchPhase> {
        match self.phase() {
            MatchPhase::Running => self.pause(now_ms),
            MatchPhase::Paused => self.resume(now_ms),
            MatchPhase::Finished => Err(Error::MatchFinished),
            MatchPhase::NoActiveMatch => Err(Error::Validation("no active match".to_string())),
        }
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<MatchPhase> {
        let game = self.live_match()?;
        clock::pause(game, now_ms)?;
        ledger::close_sessions(game, now_ms);
        tracing::debug!(elapsed_ms = game.elapsed_at_pause_ms, "Match paused");
        Ok(MatchPhase::Paused)
    }

    pub fn resume(&mut self, now_ms: i64) -> Result<MatchPhase> {
        let game = self.live_match()?;
        clock::resume(game, now_ms)?;
        ledger::open_sessions(game, now_ms);
        tracing::debug!(elapsed_ms = game.elapsed_at_pause_ms, "Match resumed");
        Ok(MatchPhase::Running)
    }

    /// Close the clock and sessions and open the post-game confirmation.
    ///
    /// Calling this again on a finished match only reopens the confirmation.
    pub fn finish_match(&mut self, now_ms: i64) -> Result<&Match> {
        let game = self
            .active
            .as_mut()
            .ok_or_else(|| Error::Validation("no active match".to_string()))?;

        if !game.is_finished {
            ledger::finalize_playtime(game, now_ms);
            let total = clock::stop(game, now_ms);
            tracing::debug!(match_id = %game.id, elapsed_ms = total, "Match finished");
        }
        self.ui.is_finish_modal_open = true;
        Ok(game)
    }

    /// Close the confirmation without archiving; the match stays finished.
    pub fn dismiss_finish(&mut self) {
        self.ui.is_finish_modal_open = false;
    }

    pub fn set_post_game_comment(&mut self, comment: impl Into<String>) {
        self.ui.post_game_comment = comment.into();
    }

    /// File the finished match into history (newest first).
    ///
    /// Without an explicit comment the pending post-game comment is used.
    pub fn archive_match(&mut self, comment: Option<String>) -> Result<Match> {
        match &self.active {
            None => return Err(Error::Validation("no active match".to_string())),
            Some(game) if !game.is_finished => {
                return Err(Error::Validation(
                    "match must be finished before it can be archived".to_string(),
                ))
            }
            Some(_) => {}
        }
        let Some(mut game) = self.active.take() else {
            return Err(Error::Validation("no active match".to_string()));
        };

        game.comments = comment.unwrap_or_else(|| std::mem::take(&mut self.ui.post_game_comment));
        self.history.insert(0, game.clone());
        self.ui.is_finish_modal_open = false;
        self.ui.post_game_comment.clear();
        tracing::debug!(match_id = %game.id, "Match archived");
        Ok(game)
    }

    /// Replace the comment of an archived match, the only permitted edit.
    pub fn edit_history_comment(&mut self, match_id: &MatchId, comment: impl Into<String>) -> Result<()> {
        let game = self
            .history
            .iter_mut()
            .find(|game| &game.id == match_id)
            .ok_or_else(|| Error::NotFound(format!("match {match_id}")))?;
        game.comments = comment.into();
        Ok(())
    }

    pub fn delete_history_match(&mut self, match_id: &MatchId) -> Result<Match> {
        let position = self
            .history
            .iter()
            .position(|game| &game.id == match_id)
            .ok_or_else(|| Error::NotFound(format!("match {match_id}")))?;
        Ok(self.history.remove(position))
    }

    /// Read-only copy of everything that is synced or exported.
    pub fn snapshot(&self) -> SyncPayload {
        SyncPayload {
            ui: self.ui.clone(),
            active_match: self.active.clone(),
            historic_matches: self.history.clone(),
        }
    }

    /// Replace all state with an incoming payload after validating it.
    /// On error nothing changes.
    pub fn replace_state(&mut self, payload: SyncPayload) -> Result<()> {
        validate_payload(&payload)?;
        self.ui = payload.ui;
        self.active = payload.active_match;
        self.history = payload.historic_matches;
        if let Some(game) = self.active.as_mut() {
            ledger::restore_sessions(game, &self.roster);
        }
        tracing::debug!(
            has_active = self.active.is_some(),
            history = self.history.len(),
            "State replaced"
        );
        Ok(())
    }
}

fn validate_payload(payload: &SyncPayload) -> Result<()> {
    let mut match_ids = HashSet::new();

    for game in payload.active_match.iter().chain(&payload.historic_matches) {
        if !match_ids.insert(game.id) {
            return Err(Error::Validation(format!("duplicate match id {}", game.id)));
        }
        validate_match(game)?;
    }

    if let Some(game) = payload
        .historic_matches
        .iter()
        .find(|game| !game.is_finished)
    {
        return Err(Error::Validation(format!(
            "historic match {} is not finished",
            game.id
        )));
    }
    Ok(())
}

fn validate_match(game: &Match) -> Result<()> {
    if !(0..=MAX_ELAPSED_MS).contains(&game.elapsed_at_pause_ms) {
        return Err(Error::Validation(format!(
            "match {} has elapsed time {} out of range",
            game.id, game.elapsed_at_pause_ms
        )));
    }
    if game.start_time_ms < 0 || game.pause_time_ms.is_some_and(|pause| pause < 0) {
        return Err(Error::Validation(format!(
            "match {} has a negative timestamp",
            game.id
        )));
    }

    let mut event_ids = HashSet::new();
    if let Some(event) = game
        .score_events
        .iter()
        .find(|event| !event_ids.insert(event.id.as_str()))
    {
        return Err(Error::Validation(format!(
            "match {} has duplicate score event id {}",
            game.id, event.id
        )));
    }

    if let Some((id, _)) = game
        .player_sessions
        .iter()
        .find(|(_, session)| session.is_open() && !session.on_field)
    {
        return Err(Error::Validation(format!(
            "match {} has an open session for off-field player {id}",
            game.id
        )));
    }
    Ok(())
}
