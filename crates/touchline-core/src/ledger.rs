//! Event ledger: score, tackle and substitution logs on a [`Match`], plus the
//! aggregates derived from them (total score, top tackler, playtime).
//!
//! Every mutation refuses a finished match with [`Error::MatchFinished`].

use std::collections::BTreeMap;

use crate::clock;
use crate::error::{Error, Result};
use crate::models::{
    Direction, Match, Player, PlayerId, PlayerSession, Roster, ScoreEvent, ScoreType,
    SubstitutionEvent, TackleEvent,
};
use crate::util::wall_clock_label;

/// How a score was located for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreRemoval {
    /// Found by id.
    Exact(ScoreEvent),
    /// Found through a legacy log row by type and player name.
    Approximate(ScoreEvent),
}

impl ScoreRemoval {
    pub const fn event(&self) -> &ScoreEvent {
        match self {
            Self::Exact(event) | Self::Approximate(event) => event,
        }
    }
}

fn ensure_open(game: &Match) -> Result<()> {
    if game.is_finished {
        Err(Error::MatchFinished)
    } else {
        Ok(())
    }
}

fn known_player<'a>(roster: &'a Roster, player_id: &PlayerId) -> Result<&'a Player> {
    roster
        .get(player_id)
        .ok_or_else(|| Error::Validation(format!("unknown player '{player_id}'")))
}

pub fn record_score(
    game: &mut Match,
    roster: &Roster,
    player_id: &PlayerId,
    score_type: ScoreType,
    now_ms: i64,
) -> Result<ScoreEvent> {
    ensure_open(game)?;
    let player = known_player(roster, player_id)?;

    let event = ScoreEvent::new(player.id.clone(), score_type, now_ms)
        .with_player_name(player.name.clone());
    game.score_events.push(event.clone());
    Ok(event)
}

/// Remove the most recent score. Latest timestamp wins; on equal timestamps
/// the later insertion wins. `Ok(None)` when there is nothing to undo.
pub fn undo_last_score(game: &mut Match) -> Result<Option<ScoreEvent>> {
    ensure_open(game)?;

    let latest = game
        .score_events
        .iter()
        .enumerate()
        .max_by_key(|(position, event)| (event.timestamp_ms, *position))
        .map(|(position, _)| position);

    Ok(latest.map(|position| game.score_events.remove(position)))
}

/// Remove the score behind a log row id.
pub fn remove_score(game: &mut Match, roster: &Roster, log_id: &str) -> Result<ScoreRemoval> {
    ensure_open(game)?;

    if let Some(position) = game.score_events.iter().position(|event| event.id == log_id) {
        return Ok(ScoreRemoval::Exact(game.score_events.remove(position)));
    }

    let legacy_position = game
        .legacy_score_log
        .iter()
        .position(|entry| entry.id == log_id)
        .ok_or_else(|| Error::NotFound(format!("score log entry {log_id}")))?;
    let legacy = &game.legacy_score_log[legacy_position];
    let score_type = legacy.score_type();

    let candidate = game.score_events.iter().position(|event| {
        Some(event.score_type) == score_type && event_player_name(event, roster) == legacy.name
    });
    let Some(position) = candidate else {
        return Err(Error::NotFound(format!(
            "no score event matches log entry {log_id}"
        )));
    };

    tracing::warn!(
        log_id,
        "Score log entry has no matching event id; removed first event with same type and player"
    );
    game.legacy_score_log.remove(legacy_position);
    Ok(ScoreRemoval::Approximate(game.score_events.remove(position)))
}

fn event_player_name(event: &ScoreEvent, roster: &Roster) -> String {
    event
        .player_name
        .clone()
        .unwrap_or_else(|| roster.name_of(&event.player_id))
}

/// Count a tackle, returning the player's new total.
pub fn record_tackle(
    game: &mut Match,
    roster: &Roster,
    player_id: &PlayerId,
    now_ms: i64,
) -> Result<u32> {
    ensure_open(game)?;
    let player = known_player(roster, player_id)?;

    let count = game.tackle_counts.entry(player.id.clone()).or_insert(0);
    *count += 1;
    let count = *count;

    game.tackle_history.insert(
        0,
        TackleEvent::new(
            player.id.clone(),
            player.name.clone(),
            wall_clock_label(now_ms, true),
        ),
    );
    Ok(count)
}

/// Send a player off (closing their session) or bring them on.
///
/// A player coming on while the clock is paused gets their interval opened
/// on resume, so paused time never counts as playtime.
pub fn toggle_substitution(
    game: &mut Match,
    roster: &Roster,
    player_id: &PlayerId,
    now_ms: i64,
) -> Result<Direction> {
    ensure_open(game)?;
    let player = known_player(roster, player_id)?;
    let running = game.is_running();

    let session = game
        .player_sessions
        .entry(player.id.clone())
        .or_insert_with(on_field_session);

    let direction = if session.on_field {
        close_session(session, now_ms);
        session.on_field = false;
        Direction::Off
    } else {
        session.on_field = true;
        session.last_on_ms = running.then_some(now_ms);
        Direction::On
    };

    game.sub_history.insert(
        0,
        SubstitutionEvent::new(
            player.id.clone(),
            player.name.clone(),
            direction,
            wall_clock_label(now_ms, false),
        ),
    );
    Ok(direction)
}

/// Add the opponent's points for `score_type`, returning their new score.
pub fn add_opponent_score(game: &mut Match, score_type: ScoreType) -> Result<u32> {
    ensure_open(game)?;
    game.opponent_score += score_type.points();
    Ok(game.opponent_score)
}

/// Take a fixed amount off the opponent's score, never below zero.
pub fn undo_opponent_score(game: &mut Match, amount: u32) -> Result<u32> {
    ensure_open(game)?;
    game.opponent_score = game.opponent_score.saturating_sub(amount);
    Ok(game.opponent_score)
}

pub fn total_score(game: &Match) -> u32 {
    game.score_events.iter().map(|event| event.points).sum()
}

/// Player with the most tackles; ties go to the lowest player id.
pub fn top_tackler(tackle_counts: &BTreeMap<PlayerId, u32>) -> Option<(&PlayerId, u32)> {
    tackle_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .fold(None, |best, (id, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((id, *count)),
        })
}

/// `Name (count)`, or `None` when nobody has tackled.
pub fn top_tackler_label(tackle_counts: &BTreeMap<PlayerId, u32>, roster: &Roster) -> String {
    top_tackler(tackle_counts).map_or_else(
        || "None".to_string(),
        |(id, count)| {
            let name = roster
                .get(id)
                .map_or("Unknown", |player| player.name.as_str());
            format!("{name} ({count})")
        },
    )
}

fn on_field_session() -> PlayerSession {
    PlayerSession {
        on_field: true,
        ..PlayerSession::default()
    }
}

fn close_session(session: &mut PlayerSession, now_ms: i64) {
    if let Some(last_on_ms) = session.last_on_ms.take() {
        session.accumulated_seconds += clock::interval_seconds(last_on_ms, now_ms);
    }
}

/// Put the whole roster on the field with no open interval.
pub(crate) fn reset_sessions(game: &mut Match, roster: &Roster) {
    game.player_sessions = roster
        .players()
        .iter()
        .map(|player| (player.id.clone(), on_field_session()))
        .collect();
}

/// Give every roster player without a session one derived from the
/// substitution log: the newest entry for a player decides whether they are
/// on the field. On-field players get an interval opened at the start of the
/// current running stretch. Existing sessions are kept as they are.
pub(crate) fn restore_sessions(game: &mut Match, roster: &Roster) {
    if game.is_finished {
        return;
    }
    let running_since = game.is_running().then_some(game.start_time_ms);

    for player in roster.players() {
        if game.player_sessions.contains_key(&player.id) {
            continue;
        }
        let on_field = game
            .sub_history
            .iter()
            .find(|event| match &event.player_id {
                Some(id) => id == &player.id,
                None => event.name == player.name,
            })
            .is_none_or(|event| event.direction == Direction::On);

        game.player_sessions.insert(
            player.id.clone(),
            PlayerSession {
                on_field,
                last_on_ms: running_since.filter(|_| on_field),
                ..PlayerSession::default()
            },
        );
    }
}

/// Open an interval at `now` for every on-field player.
pub(crate) fn open_sessions(game: &mut Match, now_ms: i64) {
    for session in game.player_sessions.values_mut() {
        if session.on_field {
            session.last_on_ms = Some(now_ms);
        }
    }
}

/// Close every open interval, accumulating its time.
pub(crate) fn close_sessions(game: &mut Match, now_ms: i64) {
    for session in game.player_sessions.values_mut() {
        close_session(session, now_ms);
    }
}

/// Close all sessions and freeze the per-player totals onto the match.
pub(crate) fn finalize_playtime(game: &mut Match, now_ms: i64) {
    close_sessions(game, now_ms);
    game.playtime_totals = game
        .player_sessions
        .iter()
        .map(|(id, session)| (id.clone(), session.accumulated_seconds))
        .collect();
}

/// Live playtime in seconds: closed intervals plus the open one.
pub fn playtime_seconds(game: &Match, player_id: &PlayerId, now_ms: i64) -> u64 {
    if game.is_finished {
        if let Some(total) = game.playtime_totals.get(player_id) {
            return *total;
        }
    }
    game.player_sessions
        .get(player_id)
        .map_or(0, |session| {
            session.accumulated_seconds
                + session
                    .last_on_ms
                    .map_or(0, |last_on_ms| clock::interval_seconds(last_on_ms, now_ms))
        })
}
