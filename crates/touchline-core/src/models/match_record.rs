//! Match aggregate and its wire representation

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PlayerId, ScoreEvent, ScoreLogEntry, SubstitutionEvent, TackleEvent};
use crate::util::wall_clock_label;

/// A unique identifier for a match, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Create a new unique match ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Open/closed interval tracking of one player's time on the field.
///
/// `last_on_ms` is set only while the player is on the field *and* the clock
/// is running; a paused match keeps `on_field` but closes the interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSession {
    pub on_field: bool,
    #[serde(default)]
    pub last_on_ms: Option<i64>,
    #[serde(default)]
    pub accumulated_seconds: u64,
}

impl PlayerSession {
    pub const fn is_open(&self) -> bool {
        self.last_on_ms.is_some()
    }
}

/// One recorded game: clock state, ledgers, and derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "MatchRecord", from = "MatchRecord")]
pub struct Match {
    pub id: MatchId,
    pub opponent_name: String,
    pub is_home: bool,
    /// Start of the current running interval (Unix ms).
    pub start_time_ms: i64,
    /// Set while paused; `None` means the clock is running (or finished).
    pub pause_time_ms: Option<i64>,
    /// Total elapsed so far; only a complete total while paused or finished.
    pub elapsed_at_pause_ms: i64,
    pub opponent_score: u32,
    pub is_finished: bool,
    pub score_events: Vec<ScoreEvent>,
    pub comments: String,
    pub tackle_counts: BTreeMap<PlayerId, u32>,
    pub sub_history: Vec<SubstitutionEvent>,
    pub tackle_history: Vec<TackleEvent>,
    /// Seconds on field per player, frozen at finish.
    pub playtime_totals: BTreeMap<PlayerId, u64>,
    pub player_sessions: BTreeMap<PlayerId, PlayerSession>,
    /// Score log rows from imported payloads whose ids match no event.
    pub legacy_score_log: Vec<ScoreLogEntry>,
}

impl Match {
    pub fn new(opponent_name: impl Into<String>, is_home: bool, now_ms: i64, paused: bool) -> Self {
        Self {
            id: MatchId::new(),
            opponent_name: opponent_name.into(),
            is_home,
            start_time_ms: now_ms,
            pause_time_ms: paused.then_some(now_ms),
            elapsed_at_pause_ms: 0,
            opponent_score: 0,
            is_finished: false,
            score_events: Vec::new(),
            comments: String::new(),
            tackle_counts: BTreeMap::new(),
            sub_history: Vec::new(),
            tackle_history: Vec::new(),
            playtime_totals: BTreeMap::new(),
            player_sessions: BTreeMap::new(),
            legacy_score_log: Vec::new(),
        }
    }

    pub const fn is_paused(&self) -> bool {
        !self.is_finished && self.pause_time_ms.is_some()
    }

    pub const fn is_running(&self) -> bool {
        !self.is_finished && self.pause_time_ms.is_none()
    }

    /// Score log view, newest first, projected from `score_events`.
    pub fn score_history(&self) -> Vec<ScoreLogEntry> {
        self.score_events
            .iter()
            .rev()
            .map(|event| ScoreLogEntry {
                id: event.id.clone(),
                player_id: Some(event.player_id.clone()),
                name: event
                    .player_name
                    .clone()
                    .unwrap_or_else(|| event.player_id.to_string()),
                label: event.score_type.label().to_string(),
                points: Some(event.points),
                wall_clock_label: wall_clock_label(event.timestamp_ms, false),
            })
            .collect()
    }
}

const fn default_true() -> bool {
    true
}

/// Wire form of [`Match`], including the projected `scoreHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchRecord {
    id: MatchId,
    #[serde(alias = "opponent")]
    opponent_name: String,
    #[serde(default = "default_true", alias = "home")]
    is_home: bool,
    start_time: i64,
    #[serde(default)]
    pause_time: Option<i64>,
    #[serde(default)]
    elapsed_time_at_pause: i64,
    #[serde(default)]
    opponent_score: u32,
    #[serde(default)]
    is_finished: bool,
    #[serde(default)]
    score_events: Vec<ScoreEvent>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default, alias = "tackles")]
    tackle_counts: BTreeMap<PlayerId, u32>,
    #[serde(default)]
    sub_history: Vec<SubstitutionEvent>,
    #[serde(default)]
    tackle_history: Vec<TackleEvent>,
    #[serde(default)]
    playtime_totals: BTreeMap<PlayerId, u64>,
    #[serde(default)]
    score_history: Vec<ScoreLogEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    player_sessions: BTreeMap<PlayerId, PlayerSession>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    legacy_score_log: Vec<ScoreLogEntry>,
}

impl From<Match> for MatchRecord {
    fn from(value: Match) -> Self {
        let score_history = value.score_history();
        Self {
            id: value.id,
            opponent_name: value.opponent_name,
            is_home: value.is_home,
            start_time: value.start_time_ms,
            pause_time: value.pause_time_ms,
            elapsed_time_at_pause: value.elapsed_at_pause_ms,
            opponent_score: value.opponent_score,
            is_finished: value.is_finished,
            score_events: value.score_events,
            comments: Some(value.comments),
            tackle_counts: value.tackle_counts,
            sub_history: value.sub_history,
            tackle_history: value.tackle_history,
            playtime_totals: value.playtime_totals,
            score_history,
            player_sessions: value.player_sessions,
            legacy_score_log: value.legacy_score_log,
        }
    }
}

impl From<MatchRecord> for Match {
    fn from(value: MatchRecord) -> Self {
        let event_ids = value
            .score_events
            .iter()
            .map(|event| event.id.as_str())
            .collect::<HashSet<_>>();
        let mut legacy_ids = HashSet::new();
        let legacy_score_log = value
            .legacy_score_log
            .into_iter()
            .chain(value.score_history)
            .filter(|entry| !event_ids.contains(entry.id.as_str()))
            .filter(|entry| legacy_ids.insert(entry.id.clone()))
            .collect();

        Self {
            id: value.id,
            opponent_name: value.opponent_name,
            is_home: value.is_home,
            start_time_ms: value.start_time,
            pause_time_ms: value.pause_time,
            elapsed_at_pause_ms: value.elapsed_time_at_pause,
            opponent_score: value.opponent_score,
            is_finished: value.is_finished,
            score_events: value.score_events,
            comments: value.comments.unwrap_or_default(),
            tackle_counts: value.tackle_counts,
            sub_history: value.sub_history,
            tackle_history: value.tackle_history,
            playtime_totals: value.playtime_totals,
            player_sessions: value.player_sessions,
            legacy_score_log,
        }
    }
}
