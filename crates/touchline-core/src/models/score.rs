//! Scoring events and the points rule table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlayerId;

/// Kind of score. Points are fixed per kind, see [`ScoreType::points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreType {
    Try,
    Conversion,
    Penalty,
    DropGoal,
}

impl ScoreType {
    pub const ALL: [Self; 4] = [Self::Try, Self::Conversion, Self::Penalty, Self::DropGoal];

    /// Rule table. Only consulted when an event is created.
    pub const fn points(self) -> u32 {
        match self {
            Self::Try => 5,
            Self::Conversion => 2,
            Self::Penalty | Self::DropGoal => 3,
        }
    }

    /// Wire name, as used in `scoreEvents[].type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Try => "try",
            Self::Conversion => "conversion",
            Self::Penalty => "penalty",
            Self::DropGoal => "dropGoal",
        }
    }

    /// Upper-case label shown in the score log.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Try => "TRY",
            Self::Conversion => "CONVERSION",
            Self::Penalty => "PENALTY",
            Self::DropGoal => "DROPGOAL",
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "try" => Ok(Self::Try),
            "conversion" | "con" => Ok(Self::Conversion),
            "penalty" | "pen" => Ok(Self::Penalty),
            "dropgoal" | "drop" => Ok(Self::DropGoal),
            _ => Err(format!(
                "unknown score type '{s}' (expected try, conversion, penalty, dropGoal)"
            )),
        }
    }
}

/// One recorded score. `points` is authoritative once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub id: String,
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(rename = "type")]
    pub score_type: ScoreType,
    pub points: u32,
    #[serde(alias = "timestamp")]
    pub timestamp_ms: i64,
}

impl ScoreEvent {
    pub fn new(player_id: PlayerId, score_type: ScoreType, timestamp_ms: i64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            player_id,
            player_name: None,
            score_type,
            points: score_type.points(),
            timestamp_ms,
        }
    }

    #[must_use]
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }
}

/// Display row of the score log. Always derived from a [`ScoreEvent`]
/// except for legacy rows carried over from imported payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLogEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    pub name: String,
    #[serde(rename = "type")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, alias = "time")]
    pub wall_clock_label: String,
}

impl ScoreLogEntry {
    /// Score type named by the label, if it is one we know.
    pub fn score_type(&self) -> Option<ScoreType> {
        self.label.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_points() {
        assert_eq!(ScoreType::Try.points(), 5);
        assert_eq!(ScoreType::Conversion.points(), 2);
        assert_eq!(ScoreType::Penalty.points(), 3);
        assert_eq!(ScoreType::DropGoal.points(), 3);
    }

    #[test]
    fn score_type_parses_labels_and_wire_names() {
        assert_eq!("TRY".parse::<ScoreType>().unwrap(), ScoreType::Try);
        assert_eq!("dropGoal".parse::<ScoreType>().unwrap(), ScoreType::DropGoal);
        assert_eq!("drop-goal".parse::<ScoreType>().unwrap(), ScoreType::DropGoal);
        assert_eq!("DROPGOAL".parse::<ScoreType>().unwrap(), ScoreType::DropGoal);
        assert!("touchdown".parse::<ScoreType>().is_err());
    }

    #[test]
    fn score_event_accepts_legacy_timestamp_field() {
        let raw = r#"{"id":"e1","playerId":"p01","type":"try","points":7,"timestamp":42}"#;
        let event: ScoreEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.timestamp_ms, 42);
        assert_eq!(event.points, 7);
        assert_eq!(event.score_type, ScoreType::Try);
    }

    #[test]
    fn new_event_takes_points_from_rule_table() {
        let event = ScoreEvent::new(PlayerId::from("p01"), ScoreType::Conversion, 10);
        assert_eq!(event.points, 2);
        assert!(!event.id.is_empty());
    }
}
