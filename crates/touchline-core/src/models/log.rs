//! Substitution and tackle log entries

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlayerId;

/// Direction of a substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    On,
    Off,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

/// A player coming on or going off. Stored newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionEvent {
    pub id: String,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    pub name: String,
    #[serde(alias = "type")]
    pub direction: Direction,
    #[serde(default, alias = "time")]
    pub wall_clock_label: String,
}

impl SubstitutionEvent {
    pub fn new(
        player_id: PlayerId,
        name: impl Into<String>,
        direction: Direction,
        wall_clock_label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            player_id: Some(player_id),
            name: name.into(),
            direction,
            wall_clock_label: wall_clock_label.into(),
        }
    }
}

/// One tackle. Stored newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TackleEvent {
    pub id: String,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    pub name: String,
    #[serde(default, alias = "time")]
    pub wall_clock_label: String,
}

impl TackleEvent {
    pub fn new(
        player_id: PlayerId,
        name: impl Into<String>,
        wall_clock_label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            player_id: Some(player_id),
            name: name.into(),
            wall_clock_label: wall_clock_label.into(),
        }
    }
}
