//! Player reference data

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a squad player (e.g. `p01`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A squad member. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.into(),
        }
    }
}

const DEFAULT_SQUAD: [(&str, &str); 15] = [
    ("p01", "Ben"),
    ("p02", "Cory"),
    ("p03", "Declan"),
    ("p04", "Elmer"),
    ("p05", "George"),
    ("p06", "Jack B"),
    ("p07", "Jack E"),
    ("p08", "Joe"),
    ("p09", "Maksym"),
    ("p10", "Oscar"),
    ("p11", "Sam"),
    ("p12", "Spenser"),
    ("p13", "Sully"),
    ("p14", "Teddy"),
    ("p15", "Zeke"),
];

/// Static reference list of players supplied to the match engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Build a roster, rejecting empty or duplicate ids.
    pub fn new(players: Vec<Player>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for player in &players {
            if player.id.as_str().trim().is_empty() {
                return Err("roster player id must not be empty".to_string());
            }
            if !seen.insert(player.id.clone()) {
                return Err(format!("duplicate roster player id '{}'", player.id));
            }
        }
        Ok(Self { players })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| &player.id == id)
    }

    /// Display name for an id, falling back to `Unknown Player`.
    pub fn name_of(&self, id: &PlayerId) -> String {
        self.get(id)
            .map_or_else(|| "Unknown Player".to_string(), |player| player.name.clone())
    }

    /// Look a player up by exact id or case-insensitive name.
    pub fn resolve(&self, query: &str) -> Option<&Player> {
        let query = query.trim();
        self.players
            .iter()
            .find(|player| player.id.as_str() == query)
            .or_else(|| {
                self.players
                    .iter()
                    .find(|player| player.name.eq_ignore_ascii_case(query))
            })
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            players: DEFAULT_SQUAD
                .iter()
                .map(|(id, name)| Player::new(*id, *name))
                .collect(),
        }
    }
}
