//! Client configuration.
//!
//! A single `ClientConfig` read from JSON by every front end. All fields are
//! optional in the file; missing values fall back to the match-day defaults.

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::models::{Player, Roster};
use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_EXPORT_PREFIX: &str = "rug";
const DEFAULT_TEAM_NAME: &str = "Southwell City";
const DEFAULT_OPPONENT_UNDO_POINTS: u32 = 5;
const SYNC_PATH: &str = "local-sync/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Base URL of the sync host, e.g. `https://rugby.example.com`.
    pub sync_url: Option<String>,
    pub start_paused: bool,
    pub opponent_undo_points: u32,
    pub export_prefix: String,
    pub team_name: String,
    /// Replaces the built-in squad when present.
    pub roster: Option<Vec<Player>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sync_url: None,
            start_paused: true,
            opponent_undo_points: DEFAULT_OPPONENT_UNDO_POINTS,
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            team_name: DEFAULT_TEAM_NAME.to_string(),
            roster: None,
        }
    }
}

impl ClientConfig {
    pub const fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            start_paused: self.start_paused,
            opponent_undo_points: self.opponent_undo_points,
        }
    }

    /// Configured roster, or the default squad.
    pub fn roster(&self) -> Result<Roster, String> {
        match &self.roster {
            Some(players) => Roster::new(players.clone()),
            None => Ok(Roster::default()),
        }
    }

    /// Full URL of the sync resource, if a host is configured.
    pub fn sync_endpoint(&self) -> Option<String> {
        let base = normalize_text_option(self.sync_url.clone())?;
        Some(format!("{}/{SYNC_PATH}", base.trim_end_matches('/')))
    }

    /// Override the sync host, e.g. from the environment.
    #[must_use]
    pub fn with_sync_url(mut self, sync_url: Option<String>) -> Self {
        if let Some(url) = normalize_text_option(sync_url) {
            self.sync_url = Some(url);
        }
        self
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = normalize_text_option(self.sync_url.clone()) {
            if !is_http_url(&url) {
                return Err("config field 'sync_url' must include http:// or https://".to_string());
            }
        }
        if self.export_prefix.trim().is_empty() {
            return Err("config field 'export_prefix' must not be empty".to_string());
        }
        if let Some(players) = &self.roster {
            if players.iter().any(|player| player.id.as_str().trim().is_empty()) {
                return Err("roster player ids must not be empty".to_string());
            }
        }
        self.roster().map(|_| ())
    }
}

/// Parse and validate a JSON config document.
pub fn parse_client_config(payload: &str) -> Result<ClientConfig, String> {
    let config: ClientConfig =
        serde_json::from_str(payload).map_err(|error| format!("invalid config JSON: {error}"))?;
    config.validate()?;
    Ok(config)
}
