use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] touchline_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
    #[error("Match not found for id/prefix: {0}")]
    MatchNotFound(String),
    #[error("{0}")]
    AmbiguousMatchId(String),
    #[error("Token cannot be empty")]
    EmptyToken,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Set `sync_url` in config.json or the TOUCHLINE_SYNC_URL environment variable."
    )]
    SyncNotConfigured,
}
