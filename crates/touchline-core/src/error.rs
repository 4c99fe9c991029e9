//! Error types for touchline-core

use thiserror::Error;

use crate::models::Versionstamp;

/// Result type alias using touchline-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in touchline-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Command is not valid for the current match state
    #[error("Invalid command: {0}")]
    Validation(String),

    /// Command targets a match that has already finished
    #[error("Match is already finished")]
    MatchFinished,

    /// Local versionstamp is stale relative to the remote copy
    #[error("Cannot send - out of sync (local {local}, remote {remote})")]
    Conflict {
        local: Versionstamp,
        remote: Versionstamp,
    },

    /// Transport or status failure talking to the sync endpoint
    #[error("Sync request failed: {0}")]
    Network(String),

    /// Malformed remote, stored, or imported payload
    #[error("Cannot understand payload: {0}")]
    Parse(String),

    /// Another pull/push is still in flight
    #[error("Sync already in progress")]
    SyncBusy,

    /// No bearer token has been stored yet
    #[error("No sync token set. Run `touchline token set <token>` first.")]
    MissingToken,

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure is expected to clear up on retry without user action.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::SyncBusy)
    }
}
