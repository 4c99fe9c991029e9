//! Typed access to the persisted local state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{Database, KvRepository, LibSqlKvRepository};
use crate::error::{Error, Result};
use crate::models::{Match, SyncPayload, UiFlags, Versionstamp};

const ACTIVE_MATCH_KEY: &str = "activeGame";
const HISTORY_KEY: &str = "rugby_history";
const VERSIONSTAMP_KEY: &str = "versionstamp";
const TOKEN_KEY: &str = "api_key";
const UI_FLAGS_KEY: &str = "ui_flags";

/// Thread-safe key-value store holding the active match, history,
/// versionstamp, bearer token and UI flags.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open a store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::debug!("Opened local store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = {
            let db = self.db.lock().await;
            LibSqlKvRepository::new(db.connection()).get(key).await?
        };
        raw.map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|error| Error::Parse(format!("stored {key} is corrupt: {error}")))
        })
        .transpose()
    }

    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        LibSqlKvRepository::new(db.connection()).get(key).await
    }

    async fn set_text(&self, key: &str, value: Option<&str>) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlKvRepository::new(db.connection());
        match value {
            Some(value) => repo.set(key, value).await,
            None => repo.delete(key).await,
        }
    }

    /// Read the full payload. Missing keys yield an empty state.
    pub async fn load_payload(&self) -> Result<SyncPayload> {
        let active_match = self.get_json::<Option<Match>>(ACTIVE_MATCH_KEY).await?.flatten();
        let historic_matches = self
            .get_json::<Vec<Match>>(HISTORY_KEY)
            .await?
            .unwrap_or_default();
        let ui = self.get_json::<UiFlags>(UI_FLAGS_KEY).await?.unwrap_or_default();

        Ok(SyncPayload {
            ui,
            active_match,
            historic_matches,
        })
    }

    /// Persist the full payload in one transaction. The active-match key is
    /// removed when no match is active.
    pub async fn save_payload(&self, payload: &SyncPayload) -> Result<()> {
        self.write(payload, None).await
    }

    /// Persist a payload together with the versionstamp it was synced at.
    pub async fn save_synced(&self, payload: &SyncPayload, versionstamp: &Versionstamp) -> Result<()> {
        self.write(payload, Some(versionstamp)).await
    }

    async fn write(&self, payload: &SyncPayload, versionstamp: Option<&Versionstamp>) -> Result<()> {
        let active = payload.active_match.as_ref().map(to_json).transpose()?;
        let history = to_json(&payload.historic_matches)?;
        let ui = to_json(&payload.ui)?;
        let stamp = versionstamp.map(to_json).transpose()?;

        let mut entries = vec![
            (ACTIVE_MATCH_KEY, active.as_deref()),
            (HISTORY_KEY, Some(history.as_str())),
            (UI_FLAGS_KEY, Some(ui.as_str())),
        ];
        if let Some(stamp) = stamp.as_deref() {
            entries.push((VERSIONSTAMP_KEY, Some(stamp)));
        }

        let db = self.db.lock().await;
        LibSqlKvRepository::new(db.connection())
            .set_many(&entries)
            .await?;
        tracing::debug!(
            has_active = payload.active_match.is_some(),
            history = payload.historic_matches.len(),
            "Persisted local state"
        );
        Ok(())
    }

    /// Last versionstamp seen from the remote; `UNSYNCED` when never synced.
    pub async fn load_versionstamp(&self) -> Result<Versionstamp> {
        Ok(self
            .get_json::<Versionstamp>(VERSIONSTAMP_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_versionstamp(&self, versionstamp: &Versionstamp) -> Result<()> {
        self.set_text(VERSIONSTAMP_KEY, Some(&to_json(versionstamp)?))
            .await
    }

    pub async fn load_token(&self) -> Result<Option<String>> {
        Ok(self
            .get_text(TOKEN_KEY)
            .await?
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()))
    }

    /// Store the bearer token; `None` or a blank value clears it.
    pub async fn save_token(&self, token: Option<&str>) -> Result<()> {
        let token = token.map(str::trim).filter(|token| !token.is_empty());
        self.set_text(TOKEN_KEY, token).await
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
