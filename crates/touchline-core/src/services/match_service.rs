//! Durable wrapper around the match state machine.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine::{EngineConfig, MatchStateMachine};
use crate::error::Result;
use crate::models::{Roster, SyncPayload, Versionstamp};

use super::LocalStore;

/// Applies commands to a copy of the state machine, persists the resulting
/// snapshot, and only then commits it. A failed command or a failed write
/// leaves the in-memory state unchanged.
#[derive(Clone)]
pub struct MatchService {
    store: LocalStore,
    engine: Arc<Mutex<MatchStateMachine>>,
}

impl MatchService {
    /// Build the service from whatever the store currently holds.
    pub async fn load(store: LocalStore, roster: Roster, config: EngineConfig) -> Result<Self> {
        let payload = store.load_payload().await?;
        let mut engine = MatchStateMachine::new(roster, config);
        engine.replace_state(payload)?;

        Ok(Self {
            store,
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Run a mutating command and persist its outcome.
    pub async fn apply<T>(
        &self,
        command: impl FnOnce(&mut MatchStateMachine) -> Result<T>,
    ) -> Result<T> {
        let mut engine = self.engine.lock().await;
        let mut next = engine.clone();
        let output = command(&mut next)?;

        self.store.save_payload(&next.snapshot()).await?;
        *engine = next;
        Ok(output)
    }

    /// Run a read-only query against the current state.
    pub async fn read<T>(&self, query: impl FnOnce(&MatchStateMachine) -> T) -> T {
        let engine = self.engine.lock().await;
        query(&engine)
    }

    pub async fn snapshot(&self) -> SyncPayload {
        self.engine.lock().await.snapshot()
    }

    /// Replace the whole state (pull/import). When a versionstamp is given
    /// it is persisted in the same write.
    pub async fn replace_state(
        &self,
        payload: SyncPayload,
        versionstamp: Option<&Versionstamp>,
    ) -> Result<()> {
        let mut engine = self.engine.lock().await;
        let mut next = engine.clone();
        next.replace_state(payload)?;

        let snapshot = next.snapshot();
        match versionstamp {
            Some(versionstamp) => self.store.save_synced(&snapshot, versionstamp).await?,
            None => self.store.save_payload(&snapshot).await?,
        }
        *engine = next;
        Ok(())
    }
}
