//! Optimistic-concurrency sync against a remote copy of the payload.
//!
//! Only one pull, push, or import runs at a time. A second call while one is
//! in flight is rejected with [`Error::SyncBusy`] instead of queueing. Local
//! state is only replaced after the remote response has been fully parsed
//! and validated.

mod remote;

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::export::{self, ExportFile};
use crate::models::{SyncPayload, Versionstamp};
use crate::services::MatchService;
use crate::state::SyncState;

pub use remote::{HttpRemoteStore, RemoteStore};

pub struct SyncEngine<R> {
    remote: R,
    service: MatchService,
    guard: Mutex<()>,
    state: watch::Sender<SyncState>,
}

impl<R: RemoteStore> SyncEngine<R> {
    pub fn new(remote: R, service: MatchService) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            remote,
            service,
            guard: Mutex::new(()),
            state,
        }
    }

    pub const fn service(&self) -> &MatchService {
        &self.service
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    fn acquire(&self) -> Result<MutexGuard<'_, ()>> {
        self.guard.try_lock().map_err(|_| {
            tracing::warn!("Rejected sync request while another is in flight");
            Error::SyncBusy
        })
    }

    async fn token(&self) -> Result<String> {
        self.service
            .store()
            .load_token()
            .await?
            .ok_or(Error::MissingToken)
    }

    fn settle<T>(&self, result: &Result<T>) {
        let state = match result {
            Ok(_) => SyncState::Synced,
            Err(error) => SyncState::Error(error.to_string()),
        };
        self.state.send_replace(state);
    }

    /// Replace local state with the remote copy. Pull always wins.
    pub async fn pull(&self) -> Result<Versionstamp> {
        let _guard = self.acquire()?;
        self.state.send_replace(SyncState::Pulling);
        let result = self.pull_locked().await;
        self.settle(&result);
        result
    }

    async fn pull_locked(&self) -> Result<Versionstamp> {
        let token = self.token().await?;
        let envelope = self.remote.fetch(&token).await?;
        self.service
            .replace_state(envelope.payload, Some(&envelope.versionstamp))
            .await?;

        tracing::info!(versionstamp = %envelope.versionstamp, "Pulled remote state");
        Ok(envelope.versionstamp)
    }

    /// Send local state to the remote, refusing when the remote moved on
    /// since the last sync.
    pub async fn push(&self) -> Result<Versionstamp> {
        let _guard = self.acquire()?;
        self.state.send_replace(SyncState::Pushing);
        let result = self.push_locked().await;
        self.settle(&result);
        result
    }

    async fn push_locked(&self) -> Result<Versionstamp> {
        let token = self.token().await?;
        let store = self.service.store();
        let local = store.load_versionstamp().await?;
        let remote = self.remote.fetch_versionstamp(&token).await?;

        if local != remote && !local.is_unsynced() {
            tracing::warn!(%local, %remote, "Refusing push: local copy is out of sync");
            return Err(Error::Conflict { local, remote });
        }

        let payload = self.service.snapshot().await;
        let versionstamp = self.remote.store(&token, &payload, &remote).await?;
        store.save_versionstamp(&versionstamp).await?;

        tracing::info!(%versionstamp, "Pushed local state");
        Ok(versionstamp)
    }

    /// Render the full local payload for a file download.
    pub async fn export<Tz>(&self, prefix: &str, at: &DateTime<Tz>) -> Result<ExportFile>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        export::export_payload(&self.service.snapshot().await, prefix, at)
    }

    /// Apply an exported document through the same validation as `pull`.
    pub async fn import(&self, bytes: &[u8]) -> Result<SyncPayload> {
        let _guard = self.acquire()?;
        export::import_payload(&self.service, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::engine::EngineConfig;
    use crate::models::{Match, PlayerId, Roster, ScoreType, SyncEnvelope};
    use crate::services::LocalStore;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct FakeState {
        versionstamp: u64,
        payload: SyncPayload,
        fail_next: Option<&'static str>,
        stores: usize,
    }

    #[derive(Clone, Default)]
    struct FakeRemote {
        state: Arc<StdMutex<FakeState>>,
    }

    impl FakeRemote {
        fn at(versionstamp: u64, payload: SyncPayload) -> Self {
            let remote = Self::default();
            {
                let mut state = remote.state.lock().unwrap();
                state.versionstamp = versionstamp;
                state.payload = payload;
            }
            remote
        }

        fn fail_next(&self, kind: &'static str) {
            self.state.lock().unwrap().fail_next = Some(kind);
        }

        fn take_failure(&self) -> Result<()> {
            match self.state.lock().unwrap().fail_next.take() {
                Some("network") => Err(Error::Network("HTTP 500".to_string())),
                Some(_) => Err(Error::Parse("garbage".to_string())),
                None => Ok(()),
            }
        }
    }

    impl RemoteStore for FakeRemote {
        async fn fetch(&self, _token: &str) -> Result<SyncEnvelope> {
            self.take_failure()?;
            let state = self.state.lock().unwrap();
            Ok(SyncEnvelope {
                versionstamp: Versionstamp::Number(state.versionstamp),
                payload: state.payload.clone(),
            })
        }

        async fn fetch_versionstamp(&self, _token: &str) -> Result<Versionstamp> {
            self.take_failure()?;
            Ok(Versionstamp::Number(self.state.lock().unwrap().versionstamp))
        }

        async fn store(
            &self,
            _token: &str,
            payload: &SyncPayload,
            expected: &Versionstamp,
        ) -> Result<Versionstamp> {
            self.take_failure()?;
            let mut state = self.state.lock().unwrap();
            let current = Versionstamp::Number(state.versionstamp);
            if *expected != current {
                return Err(Error::Conflict {
                    local: expected.clone(),
                    remote: current,
                });
            }
            state.versionstamp += 1;
            state.payload = payload.clone();
            state.stores += 1;
            Ok(Versionstamp::Number(state.versionstamp))
        }
    }

    async fn engine(remote: FakeRemote) -> SyncEngine<FakeRemote> {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.save_token(Some("secret")).await.unwrap();
        let service = MatchService::load(store, Roster::default(), EngineConfig::default())
            .await
            .unwrap();
        SyncEngine::new(remote, service)
    }

    fn remote_payload() -> SyncPayload {
        let mut game = Match::new("Hawks", false, 0, false);
        game.is_finished = true;
        game.elapsed_at_pause_ms = 4_800_000;
        SyncPayload {
            historic_matches: vec![game],
            ..SyncPayload::default()
        }
    }

    async fn local_versionstamp(engine: &SyncEngine<FakeRemote>) -> Versionstamp {
        engine.service().store().load_versionstamp().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_push_conflicts_until_pulled() {
        let remote = FakeRemote::at(4, remote_payload());
        let engine = engine(remote.clone()).await;
        engine
            .service()
            .store()
            .save_versionstamp(&Versionstamp::Number(3))
            .await
            .unwrap();

        let error = engine.push().await.unwrap_err();
        assert!(matches!(error, Error::Conflict { .. }));
        assert_eq!(remote.state.lock().unwrap().stores, 0);

        assert_eq!(engine.pull().await.unwrap(), Versionstamp::Number(4));
        assert_eq!(local_versionstamp(&engine).await, Versionstamp::Number(4));
        assert_eq!(engine.service().snapshot().await, remote_payload());

        assert_eq!(engine.push().await.unwrap(), Versionstamp::Number(5));
        assert_eq!(local_versionstamp(&engine).await, Versionstamp::Number(5));
        assert_eq!(engine.state(), SyncState::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pulled_match_without_sessions_still_tracks_playtime() {
        let live = Match::new("Hawks", true, 0, false);
        assert!(live.player_sessions.is_empty());
        let remote = FakeRemote::at(
            2,
            SyncPayload {
                active_match: Some(live),
                ..SyncPayload::default()
            },
        );
        let engine = engine(remote).await;
        engine.pull().await.unwrap();

        let totals = engine
            .service()
            .apply(|machine| {
                machine.pause(45_000)?;
                machine
                    .finish_match(90_000)
                    .map(|game| game.playtime_totals.clone())
            })
            .await
            .unwrap();
        assert_eq!(totals.len(), Roster::default().players().len());
        assert_eq!(totals[&PlayerId::from("p01")], 45);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_after_pull_does_not_conflict() {
        let engine = engine(FakeRemote::at(9, remote_payload())).await;
        engine.pull().await.unwrap();

        engine
            .service()
            .apply(|machine| machine.start_match("Eagles", true, 0))
            .await
            .unwrap();
        engine
            .service()
            .apply(|machine| machine.record_score(&PlayerId::from("p01"), ScoreType::Try, 1))
            .await
            .unwrap();

        assert_eq!(engine.push().await.unwrap(), Versionstamp::Number(10));
        assert_eq!(engine.push().await.unwrap(), Versionstamp::Number(11));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn never_synced_client_may_push() {
        let remote = FakeRemote::at(4, SyncPayload::default());
        let engine = engine(remote.clone()).await;

        assert_eq!(engine.push().await.unwrap(), Versionstamp::Number(5));
        assert_eq!(remote.state.lock().unwrap().stores, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_pull_leaves_state_untouched() {
        let remote = FakeRemote::at(4, remote_payload());
        let engine = engine(remote.clone()).await;
        engine
            .service()
            .apply(|machine| machine.start_match("Eagles", true, 0))
            .await
            .unwrap();
        let before = engine.service().snapshot().await;

        remote.fail_next("network");
        assert!(matches!(engine.pull().await, Err(Error::Network(_))));
        remote.fail_next("parse");
        assert!(matches!(engine.pull().await, Err(Error::Parse(_))));

        assert_eq!(engine.service().snapshot().await, before);
        assert!(local_versionstamp(&engine).await.is_unsynced());
        assert!(matches!(engine.state(), SyncState::Error(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_remote_payload_is_rejected() {
        let mut payload = remote_payload();
        payload.historic_matches[0].is_finished = false;
        let engine = engine(FakeRemote::at(4, payload)).await;

        assert!(matches!(engine.pull().await, Err(Error::Validation(_))));
        assert_eq!(engine.service().snapshot().await, SyncPayload::default());
        assert!(local_versionstamp(&engine).await.is_unsynced());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_sync_is_rejected_and_guard_released() {
        let engine = engine(FakeRemote::at(1, SyncPayload::default())).await;

        {
            let _held = engine.guard.try_lock().unwrap();
            assert!(matches!(engine.pull().await, Err(Error::SyncBusy)));
            assert!(matches!(engine.push().await, Err(Error::SyncBusy)));
            assert!(matches!(engine.import(b"{}").await, Err(Error::SyncBusy)));
        }

        engine.pull().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn guard_is_released_after_failure() {
        let remote = FakeRemote::at(1, SyncPayload::default());
        let engine = engine(remote.clone()).await;

        remote.fail_next("network");
        assert!(engine.pull().await.is_err());
        assert!(engine.pull().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_token_is_reported() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let service = MatchService::load(store, Roster::default(), EngineConfig::default())
            .await
            .unwrap();
        let engine = SyncEngine::new(FakeRemote::default(), service);

        assert!(matches!(engine.pull().await, Err(Error::MissingToken)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn import_twice_yields_same_state() {
        let engine = engine(FakeRemote::default()).await;
        let file = export::export_payload(&remote_payload(), "rug", &chrono::Utc::now()).unwrap();

        engine.import(file.contents.as_bytes()).await.unwrap();
        let first = engine.service().snapshot().await;
        engine.import(file.contents.as_bytes()).await.unwrap();
        let second = engine.service().snapshot().await;

        assert_eq!(first, second);
        assert_eq!(first, remote_payload());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bad_import_leaves_state_untouched() {
        let engine = engine(FakeRemote::default()).await;
        engine
            .service()
            .apply(|machine| machine.start_match("Eagles", true, 0))
            .await
            .unwrap();
        let before = engine.service().snapshot().await;

        assert!(matches!(
            engine.import(b"not json").await,
            Err(Error::Parse(_))
        ));
        assert_eq!(engine.service().snapshot().await, before);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn export_renders_current_snapshot() {
        let engine = engine(FakeRemote::default()).await;
        engine
            .service()
            .apply(|machine| machine.start_match("Eagles", true, 0))
            .await
            .unwrap();

        let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let file = engine.export("rug", &at).await.unwrap();
        assert_eq!(file.file_name, "rug-2024-05-01:09:30:00.json");
        assert_eq!(
            SyncPayload::from_import_bytes(file.contents.as_bytes()).unwrap(),
            engine.service().snapshot().await
        );
    }
}
