//! touchline-core - Core library for Touchline
//!
//! This crate contains the match model, the clock and event ledger, the match
//! state machine, local persistence, and the sync engine used by every
//! Touchline front end.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod services;
pub mod state;
pub mod summary;
pub mod sync;
pub mod util;

pub use engine::{EngineConfig, MatchPhase, MatchStateMachine};
pub use error::{Error, Result};
pub use models::{Match, MatchId, PlayerId, Roster, ScoreType, SyncPayload, Versionstamp};
