//! Data models for Touchline

mod log;
mod match_record;
mod player;
mod score;
mod snapshot;

pub use log::{Direction, SubstitutionEvent, TackleEvent};
pub use match_record::{Match, MatchId, PlayerSession};
pub use player::{Player, PlayerId, Roster};
pub use score::{ScoreEvent, ScoreLogEntry, ScoreType};
pub use snapshot::{SyncEnvelope, SyncPayload, UiFlags, Versionstamp};
