//! Durable services layered over the database and the state machine.

mod local_store;
mod match_service;

pub use local_store::LocalStore;
pub use match_service::MatchService;
