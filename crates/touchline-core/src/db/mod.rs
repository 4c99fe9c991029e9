//! Local key-value persistence on libSQL

mod connection;
mod kv_repository;
mod migrations;

pub use connection::Database;
pub use kv_repository::{KvRepository, LibSqlKvRepository};
