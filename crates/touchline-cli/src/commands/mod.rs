pub mod common;
pub mod completions;
pub mod export;
pub mod game;
pub mod history;
pub mod status;
pub mod sync;
