/// Gamebook Companion - character sheets for solo adventure books
///
/// Core library providing versioned character persistence, the classic
/// adventure-book ruleset, dice rolling and one-step undo.

pub mod config;
pub mod core;
pub mod database;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
