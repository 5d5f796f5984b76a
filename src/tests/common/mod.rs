//! Common Test Utilities
//!
//! Shared test helpers and fixtures used across test modules.

pub mod fixtures;

pub use fixtures::*;
