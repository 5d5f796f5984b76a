//! Error types for the persistence layer.
//!
//! One error type covers the backing medium, the envelope codec, migrations
//! and import validation.

use thiserror::Error;

/// Unified error type for persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing medium failure (read/write/remove).
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO error for file-backed media.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Import payload lacks the minimal envelope shape.
    #[error("Invalid import format: {0}")]
    Format(String),

    /// Persisted bytes could not be decoded and the store is configured to
    /// surface it instead of starting over.
    #[error("Stored data is corrupted: {0}")]
    Corrupted(String),

    /// Schema migration failure.
    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// Configuration error (unusable data directory, missing values).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an import format error with the given message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Create a migration error with the given message.
    pub fn migration(msg: impl Into<String>) -> Self {
        Self::Migration(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures caused by the caller's import payload.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

/// Result type alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;
