//! Persistence layer
//!
//! Layers, bottom up:
//! - `backend` - key-value text media ([`MemoryBackingStore`], [`FileBackingStore`])
//! - `envelope` - the versioned container and its store ([`EnvelopeStore`])
//! - `migrations` - N to N+1 schema upgrades of raw envelopes
//! - `characters` - CRUD over characters ([`CharacterRepository`])

pub mod backend;
pub mod characters;
pub mod envelope;
pub mod error;
pub mod migrations;
pub mod models;

pub use backend::{BackingStore, FileBackingStore, MemoryBackingStore};
pub use characters::{CharacterRepository, EnvelopeRepository, FileRepository, MemoryRepository};
pub use envelope::{CorruptionPolicy, Envelope, EnvelopeStore, Normalizer, DEFAULT_STORAGE_KEY};
pub use error::{StoreError, StoreResult};
pub use migrations::{MigrationStep, CURRENT_VERSION};
pub use models::*;
