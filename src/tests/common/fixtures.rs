//! Test Fixtures
//!
//! Provides shared helpers for creating characters, repositories and
//! sessions over in-memory or temporary-directory storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::core::rules::classic::{new_classic_character, ClassicCreation};
use crate::core::session::CharacterSession;
use crate::core::undo::UndoController;
use crate::database::{
    BackingStore, Character, EnvelopeRepository, EnvelopeStore, FileBackingStore, FileRepository,
    MemoryBackingStore, MemoryRepository, StoreError, StoreResult,
};

// =============================================================================
// Character Fixtures
// =============================================================================

/// Classic character with skill 10, stamina 20 and luck 9.
pub fn create_test_character(name: &str) -> Character {
    create_character_with_stats(name, 10, 20, 9)
}

pub fn create_character_with_stats(name: &str, skill: i32, stamina: i32, luck: i32) -> Character {
    new_classic_character(
        name,
        "The Citadel of Chaos",
        ClassicCreation {
            skill,
            stamina,
            luck,
        },
    )
}

// =============================================================================
// Repository Fixtures
// =============================================================================

/// Repository over a fresh in-memory medium.
pub fn create_test_repository() -> MemoryRepository {
    MemoryRepository::in_memory()
}

/// Repository sharing `backend`, so tests can inspect or corrupt the raw text.
pub fn create_repository_on(backend: &MemoryBackingStore) -> MemoryRepository {
    EnvelopeRepository::new(EnvelopeStore::new(backend.clone()))
}

/// Repository over JSON files in a temporary directory.
/// Returns both the repository and the TempDir (which must be kept alive).
pub fn create_file_repository() -> (FileRepository, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = EnvelopeStore::new(FileBackingStore::new(temp_dir.path()));
    (EnvelopeRepository::new(store), temp_dir)
}

/// In-memory medium whose writes fail while `fail_writes` is set.
#[derive(Debug, Clone, Default)]
pub struct FailingBackingStore {
    inner: MemoryBackingStore,
    fail_writes: Arc<AtomicBool>,
}

impl FailingBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackingStore for FailingBackingStore {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, contents: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.save(key, contents).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// =============================================================================
// Session Fixtures
// =============================================================================

pub fn create_test_session() -> CharacterSession<MemoryRepository> {
    create_session_with_window(Duration::from_secs(5))
}

pub fn create_session_with_window(window: Duration) -> CharacterSession<MemoryRepository> {
    CharacterSession::new(create_test_repository(), UndoController::new(window))
}

/// Session over `backend`, sharing its write-failure switch.
pub fn create_session_on(
    backend: &FailingBackingStore,
) -> CharacterSession<EnvelopeRepository<FailingBackingStore>> {
    CharacterSession::new(
        EnvelopeRepository::new(EnvelopeStore::new(backend.clone())),
        UndoController::new(Duration::from_secs(5)),
    )
}
