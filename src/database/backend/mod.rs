//! Backing media for the envelope store.
//!
//! This module provides the [`BackingStore`] trait and two implementations:
//!
//! - [`FileBackingStore`] - One JSON file per key under a data directory
//! - [`MemoryBackingStore`] - In-memory map for tests and ephemeral use
//!
//! A backing medium is a dumb key-value store of text. It knows nothing
//! about envelopes, versions or characters; the [`EnvelopeStore`] layered on
//! top decides what the text means.
//!
//! [`EnvelopeStore`]: super::EnvelopeStore

mod file;
mod memory;

use async_trait::async_trait;

pub use file::FileBackingStore;
pub use memory::MemoryBackingStore;

use super::StoreResult;

/// Trait for key-value text storage media.
///
/// Implementations must be `Send + Sync` so a store can be shared behind an
/// `Arc`, even though the core only ever issues one operation at a time.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Load the text stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(text))` if something is stored under the key
    /// - `Ok(None)` if the key has never been written (or was removed)
    /// - `Err(_)` if the medium itself failed
    async fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace whatever is stored under `key` with `contents`.
    ///
    /// Writes are whole-value overwrites; there is no partial update.
    async fn save(&self, key: &str, contents: &str) -> StoreResult<()>;

    /// Remove the value stored under `key`.
    ///
    /// Returns `Ok(())` even if nothing was stored.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Name of this medium, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket implementation for `Arc<T>` where T: BackingStore
#[async_trait]
impl<T: BackingStore + ?Sized> BackingStore for std::sync::Arc<T> {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, contents: &str) -> StoreResult<()> {
        (**self).save(key, contents).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Blanket implementation for `Box<T>` where T: BackingStore
#[async_trait]
impl<T: BackingStore + ?Sized> BackingStore for Box<T> {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, contents: &str) -> StoreResult<()> {
        (**self).save(key, contents).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
