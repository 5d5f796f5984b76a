//! In-memory backing medium for tests and ephemeral use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use super::BackingStore;
use crate::database::StoreResult;

/// In-memory key-value medium.
///
/// Clones share the same map, so a test can keep a handle to inspect or
/// tamper with the raw stored text while a store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackingStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackingStore {
    /// Create a new empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a medium with `contents` already stored under `key`.
    pub fn with_contents(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(key.into(), contents.into());
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Raw text currently stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    /// Overwrite the raw text under `key`, bypassing any store.
    pub async fn put_raw(&self, key: &str, contents: impl Into<String>) {
        self.inner.write().await.insert(key.to_string(), contents.into());
    }

    /// Get the number of stored keys.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    #[instrument(skip(self, contents))]
    async fn save(&self, key: &str, contents: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
