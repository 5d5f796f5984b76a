//! Character repository operations
//!
//! CRUD over characters layered on the [`EnvelopeStore`]. The repository only
//! touches the common identity fields; ruleset payloads pass through after
//! being clamped by their ruleset.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use super::backend::{BackingStore, FileBackingStore, MemoryBackingStore};
use super::envelope::{Envelope, EnvelopeStore};
use super::models::Character;
use super::StoreResult;
use crate::core::rules;

/// Asynchronous character persistence, independent of the backing medium.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// All characters in insertion order.
    async fn get_characters(&self) -> StoreResult<Vec<Character>>;

    /// The character with `id`, or `None`.
    async fn get_character(&self, id: &str) -> StoreResult<Option<Character>>;

    /// Upsert by id: replace in place if present, append otherwise.
    ///
    /// `updated_at` is always overwritten with the current time; the stored
    /// copy is returned.
    async fn save_character(&self, character: &Character) -> StoreResult<Character>;

    /// Remove the character with `id`. Returns whether anything was removed.
    ///
    /// Deleting the active character moves the pointer to the first remaining
    /// character, or clears it.
    async fn delete_character(&self, id: &str) -> StoreResult<bool>;

    async fn get_last_character_id(&self) -> StoreResult<Option<String>>;

    /// Set the active-character pointer. The id is not checked against the
    /// character list.
    async fn set_last_character_id(&self, id: &str) -> StoreResult<()>;

    /// Pretty-printed envelope for backups.
    async fn export_data(&self) -> StoreResult<String>;

    /// Replace everything with an exported envelope.
    async fn import_data(&self, text: &str) -> StoreResult<()>;
}

/// [`CharacterRepository`] backed by an [`EnvelopeStore`].
pub struct EnvelopeRepository<B: BackingStore> {
    store: EnvelopeStore<B>,
}

/// Repository over an in-memory medium.
pub type MemoryRepository = EnvelopeRepository<MemoryBackingStore>;

/// Repository over JSON files in a data directory.
pub type FileRepository = EnvelopeRepository<FileBackingStore>;

impl<B: BackingStore> EnvelopeRepository<B> {
    /// Wrap `store`, clamping every character it reads or imports with the
    /// registered rulesets.
    pub fn new(store: EnvelopeStore<B>) -> Self {
        Self {
            store: store.with_normalizer(|character| rules::registry().normalize(character)),
        }
    }

    pub fn store(&self) -> &EnvelopeStore<B> {
        &self.store
    }

    /// Full envelope, as currently stored.
    pub async fn envelope(&self) -> StoreResult<Envelope> {
        self.store.read().await
    }
}

impl MemoryRepository {
    /// Repository over a fresh in-memory medium.
    pub fn in_memory() -> Self {
        Self::new(EnvelopeStore::new(MemoryBackingStore::new()))
    }
}

#[async_trait]
impl<B: BackingStore> CharacterRepository for EnvelopeRepository<B> {
    async fn get_characters(&self) -> StoreResult<Vec<Character>> {
        Ok(self.store.read().await?.characters)
    }

    async fn get_character(&self, id: &str) -> StoreResult<Option<Character>> {
        let envelope = self.store.read().await?;
        Ok(envelope.find(id).cloned())
    }

    #[instrument(skip(self, character), fields(id = %character.id))]
    async fn save_character(&self, character: &Character) -> StoreResult<Character> {
        let mut envelope = self.store.read().await?;

        let mut stored = character.clone();
        rules::registry().normalize(&mut stored);
        stored.updated_at = Utc::now();

        match envelope.position(&stored.id) {
            Some(index) => envelope.characters[index] = stored.clone(),
            None => {
                debug!("Appending new character");
                envelope.characters.push(stored.clone());
            }
        }

        self.store.write(&mut envelope).await?;
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete_character(&self, id: &str) -> StoreResult<bool> {
        let mut envelope = self.store.read().await?;
        let Some(index) = envelope.position(id) else {
            return Ok(false);
        };

        envelope.characters.remove(index);
        if envelope.last_character_id.as_deref() == Some(id) {
            envelope.last_character_id = envelope.characters.first().map(|c| c.id.clone());
            debug!(last_character_id = ?envelope.last_character_id, "Reassigned active character");
        }

        self.store.write(&mut envelope).await?;
        info!("Deleted character");
        Ok(true)
    }

    async fn get_last_character_id(&self) -> StoreResult<Option<String>> {
        Ok(self.store.read().await?.last_character_id)
    }

    async fn set_last_character_id(&self, id: &str) -> StoreResult<()> {
        let mut envelope = self.store.read().await?;
        envelope.last_character_id = Some(id.to_string());
        self.store.write(&mut envelope).await
    }

    async fn export_data(&self) -> StoreResult<String> {
        self.store.export_data().await
    }

    async fn import_data(&self, text: &str) -> StoreResult<()> {
        self.store.import_data(text).await.map(|_| ())
    }
}
