//! Character Session
//!
//! Holds the currently loaded character and routes every edit through the
//! undo controller and the repository: snapshot, merge, persist.

use tracing::{debug, instrument};

use super::undo::{UndoClaim, UndoController};
use crate::database::models::{Character, CharacterPatch};
use crate::database::{CharacterRepository, StoreResult};

/// Result of [`CharacterSession::undo`].
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// The snapshot was restored and persisted.
    Restored(Character),
    /// The pending undo belonged to another character and was dropped.
    Discarded,
    /// Nothing to undo.
    Nothing,
}

/// The active character plus its undo slot.
pub struct CharacterSession<R: CharacterRepository> {
    repository: R,
    undo: UndoController,
    current: Option<Character>,
}

impl<R: CharacterRepository> CharacterSession<R> {
    pub fn new(repository: R, undo: UndoController) -> Self {
        Self {
            repository,
            undo,
            current: None,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn undo_controller(&self) -> &UndoController {
        &self.undo
    }

    pub fn current(&self) -> Option<&Character> {
        self.current.as_ref()
    }

    /// Make the character with `id` current and remember it as the last one.
    ///
    /// A pending undo for any other character is discarded. Unknown ids leave
    /// the session unchanged and return `None`.
    #[instrument(skip(self))]
    pub async fn load(&mut self, id: &str) -> StoreResult<Option<&Character>> {
        let Some(character) = self.repository.get_character(id).await? else {
            return Ok(None);
        };
        self.undo.on_character_switch(&character.id);
        self.repository.set_last_character_id(&character.id).await?;
        self.current = Some(character);
        Ok(self.current.as_ref())
    }

    /// Load the last active character, if it still exists.
    pub async fn resume(&mut self) -> StoreResult<Option<&Character>> {
        match self.repository.get_last_character_id().await? {
            Some(id) => self.load(&id).await,
            None => Ok(None),
        }
    }

    /// Drop the current character and any pending undo.
    pub fn unload(&mut self) {
        self.undo.dismiss();
        self.current = None;
    }

    /// Merge `patch` into the current character and persist it.
    ///
    /// A `description` arms the undo slot with the pre-edit state; edits
    /// without one (notes, page bookmarks) leave the slot alone. Returns
    /// `None` when no character is loaded.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &mut self,
        patch: &CharacterPatch,
        description: Option<&str>,
    ) -> StoreResult<Option<Character>> {
        let Some(current) = self.current.as_ref() else {
            return Ok(None);
        };

        let mut next = current.clone();
        next.apply_patch(patch);
        if let Some(description) = description {
            self.undo.arm(current, description);
        }

        match self.repository.save_character(&next).await {
            Ok(saved) => {
                self.current = Some(saved.clone());
                Ok(Some(saved))
            }
            Err(e) => {
                if description.is_some() {
                    self.undo.dismiss();
                }
                Err(e)
            }
        }
    }

    /// Restore the pre-edit snapshot if it belongs to the current character.
    ///
    /// The snapshot stays armed until the restore is saved; after a storage
    /// error the undo can be retried while the window is open.
    #[instrument(skip(self))]
    pub async fn undo(&mut self) -> StoreResult<UndoOutcome> {
        let current_id = self.current.as_ref().map(|c| c.id.clone());
        match self.undo.claim(current_id.as_deref()) {
            UndoClaim::Restore(entry) => {
                debug!(description = %entry.description, "Restoring snapshot");
                let saved = self.repository.save_character(&entry.previous_state).await?;
                self.undo.complete(&entry);
                self.current = Some(saved.clone());
                Ok(UndoOutcome::Restored(saved))
            }
            UndoClaim::Stale(_) => Ok(UndoOutcome::Discarded),
            UndoClaim::Empty => Ok(UndoOutcome::Nothing),
        }
    }

    pub fn dismiss_undo(&self) -> bool {
        self.undo.dismiss()
    }
}
