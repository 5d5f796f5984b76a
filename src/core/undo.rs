//! Undo Controller
//!
//! One-slot, time-boxed undo for described character mutations.
//!
//! The controller is either idle or armed with exactly one [`UndoEntry`].
//! Arming schedules an [`ExpiryTimer`] on the tokio runtime; every path that
//! supersedes the entry (re-arm, dismiss, expiry, undo, character switch,
//! shutdown) goes through one transition function that cancels the pending
//! timer before installing the next state.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::database::models::Character;

/// How long an armed undo stays available.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

// ============================================================================
// Undo Entry
// ============================================================================

/// Full pre-mutation snapshot of one character.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub character_id: String,
    pub previous_state: Character,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Public view of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoState {
    Idle,
    Armed(UndoEntry),
}

/// What [`UndoController::claim`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoClaim {
    /// The entry belongs to the current character and should be restored.
    Restore(Box<UndoEntry>),
    /// The entry belonged to another character and was discarded.
    Stale(Box<UndoEntry>),
    /// Nothing was armed.
    Empty,
}

// ============================================================================
// Expiry Timer
// ============================================================================

/// Handle to a scheduled expiry task. Cancelled on drop.
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: Option<JoinHandle<()>>,
}

impl ExpiryTimer {
    fn schedule<F>(window: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            on_expire();
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the task if it has not fired yet.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Release the handle without aborting; used by the task that fired.
    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Undo Controller
// ============================================================================

struct Armed {
    entry: UndoEntry,
    timer: ExpiryTimer,
}

#[derive(Default)]
struct Slot {
    armed: Option<Armed>,
    generation: u64,
}

/// Single-slot undo with automatic expiry.
///
/// [`arm`](Self::arm) must be called from within a tokio runtime.
pub struct UndoController {
    slot: Arc<Mutex<Slot>>,
    window: Duration,
}

impl UndoController {
    pub fn new(window: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
        // Slot holds no invariants a panicking holder could break halfway.
        slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The only way the slot changes: cancel whatever is pending, bump the
    /// generation and install `next`. Returns the superseded entry.
    fn transition(slot: &mut Slot, next: Option<Armed>) -> Option<UndoEntry> {
        slot.generation = slot.generation.wrapping_add(1);
        let previous = std::mem::replace(&mut slot.armed, next);
        previous.map(|mut armed| {
            armed.timer.cancel();
            armed.entry
        })
    }

    /// Snapshot `previous_state` before a described mutation, replacing any
    /// pending entry and restarting the expiry window.
    pub fn arm(&self, previous_state: &Character, description: impl Into<String>) {
        let entry = UndoEntry {
            character_id: previous_state.id.clone(),
            previous_state: previous_state.clone(),
            description: description.into(),
            timestamp: Utc::now(),
        };
        debug!(character_id = %entry.character_id, description = %entry.description, "Undo armed");

        let mut slot = Self::lock(&self.slot);
        let generation = slot.generation.wrapping_add(1);
        let weak = Arc::downgrade(&self.slot);
        let timer = ExpiryTimer::schedule(self.window, move || Self::expire(&weak, generation));

        if let Some(superseded) = Self::transition(&mut slot, Some(Armed { entry, timer })) {
            debug!(description = %superseded.description, "Undo superseded");
        }
    }

    fn expire(slot: &Weak<Mutex<Slot>>, generation: u64) {
        let Some(slot) = slot.upgrade() else {
            return;
        };
        let mut slot = Self::lock(&slot);
        if slot.generation != generation {
            return;
        }
        if let Some(armed) = slot.armed.as_mut() {
            armed.timer.disarm();
        }
        if let Some(entry) = Self::transition(&mut slot, None) {
            debug!(description = %entry.description, "Undo expired");
        }
    }

    /// Discard the pending entry. Returns whether one was armed.
    pub fn dismiss(&self) -> bool {
        let mut slot = Self::lock(&self.slot);
        let dismissed = Self::transition(&mut slot, None);
        if let Some(entry) = &dismissed {
            debug!(description = %entry.description, "Undo dismissed");
        }
        dismissed.is_some()
    }

    /// A character became current. Discards an entry that belongs to any
    /// other character; returns whether one was discarded.
    pub fn on_character_switch(&self, character_id: &str) -> bool {
        let mut slot = Self::lock(&self.slot);
        let stale = slot
            .armed
            .as_ref()
            .is_some_and(|a| a.entry.character_id != character_id);
        if !stale {
            return false;
        }
        if let Some(entry) = Self::transition(&mut slot, None) {
            debug!(from = %entry.character_id, to = %character_id, "Undo discarded on character switch");
        }
        true
    }

    /// Look up the pending entry for the character currently loaded.
    ///
    /// A matching entry is returned and stays armed until
    /// [`complete`](Self::complete) confirms the restore, so a restore that
    /// fails can be retried within the window. An entry for any other
    /// character is discarded.
    pub fn claim(&self, current_character_id: Option<&str>) -> UndoClaim {
        let mut slot = Self::lock(&self.slot);
        let Some(armed) = slot.armed.as_ref() else {
            return UndoClaim::Empty;
        };
        if current_character_id == Some(armed.entry.character_id.as_str()) {
            return UndoClaim::Restore(Box::new(armed.entry.clone()));
        }
        match Self::transition(&mut slot, None) {
            Some(entry) => {
                debug!(character_id = %entry.character_id, "Undo discarded, character no longer current");
                UndoClaim::Stale(Box::new(entry))
            }
            None => UndoClaim::Empty,
        }
    }

    /// The restore of `entry` was persisted. Goes idle if `entry` is still the
    /// armed one; returns whether it was.
    pub fn complete(&self, entry: &UndoEntry) -> bool {
        let mut slot = Self::lock(&self.slot);
        if !slot.armed.as_ref().is_some_and(|a| a.entry == *entry) {
            return false;
        }
        Self::transition(&mut slot, None);
        debug!(description = %entry.description, "Undo completed");
        true
    }

    /// Clone of the pending entry, if armed.
    pub fn pending(&self) -> Option<UndoEntry> {
        Self::lock(&self.slot).armed.as_ref().map(|a| a.entry.clone())
    }

    pub fn state(&self) -> UndoState {
        match self.pending() {
            Some(entry) => UndoState::Armed(entry),
            None => UndoState::Idle,
        }
    }

    pub fn is_armed(&self) -> bool {
        Self::lock(&self.slot).armed.is_some()
    }

    /// Cancel any pending expiry and go idle.
    pub fn shutdown(&self) {
        Self::transition(&mut Self::lock(&self.slot), None);
    }
}

impl Default for UndoController {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl Drop for UndoController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
