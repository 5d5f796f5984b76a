//! Core Character Records
//!
//! Identity and progress fields shared by every ruleset, plus the tagged
//! ruleset payload carried by each character.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classic::{ClassicPatch, ClassicSheet};

// ============================================================================
// Game System Tag
// ============================================================================

/// Ruleset tag persisted in the `gameSystem` field of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameSystem {
    #[serde(rename = "adventure-book-classic")]
    AdventureBookClassic,
}

impl GameSystem {
    pub fn id(&self) -> &'static str {
        match self {
            Self::AdventureBookClassic => "adventure-book-classic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AdventureBookClassic => "Adventure Book Classic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "adventure-book-classic" | "classic" => Some(Self::AdventureBookClassic),
            _ => None,
        }
    }

    /// List all implemented systems
    pub fn all_systems() -> Vec<GameSystem> {
        vec![Self::AdventureBookClassic]
    }
}

// ============================================================================
// Character Record
// ============================================================================

/// Ruleset-specific part of a character, discriminated by `gameSystem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gameSystem")]
pub enum CharacterSheet {
    #[serde(rename = "adventure-book-classic")]
    Classic(ClassicSheet),
}

impl CharacterSheet {
    pub fn game_system(&self) -> GameSystem {
        match self {
            Self::Classic(_) => GameSystem::AdventureBookClassic,
        }
    }

    pub fn as_classic(&self) -> Option<&ClassicSheet> {
        match self {
            Self::Classic(sheet) => Some(sheet),
        }
    }

    pub fn as_classic_mut(&mut self) -> Option<&mut ClassicSheet> {
        match self {
            Self::Classic(sheet) => Some(sheet),
        }
    }
}

/// A persisted adventure-book character.
///
/// The common fields are all the envelope store and repository ever look
/// at; everything ruleset-specific lives in [`CharacterSheet`] and is
/// flattened into the same JSON object on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub book_title: String,
    pub current_page: u32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub sheet: CharacterSheet,
}

impl Character {
    /// Create a character around an existing sheet with a fresh id and timestamps.
    pub fn new(name: impl Into<String>, book_title: impl Into<String>, sheet: CharacterSheet) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            book_title: book_title.into(),
            current_page: 1,
            notes: String::new(),
            created_at: now,
            updated_at: now,
            sheet,
        }
    }

    pub fn game_system(&self) -> GameSystem {
        self.sheet.game_system()
    }

    /// Merge a partial update into this character (no clamping).
    ///
    /// A sheet patch for a different ruleset than the character's own is
    /// ignored.
    pub fn apply_patch(&mut self, patch: &CharacterPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(book_title) = &patch.book_title {
            self.book_title = book_title.clone();
        }
        if let Some(page) = patch.current_page {
            self.current_page = page;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        match (&patch.sheet, &mut self.sheet) {
            (Some(SheetPatch::Classic(p)), CharacterSheet::Classic(sheet)) => p.apply(sheet),
            (None, _) => {}
        }
    }
}

// ============================================================================
// Partial Updates
// ============================================================================

/// Partial update of a character; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub book_title: Option<String>,
    pub current_page: Option<u32>,
    pub notes: Option<String>,
    pub sheet: Option<SheetPatch>,
}

impl CharacterPatch {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            current_page: Some(page),
            ..Default::default()
        }
    }

    pub fn classic(patch: ClassicPatch) -> Self {
        Self {
            sheet: Some(SheetPatch::Classic(patch)),
            ..Default::default()
        }
    }
}

impl From<ClassicPatch> for CharacterPatch {
    fn from(patch: ClassicPatch) -> Self {
        Self::classic(patch)
    }
}

/// Ruleset-specific part of a [`CharacterPatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum SheetPatch {
    Classic(ClassicPatch),
}
