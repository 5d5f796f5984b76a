//! Persisted records: characters, their ruleset payloads and partial updates.

mod classic;
mod core;


pub use self::classic::{ClassicPatch, ClassicSheet, CombatEnemy, InventoryItem};
pub use self::core::{Character, CharacterPatch, CharacterSheet, GameSystem, SheetPatch};
