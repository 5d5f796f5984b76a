//! Rule Engine
//!
//! Pure ruleset arithmetic over characters, dispatched by the character's
//! `gameSystem` tag. Only the adventure-book classic ruleset exists today;
//! the registry keeps the persistence layer ruleset-agnostic.

pub mod classic;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

use crate::database::models::Character;

pub use crate::database::models::GameSystem;
pub use classic::ClassicRuleset;

/// Standard two-sided clamp.
///
/// Unlike [`Ord::clamp`] this never panics: if `min > max` the result is `max`.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

// ============================================================================
// Ruleset Trait
// ============================================================================

/// Rule functions for one game system.
pub trait Ruleset: Send + Sync {
    /// Returns the game system this ruleset implements
    fn system(&self) -> GameSystem;

    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Clamp every ruleset-owned value of `character` into its bounds.
    ///
    /// Characters of another system are left untouched.
    fn normalize(&self, character: &mut Character);

    fn is_dead(&self, character: &Character) -> bool;

    fn is_critical(&self, character: &Character) -> bool;

    fn info(&self) -> RulesetInfo {
        RulesetInfo::from_ruleset(self)
    }
}

/// Display data about a registered ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl RulesetInfo {
    pub fn from_ruleset<R: Ruleset + ?Sized>(ruleset: &R) -> Self {
        let system = ruleset.system();
        Self {
            id: system.id().to_string(),
            name: system.display_name().to_string(),
            description: ruleset.description().to_string(),
        }
    }
}

// ============================================================================
// Ruleset Registry
// ============================================================================

/// Maps each game system to its rule functions.
pub struct RulesetRegistry {
    rulesets: HashMap<GameSystem, Box<dyn Ruleset>>,
}

impl RulesetRegistry {
    /// Registry with every built-in ruleset.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ClassicRuleset));
        registry
    }

    pub fn empty() -> Self {
        Self {
            rulesets: HashMap::new(),
        }
    }

    pub fn register(&mut self, ruleset: Box<dyn Ruleset>) {
        self.rulesets.insert(ruleset.system(), ruleset);
    }

    pub fn get(&self, system: GameSystem) -> Option<&dyn Ruleset> {
        self.rulesets.get(&system).map(|r| r.as_ref())
    }

    /// Ruleset for `character`'s own system.
    pub fn for_character(&self, character: &Character) -> Option<&dyn Ruleset> {
        self.get(character.game_system())
    }

    /// Normalise `character` with its ruleset. Characters of an unregistered
    /// system pass through unchanged.
    pub fn normalize(&self, character: &mut Character) {
        match self.for_character(character) {
            Some(ruleset) => ruleset.normalize(character),
            None => warn!(
                system = character.game_system().id(),
                "No ruleset registered, character stored unclamped"
            ),
        }
    }

    pub fn is_dead(&self, character: &Character) -> bool {
        self.for_character(character)
            .is_some_and(|r| r.is_dead(character))
    }

    pub fn is_critical(&self, character: &Character) -> bool {
        self.for_character(character)
            .is_some_and(|r| r.is_critical(character))
    }

    pub fn list_systems(&self) -> Vec<RulesetInfo> {
        let mut infos: Vec<_> = self.rulesets.values().map(|r| r.info()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

impl Default for RulesetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide registry of the built-in rulesets.
pub fn registry() -> &'static RulesetRegistry {
    static REGISTRY: OnceLock<RulesetRegistry> = OnceLock::new();
    REGISTRY.get_or_init(RulesetRegistry::new)
}
