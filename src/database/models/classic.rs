//! Adventure Book Classic Records
//!
//! Stat pairs, resources, inventory and the in-progress combat list for the
//! classic ruleset. Arithmetic over these records lives in
//! `core::rules::classic`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Owned Collections
// ============================================================================

/// An inventory entry, owned by exactly one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

/// An adversary in the character's current fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatEnemy {
    pub id: String,
    pub name: String,
    pub skill: i32,
    pub stamina: i32,
    pub initial_skill: i32,
    pub initial_stamina: i32,
}

impl CombatEnemy {
    pub fn new(name: impl Into<String>, skill: i32, stamina: i32) -> Self {
        let skill = skill.max(0);
        let stamina = stamina.max(0);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            skill,
            stamina,
            initial_skill: skill,
            initial_stamina: stamina,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.stamina <= 0
    }
}

// ============================================================================
// Classic Sheet
// ============================================================================

/// Classic ruleset payload of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassicSheet {
    pub initial_skill: i32,
    pub current_skill: i32,
    pub initial_stamina: i32,
    pub current_stamina: i32,
    pub initial_luck: i32,
    pub current_luck: i32,
    pub max_fear: i32,
    pub current_fear: i32,
    pub meals: i32,
    pub gold: i32,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub combat_enemies: Vec<CombatEnemy>,
}

impl ClassicSheet {
    /// Fresh sheet with every current value at its initial value.
    pub fn new(skill: i32, stamina: i32, luck: i32) -> Self {
        Self {
            initial_skill: skill,
            current_skill: skill,
            initial_stamina: stamina,
            current_stamina: stamina,
            initial_luck: luck,
            current_luck: luck,
            max_fear: 0,
            current_fear: 0,
            meals: 0,
            gold: 0,
            inventory: Vec::new(),
            combat_enemies: Vec::new(),
        }
    }
}

/// Partial update of a [`ClassicSheet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassicPatch {
    pub initial_skill: Option<i32>,
    pub current_skill: Option<i32>,
    pub initial_stamina: Option<i32>,
    pub current_stamina: Option<i32>,
    pub initial_luck: Option<i32>,
    pub current_luck: Option<i32>,
    pub max_fear: Option<i32>,
    pub current_fear: Option<i32>,
    pub meals: Option<i32>,
    pub gold: Option<i32>,
    pub inventory: Option<Vec<InventoryItem>>,
    pub combat_enemies: Option<Vec<CombatEnemy>>,
}

impl ClassicPatch {
    pub fn apply(&self, sheet: &mut ClassicSheet) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut sheet.initial_skill, &self.initial_skill);
        set(&mut sheet.current_skill, &self.current_skill);
        set(&mut sheet.initial_stamina, &self.initial_stamina);
        set(&mut sheet.current_stamina, &self.current_stamina);
        set(&mut sheet.initial_luck, &self.initial_luck);
        set(&mut sheet.current_luck, &self.current_luck);
        set(&mut sheet.max_fear, &self.max_fear);
        set(&mut sheet.current_fear, &self.current_fear);
        set(&mut sheet.meals, &self.meals);
        set(&mut sheet.gold, &self.gold);
        set(&mut sheet.inventory, &self.inventory);
        set(&mut sheet.combat_enemies, &self.combat_enemies);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
