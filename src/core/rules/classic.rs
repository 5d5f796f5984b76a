//! Adventure Book Classic ruleset
//!
//! Skill, stamina and luck pairs, fear, meals and gold. Every function here
//! is total: zero stamina, zero luck and death are ordinary states. Edits are
//! expressed as [`ClassicPatch`] values the caller merges and persists.

use serde::{Deserialize, Serialize};

use super::{clamp, Ruleset};
use crate::core::dice::{DiceEngine, UniformSource};
use crate::database::models::{
    Character, CharacterSheet, ClassicPatch, ClassicSheet, CombatEnemy, GameSystem, InventoryItem,
};

// ============================================================================
// Limits
// ============================================================================

pub const SKILL_MIN: i32 = 1;
pub const SKILL_MAX: i32 = 12;
pub const STAMINA_MAX: i32 = 24;
pub const LUCK_MAX: i32 = 12;
pub const FEAR_MAX: i32 = 18;
pub const MEALS_MAX: i32 = 99;
pub const GOLD_MAX: i32 = 99;

/// Stamina restored by one meal.
pub const HEAL_PER_MEAL: i32 = 4;

/// Stamina ratio below which a character is critical.
pub const CRITICAL_THRESHOLD: f64 = 0.25;

// ============================================================================
// Creation
// ============================================================================

/// `dice` d6 plus a flat bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationFormula {
    pub dice: usize,
    pub bonus: i32,
}

impl CreationFormula {
    /// Inclusive range of possible results.
    pub fn range(&self) -> (i32, i32) {
        let dice = self.dice as i32;
        (dice + self.bonus, dice * 6 + self.bonus)
    }
}

pub const SKILL_FORMULA: CreationFormula = CreationFormula { dice: 1, bonus: 6 };
pub const STAMINA_FORMULA: CreationFormula = CreationFormula { dice: 2, bonus: 12 };
pub const LUCK_FORMULA: CreationFormula = CreationFormula { dice: 1, bonus: 6 };

/// Sum of `dice_count` independent d6 plus `bonus`.
pub fn roll_creation_stat<S: UniformSource>(
    dice: &mut DiceEngine<S>,
    dice_count: usize,
    bonus: i32,
) -> i32 {
    dice.roll_n(dice_count).into_iter().sum::<i32>() + bonus
}

/// The three rolled starting values of a new character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicCreation {
    pub skill: i32,
    pub stamina: i32,
    pub luck: i32,
}

impl ClassicCreation {
    pub fn roll<S: UniformSource>(dice: &mut DiceEngine<S>) -> Self {
        let mut roll = |f: CreationFormula| roll_creation_stat(dice, f.dice, f.bonus);
        Self {
            skill: roll(SKILL_FORMULA),
            stamina: roll(STAMINA_FORMULA),
            luck: roll(LUCK_FORMULA),
        }
    }

    pub fn sheet(&self) -> ClassicSheet {
        let mut sheet = ClassicSheet::new(self.skill, self.stamina, self.luck);
        normalize_sheet(&mut sheet);
        sheet
    }
}

/// Fresh character on page 1 with the rolled stats and nothing else.
pub fn new_classic_character(
    name: impl Into<String>,
    book_title: impl Into<String>,
    creation: ClassicCreation,
) -> Character {
    Character::new(name, book_title, CharacterSheet::Classic(creation.sheet()))
}

// ============================================================================
// Predicates
// ============================================================================

/// Current stamina below a quarter of initial. Never true at zero initial stamina.
pub fn is_critical(sheet: &ClassicSheet) -> bool {
    if sheet.initial_stamina == 0 {
        return false;
    }
    f64::from(sheet.current_stamina) / f64::from(sheet.initial_stamina) < CRITICAL_THRESHOLD
}

pub fn is_dead(sheet: &ClassicSheet) -> bool {
    sheet.current_stamina <= 0
}

// ============================================================================
// Meals and Luck
// ============================================================================

/// Result of [`eat_meal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealOutcome {
    /// No meals left; nothing changes.
    NoEffect,
    Eaten { meals: i32, current_stamina: i32 },
}

impl MealOutcome {
    pub fn into_patch(self) -> Option<ClassicPatch> {
        match self {
            Self::NoEffect => None,
            Self::Eaten {
                meals,
                current_stamina,
            } => Some(ClassicPatch {
                meals: Some(meals),
                current_stamina: Some(current_stamina),
                ..Default::default()
            }),
        }
    }
}

/// Spend one meal to heal [`HEAL_PER_MEAL`] stamina, capped at initial.
pub fn eat_meal(sheet: &ClassicSheet) -> MealOutcome {
    if sheet.meals <= 0 {
        return MealOutcome::NoEffect;
    }
    MealOutcome::Eaten {
        meals: sheet.meals - 1,
        current_stamina: sheet
            .current_stamina
            .saturating_add(HEAL_PER_MEAL)
            .min(sheet.initial_stamina),
    }
}

/// Result of [`test_luck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuckTest {
    pub lucky: bool,
    pub new_luck: i32,
}

impl LuckTest {
    pub fn patch(&self) -> ClassicPatch {
        ClassicPatch {
            current_luck: Some(self.new_luck),
            ..Default::default()
        }
    }
}

/// Lucky when the roll does not exceed current luck. One point of luck is
/// spent either way.
pub fn test_luck(sheet: &ClassicSheet, roll_total: i32) -> LuckTest {
    LuckTest {
        lucky: roll_total <= sheet.current_luck,
        new_luck: sheet.current_luck.saturating_sub(1).max(0),
    }
}

// ============================================================================
// Normalisation
// ============================================================================

/// Clamp every value of `sheet` into the classic bounds.
///
/// Initial values are clamped first so that a lowered initial pulls its
/// current value down with it.
pub fn normalize_sheet(sheet: &mut ClassicSheet) {
    sheet.initial_skill = clamp(sheet.initial_skill, SKILL_MIN, SKILL_MAX);
    sheet.initial_stamina = clamp(sheet.initial_stamina, 0, STAMINA_MAX);
    sheet.initial_luck = clamp(sheet.initial_luck, 0, LUCK_MAX);
    sheet.max_fear = clamp(sheet.max_fear, 0, FEAR_MAX);

    sheet.current_skill = clamp(sheet.current_skill, 0, sheet.initial_skill);
    sheet.current_stamina = clamp(sheet.current_stamina, 0, sheet.initial_stamina);
    sheet.current_luck = clamp(sheet.current_luck, 0, sheet.initial_luck);
    sheet.current_fear = clamp(sheet.current_fear, 0, sheet.max_fear);

    sheet.meals = clamp(sheet.meals, 0, MEALS_MAX);
    sheet.gold = clamp(sheet.gold, 0, GOLD_MAX);

    for enemy in &mut sheet.combat_enemies {
        enemy.initial_skill = enemy.initial_skill.max(0);
        enemy.initial_stamina = enemy.initial_stamina.max(0);
        enemy.skill = clamp(enemy.skill, 0, enemy.initial_skill);
        enemy.stamina = clamp(enemy.stamina, 0, enemy.initial_stamina);
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Append an item. Blank names are ignored.
pub fn add_item(sheet: &ClassicSheet, name: &str) -> Option<ClassicPatch> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut inventory = sheet.inventory.clone();
    inventory.push(InventoryItem::new(name));
    Some(ClassicPatch {
        inventory: Some(inventory),
        ..Default::default()
    })
}

pub fn remove_item(sheet: &ClassicSheet, item_id: &str) -> Option<ClassicPatch> {
    let index = sheet.inventory.iter().position(|i| i.id == item_id)?;
    let mut inventory = sheet.inventory.clone();
    inventory.remove(index);
    Some(ClassicPatch {
        inventory: Some(inventory),
        ..Default::default()
    })
}

// ============================================================================
// Combat
// ============================================================================

fn combat_patch(enemies: Vec<CombatEnemy>) -> ClassicPatch {
    ClassicPatch {
        combat_enemies: Some(enemies),
        ..Default::default()
    }
}

/// Add an enemy whose initial values are the given ones.
pub fn add_enemy(sheet: &ClassicSheet, name: &str, skill: i32, stamina: i32) -> ClassicPatch {
    let mut enemies = sheet.combat_enemies.clone();
    enemies.push(CombatEnemy::new(name.trim(), skill, stamina));
    combat_patch(enemies)
}

fn update_enemy(
    sheet: &ClassicSheet,
    enemy_id: &str,
    update: impl FnOnce(&mut CombatEnemy),
) -> Option<ClassicPatch> {
    let mut enemies = sheet.combat_enemies.clone();
    let enemy = enemies.iter_mut().find(|e| e.id == enemy_id)?;
    update(enemy);
    Some(combat_patch(enemies))
}

pub fn set_enemy_skill(sheet: &ClassicSheet, enemy_id: &str, value: i32) -> Option<ClassicPatch> {
    update_enemy(sheet, enemy_id, |e| e.skill = clamp(value, 0, e.initial_skill))
}

pub fn set_enemy_stamina(sheet: &ClassicSheet, enemy_id: &str, value: i32) -> Option<ClassicPatch> {
    update_enemy(sheet, enemy_id, |e| e.stamina = clamp(value, 0, e.initial_stamina))
}

pub fn remove_enemy(sheet: &ClassicSheet, enemy_id: &str) -> Option<ClassicPatch> {
    let index = sheet.combat_enemies.iter().position(|e| e.id == enemy_id)?;
    let mut enemies = sheet.combat_enemies.clone();
    enemies.remove(index);
    Some(combat_patch(enemies))
}

pub fn clear_combat() -> ClassicPatch {
    combat_patch(Vec::new())
}

// ============================================================================
// Ruleset
// ============================================================================

/// [`Ruleset`] for [`GameSystem::AdventureBookClassic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicRuleset;

impl Ruleset for ClassicRuleset {
    fn system(&self) -> GameSystem {
        GameSystem::AdventureBookClassic
    }

    fn description(&self) -> &'static str {
        "Skill, stamina and luck with 2d6 combat and luck tests"
    }

    fn normalize(&self, character: &mut Character) {
        if let Some(sheet) = character.sheet.as_classic_mut() {
            normalize_sheet(sheet);
        }
    }

    fn is_dead(&self, character: &Character) -> bool {
        character.sheet.as_classic().is_some_and(is_dead)
    }

    fn is_critical(&self, character: &Character) -> bool {
        character.sheet.as_classic().is_some_and(is_critical)
    }
}
