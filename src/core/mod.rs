//! Companion core: dice, rules, undo and the active-character session.

pub mod dice;
pub mod logging;
pub mod rules;
pub mod session;
pub mod undo;

pub use dice::{DiceEngine, DiceKind, DiceRoll, RollHistory};
pub use rules::{registry, Ruleset, RulesetRegistry};
pub use session::{CharacterSession, UndoOutcome};
pub use undo::{UndoController, UndoEntry, UndoState};
