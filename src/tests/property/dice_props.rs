//! Property-based tests for the Dice Engine
//!
//! Tests invariants:
//! - Dice are always in 1..=6
//! - Totals are the sum of the values, with the right number of dice
//! - Deterministic given same seed

use proptest::prelude::*;

use crate::core::dice::{DiceEngine, DiceKind, RollHistory, SequenceSource};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Uniform values a well-behaved source may return
fn arb_units() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1.0, 1..32)
}

fn arb_dice_kind() -> impl Strategy<Value = DiceKind> {
    prop_oneof![Just(DiceKind::OneD6), Just(DiceKind::TwoD6)]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn die_is_always_a_face(units in arb_units()) {
        let count = units.len();
        let mut dice = DiceEngine::with_source(SequenceSource::new(units));
        for value in dice.roll_n(count) {
            prop_assert!((1..=6).contains(&value));
        }
    }

    #[test]
    fn die_follows_floor_mapping(u in 0.0f64..1.0) {
        let mut dice = DiceEngine::with_source(SequenceSource::new(vec![u]));
        prop_assert_eq!(dice.roll_die(), (u * 6.0).floor() as i32 + 1);
    }

    #[test]
    fn record_total_is_sum(units in arb_units(), kind in arb_dice_kind()) {
        let mut dice = DiceEngine::with_source(SequenceSource::new(units));
        let roll = dice.roll_record(kind, None);

        prop_assert_eq!(roll.values.len(), kind.count());
        prop_assert_eq!(roll.total, roll.values.iter().sum::<i32>());
        let (min, max) = kind.range();
        prop_assert!(roll.total >= min && roll.total <= max);
    }

    #[test]
    fn seeded_rolls_are_deterministic(seed in any::<u64>(), count in 0usize..50) {
        let mut a = DiceEngine::seeded(seed);
        let mut b = DiceEngine::seeded(seed);
        prop_assert_eq!(a.roll_n(count), b.roll_n(count));
    }

    #[test]
    fn history_is_bounded(limit in 1usize..20, pushes in 0usize..60, seed in any::<u64>()) {
        let mut dice = DiceEngine::seeded(seed);
        let mut history = RollHistory::new(limit);
        let mut last_id = None;

        for _ in 0..pushes {
            let roll = dice.roll_record(DiceKind::TwoD6, None);
            last_id = Some(roll.id.clone());
            history.push(roll);
        }

        prop_assert_eq!(history.len(), pushes.min(limit));
        prop_assert_eq!(history.latest().map(|r| r.id.clone()), last_id);
    }
}
