//! Dice Engine
//!
//! Auditable six-sided dice rolls.
//!
//! Every die is derived from a uniform real `U` in `[0, 1)` as
//! `floor(U * 6) + 1`, so a roll is fully determined by the values its
//! [`UniformSource`] produced. Roll history is kept by callers in a
//! [`RollHistory`]; the engine itself only holds its source.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut dice = DiceEngine::new();
//! let roll = dice.roll_record(DiceKind::TwoD6, Some("Test your luck"));
//! history.push(roll);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Faces on every die used by the classic ruleset.
pub const DIE_FACES: i32 = 6;

/// Default number of rolls a [`RollHistory`] keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

// ============================================================================
// Random Sources
// ============================================================================

/// A source of uniform reals in `[0, 1)`.
pub trait UniformSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// [`UniformSource`] over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng + Send> UniformSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of uniform values, cycling when exhausted.
///
/// Used to replay an audited roll or to script dice in tests.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    /// Source that cycles through `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "SequenceSource needs at least one value");
        Self { values, position: 0 }
    }

    /// Source that yields exactly the given die faces (1..=6).
    ///
    /// # Panics
    ///
    /// Panics if `faces` is empty.
    pub fn from_faces(faces: &[i32]) -> Self {
        Self::new(
            faces
                .iter()
                .map(|f| (f64::from(*f) - 0.5) / f64::from(DIE_FACES))
                .collect(),
        )
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

// ============================================================================
// Roll Records
// ============================================================================

/// Kind of roll the classic ruleset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiceKind {
    #[serde(rename = "1d6")]
    OneD6,
    #[serde(rename = "2d6")]
    TwoD6,
}

impl DiceKind {
    pub fn count(&self) -> usize {
        match self {
            Self::OneD6 => 1,
            Self::TwoD6 => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneD6 => "1d6",
            Self::TwoD6 => "2d6",
        }
    }

    /// Smallest and largest possible totals.
    pub fn range(&self) -> (i32, i32) {
        let n = self.count() as i32;
        (n, n * DIE_FACES)
    }
}

impl fmt::Display for DiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d6" | "d6" => Ok(Self::OneD6),
            "2d6" => Ok(Self::TwoD6),
            other => Err(format!("unsupported dice '{}', expected 1d6 or 2d6", other)),
        }
    }
}

/// Immutable record of one roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DiceKind,
    pub values: Vec<i32>,
    pub total: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Dice Engine
// ============================================================================

/// Rolls dice from a [`UniformSource`].
pub struct DiceEngine<S: UniformSource = RngSource<StdRng>> {
    source: S,
}

impl DiceEngine<RngSource<StdRng>> {
    /// Engine seeded from operating system entropy.
    pub fn new() -> Self {
        Self::with_source(RngSource(StdRng::from_entropy()))
    }

    /// Engine with a reproducible seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_source(RngSource(StdRng::seed_from_u64(seed)))
    }
}

impl Default for DiceEngine<RngSource<StdRng>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: UniformSource> DiceEngine<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// One die in `1..=6`.
    pub fn roll_die(&mut self) -> i32 {
        // Sources are contracted to stay below 1.0; clamp so a misbehaving
        // source still cannot produce a seventh face.
        let u = self.source.next_unit().clamp(0.0, 1.0 - f64::EPSILON);
        (u * f64::from(DIE_FACES)).floor() as i32 + 1
    }

    /// `count` independent dice, in roll order.
    pub fn roll_n(&mut self, count: usize) -> Vec<i32> {
        (0..count).map(|_| self.roll_die()).collect()
    }

    /// Roll `kind` and produce an auditable record.
    pub fn roll_record(&mut self, kind: DiceKind, label: Option<&str>) -> DiceRoll {
        let values = self.roll_n(kind.count());
        let total = values.iter().sum();
        DiceRoll {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            values,
            total,
            label: label.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Roll History
// ============================================================================

/// Caller-owned bounded roll history, most recent first.
#[derive(Debug, Clone)]
pub struct RollHistory {
    limit: usize,
    rolls: VecDeque<DiceRoll>,
}

impl RollHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            rolls: VecDeque::with_capacity(limit),
        }
    }

    /// Record a roll, dropping the oldest one past the limit.
    pub fn push(&mut self, roll: DiceRoll) {
        self.rolls.push_front(roll);
        self.rolls.truncate(self.limit);
    }

    pub fn latest(&self) -> Option<&DiceRoll> {
        self.rolls.front()
    }

    /// Rolls, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &DiceRoll> {
        self.rolls.iter()
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }
}

impl Default for RollHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
