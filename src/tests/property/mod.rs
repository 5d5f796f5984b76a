//! Property-based tests for the companion core
//!
//! This module contains property-based tests using the proptest framework.
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Test Modules
//!
//! - `dice_props`: Tests for the dice engine
//!   - Every die is in 1..=6 for any uniform source
//!   - Record totals equal the sum of their values
//!   - Deterministic given the same seed
//!   - Roll history stays bounded and most-recent-first
//!
//! - `rules_props`: Tests for the classic ruleset
//!   - Creation rolls stay inside their formula ranges
//!   - Normalisation always lands inside the bounds and is idempotent
//!   - Critical/dead predicates never fail and respect the zero guard
//!   - Meals and luck tests never leave the bounds
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod dice_props;
