//! Envelope Migrations
//!
//! Handles versioned schema upgrades of the persisted envelope.
//!
//! Migrations run on the raw JSON value, before it is decoded into the
//! current [`Envelope`](super::Envelope) type, so a step can reshape data
//! that the current types would reject. Each step upgrades exactly one
//! version (N to N+1); steps compose by running in order.

use serde_json::Value;
use tracing::{debug, info};

use super::{StoreError, StoreResult};

/// Current envelope schema version
pub const CURRENT_VERSION: u32 = 1;

/// One N to N+1 schema upgrade.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Version this step upgrades from; the result is `from_version + 1`.
    pub from_version: u32,
    pub name: &'static str,
    pub apply: fn(&mut Value) -> StoreResult<()>,
}

/// Registered upgrade steps, in any order.
///
/// Empty while only version 1 exists: versions without a step are carried
/// forward unchanged apart from the version number.
pub static MIGRATIONS: &[MigrationStep] = &[];

/// Read the `version` field of a raw envelope.
///
/// Returns `None` unless it is a positive integer.
pub fn stored_version(raw: &Value) -> Option<u32> {
    raw.get("version")
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Upgrade a raw envelope to [`CURRENT_VERSION`] using [`MIGRATIONS`].
pub fn migrate(raw: Value) -> StoreResult<Value> {
    migrate_with(raw, CURRENT_VERSION, MIGRATIONS)
}

/// Upgrade a raw envelope to `target` using the given steps.
///
/// Envelopes already at or beyond `target` are returned untouched; a missing
/// or non-numeric version is treated as version 0.
pub fn migrate_with(mut raw: Value, target: u32, steps: &[MigrationStep]) -> StoreResult<Value> {
    if !raw.is_object() {
        return Err(StoreError::migration("envelope is not a JSON object"));
    }

    let current = stored_version(&raw).unwrap_or(0);
    if current >= target {
        return Ok(raw);
    }

    info!(current_version = current, target_version = target, "Migrating envelope");

    for version in current..target {
        match steps.iter().find(|s| s.from_version == version) {
            Some(step) => {
                info!("Applying migration v{} -> v{}: {}", version, version + 1, step.name);
                (step.apply)(&mut raw)?;
            }
            None => debug!("No changes between v{} and v{}", version, version + 1),
        }
        raw["version"] = Value::from(version + 1);
    }

    Ok(raw)
}
