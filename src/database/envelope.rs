//! Envelope Store
//!
//! Owns the single versioned container persisted on the backing medium:
//!
//! - Lazy creation of an empty envelope on first read
//! - Migration of older schema versions on read and import
//! - Full overwrite on every write (no partial or merge writes)
//! - Pretty-printed export and whole-envelope replacing import
//!
//! Every operation is full-read, in-memory mutate, full-write. There is no
//! locking: callers await one mutation before issuing the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

use super::backend::BackingStore;
use super::migrations::{self, CURRENT_VERSION};
use super::models::Character;
use super::{StoreError, StoreResult};

/// Default key under which the envelope is stored.
pub const DEFAULT_STORAGE_KEY: &str = "gamebook-companion-data";

// ============================================================================
// Envelope
// ============================================================================

/// The persisted container: every character plus the active-character pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: u32,
    pub characters: Vec<Character>,
    pub last_character_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Envelope {
    /// Fresh envelope at the current version with no characters.
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            characters: Vec::new(),
            last_character_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.characters.iter().position(|c| c.id == id)
    }

    /// First id that appears more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.characters
            .iter()
            .map(|c| c.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Corruption Policy
// ============================================================================

/// What [`EnvelopeStore::read`] does with stored bytes it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptionPolicy {
    /// Keep every character that still decodes and log the rest at `error`
    /// level. Text that is not JSON at all yields an empty envelope. Dropped
    /// data is lost on the next write.
    #[default]
    Recover,
    /// Fail with [`StoreError::Corrupted`] and leave the stored bytes alone.
    Strict,
}

// ============================================================================
// Envelope Store
// ============================================================================

/// Hook that brings a decoded character back into its ruleset's bounds.
pub type Normalizer = fn(&mut Character);

/// Versioned envelope persistence over an injected backing medium.
pub struct EnvelopeStore<B: BackingStore> {
    backend: B,
    key: String,
    on_corruption: CorruptionPolicy,
    normalizer: Option<Normalizer>,
}

impl<B: BackingStore> EnvelopeStore<B> {
    /// Create a store over `backend` using the default key and recovery policy.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key: DEFAULT_STORAGE_KEY.to_string(),
            on_corruption: CorruptionPolicy::default(),
            normalizer: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.on_corruption = policy;
        self
    }

    /// Run `normalizer` over every character decoded by [`read`](Self::read)
    /// or accepted by [`import_data`](Self::import_data).
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    fn normalize(&self, envelope: &mut Envelope) {
        if let Some(normalize) = self.normalizer {
            envelope.characters.iter_mut().for_each(normalize);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Return the current envelope.
    ///
    /// Missing data yields a fresh empty envelope. Older versions are migrated
    /// in memory; the upgrade reaches the medium on the next
    /// [`write`](Self::write).
    ///
    /// Under [`CorruptionPolicy::Recover`], text that is not JSON yields a
    /// fresh empty envelope, and well-formed JSON that does not decode is
    /// salvaged character by character. Every dropped character is logged
    /// in full at `error` level before the next write can overwrite it.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn read(&self) -> StoreResult<Envelope> {
        let Some(text) = self.backend.load(&self.key).await? else {
            return Ok(Envelope::empty());
        };

        let mut envelope = match serde_json::from_str::<Value>(&text) {
            Err(e) => match self.on_corruption {
                CorruptionPolicy::Recover => {
                    warn!(error = %e, "Stored envelope is not JSON, starting with an empty one");
                    Envelope::empty()
                }
                CorruptionPolicy::Strict => return Err(StoreError::corrupted(e.to_string())),
            },
            Ok(raw) => match decode(raw.clone()) {
                Ok(envelope) => envelope,
                Err(e) => match self.on_corruption {
                    CorruptionPolicy::Recover => salvage(raw, &e),
                    CorruptionPolicy::Strict => return Err(StoreError::corrupted(e.to_string())),
                },
            },
        };

        self.normalize(&mut envelope);
        Ok(envelope)
    }

    /// Stamp `updated_at`, serialize and overwrite the medium in full.
    #[instrument(skip(self, envelope), fields(characters = envelope.characters.len()))]
    pub async fn write(&self, envelope: &mut Envelope) -> StoreResult<()> {
        envelope.version = envelope.version.max(CURRENT_VERSION);
        envelope.updated_at = Utc::now();
        let text = serde_json::to_string(envelope)?;
        self.backend.save(&self.key, &text).await
    }

    /// Upgrade a raw envelope to the running version.
    pub fn migrate(&self, raw: Value) -> StoreResult<Value> {
        migrations::migrate(raw)
    }

    /// Pretty-printed snapshot of the whole envelope, for backups.
    pub async fn export_data(&self) -> StoreResult<String> {
        let envelope = self.read().await?;
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Replace the entire envelope with the one encoded in `text`.
    ///
    /// Fails with [`StoreError::Format`] unless the payload has a positive
    /// integer `version` no newer than the running one and an array
    /// `characters` whose entries decode with unique ids. On failure the
    /// stored envelope is left untouched.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn import_data(&self, text: &str) -> StoreResult<Envelope> {
        let (mut envelope, from_version) = match parse_import(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Rejected import");
                return Err(e);
            }
        };
        self.normalize(&mut envelope);

        self.write(&mut envelope).await?;
        info!(
            characters = envelope.characters.len(),
            from_version, "Imported envelope"
        );
        Ok(envelope)
    }
}

/// Validate, migrate and decode an import payload. Returns the envelope and
/// the version it was exported at.
fn parse_import(text: &str) -> StoreResult<(Envelope, u32)> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::format(format!("not valid JSON: {}", e)))?;

    let version = migrations::stored_version(&raw)
        .ok_or_else(|| StoreError::format("missing or invalid `version`"))?;
    if !raw.get("characters").is_some_and(Value::is_array) {
        return Err(StoreError::format("`characters` must be an array"));
    }
    if version > CURRENT_VERSION {
        return Err(StoreError::format(format!(
            "version {} is newer than supported version {}",
            version, CURRENT_VERSION
        )));
    }

    let migrated = migrations::migrate(raw)?;
    let envelope: Envelope = serde_json::from_value(migrated)
        .map_err(|e| StoreError::format(format!("invalid envelope: {}", e)))?;
    if let Some(id) = envelope.duplicate_id() {
        return Err(StoreError::format(format!("duplicate character id '{}'", id)));
    }
    Ok((envelope, version))
}

/// Migrate and decode a stored envelope.
fn decode(raw: Value) -> StoreResult<Envelope> {
    let migrated = migrations::migrate(raw)?;
    Ok(serde_json::from_value(migrated)?)
}

/// Keep whatever decodes from an envelope that failed to decode as a whole.
fn salvage(raw: Value, cause: &StoreError) -> Envelope {
    let mut envelope = Envelope::empty();

    let migrated = match migrations::migrate(raw.clone()) {
        Ok(migrated) => migrated,
        Err(e) => {
            error!(error = %e, raw = %raw, "Dropping unreadable envelope");
            return envelope;
        }
    };
    let Some(characters) = migrated.get("characters").and_then(Value::as_array) else {
        error!(error = %cause, raw = %raw, "Dropping envelope without a character list");
        return envelope;
    };

    for character in characters {
        match serde_json::from_value::<Character>(character.clone()) {
            Ok(decoded) if envelope.find(&decoded.id).is_none() => envelope.characters.push(decoded),
            Ok(decoded) => {
                error!(id = %decoded.id, raw = %character, "Dropping duplicate character")
            }
            Err(e) => error!(error = %e, raw = %character, "Dropping undecodable character"),
        }
    }

    envelope.last_character_id = migrated
        .get("lastCharacterId")
        .and_then(Value::as_str)
        .map(str::to_string);
    envelope.version = migrations::stored_version(&migrated).unwrap_or(CURRENT_VERSION);
    warn!(
        kept = envelope.characters.len(),
        dropped = characters.len() - envelope.characters.len(),
        "Recovered a partially corrupted envelope"
    );
    envelope
}
