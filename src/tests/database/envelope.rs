//! Envelope Store Tests
//!
//! Lazy creation, corruption handling, version handling and import
//! validation against an in-memory medium.

use serde_json::{json, Value};

use crate::database::{
    CorruptionPolicy, Envelope, EnvelopeStore, MemoryBackingStore, StoreError, CURRENT_VERSION,
    DEFAULT_STORAGE_KEY,
};
use crate::tests::common::create_test_character;

fn store_on(backend: &MemoryBackingStore) -> EnvelopeStore<MemoryBackingStore> {
    EnvelopeStore::new(backend.clone())
}

fn character_json(name: &str) -> Value {
    serde_json::to_value(create_test_character(name)).unwrap()
}

// =============================================================================
// Read / Write
// =============================================================================

#[tokio::test]
async fn test_read_missing_data_yields_empty_envelope() {
    let backend = MemoryBackingStore::new();
    let envelope = store_on(&backend).read().await.unwrap();

    assert_eq!(envelope.version, CURRENT_VERSION);
    assert!(envelope.characters.is_empty());
    assert_eq!(envelope.last_character_id, None);
    // Reading never writes
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_write_stamps_and_persists() {
    let backend = MemoryBackingStore::new();
    let store = store_on(&backend);
    let mut envelope = Envelope::empty();
    let before = envelope.updated_at;
    envelope.version = 0;

    store.write(&mut envelope).await.unwrap();

    assert_eq!(envelope.version, CURRENT_VERSION);
    assert!(envelope.updated_at >= before);
    let raw: Value = serde_json::from_str(&backend.raw(DEFAULT_STORAGE_KEY).await.unwrap()).unwrap();
    assert_eq!(raw["version"], json!(CURRENT_VERSION));
    assert_eq!(raw["lastCharacterId"], Value::Null);
    assert!(raw["updatedAt"].is_string());
}

#[tokio::test]
async fn test_write_never_lowers_version() {
    let backend = MemoryBackingStore::new();
    let mut envelope = Envelope::empty();
    envelope.version = CURRENT_VERSION + 4;

    store_on(&backend).write(&mut envelope).await.unwrap();
    assert_eq!(envelope.version, CURRENT_VERSION + 4);
}

#[tokio::test]
async fn test_read_migrates_unversioned_data_in_memory() {
    let stored = json!({
        "characters": [character_json("Old")],
        "lastCharacterId": null,
        "updatedAt": "2024-03-01T12:00:00Z"
    })
    .to_string();
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, stored.clone());

    let envelope = store_on(&backend).read().await.unwrap();

    assert_eq!(envelope.version, CURRENT_VERSION);
    assert_eq!(envelope.characters[0].name, "Old");
    assert_eq!(backend.raw(DEFAULT_STORAGE_KEY).await, Some(stored));
}

#[tokio::test]
async fn test_migrate_brings_raw_envelope_to_current() {
    let store = store_on(&MemoryBackingStore::new());
    let migrated = store.migrate(json!({"characters": []})).unwrap();
    assert_eq!(migrated["version"], json!(CURRENT_VERSION));
}

#[tokio::test]
async fn test_keys_are_independent() {
    let backend = MemoryBackingStore::new();
    let main = store_on(&backend);
    let other = EnvelopeStore::new(backend.clone()).with_key("scratch");

    let mut envelope = Envelope::empty();
    envelope.last_character_id = Some("x".to_string());
    other.write(&mut envelope).await.unwrap();

    assert_eq!(main.read().await.unwrap().last_character_id, None);
    assert_eq!(other.read().await.unwrap().last_character_id, Some("x".to_string()));
}

// =============================================================================
// Corruption
// =============================================================================

#[tokio::test]
async fn test_corrupted_data_recovers_to_empty() {
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, "{ this is not json");
    let envelope = store_on(&backend).read().await.unwrap();

    assert!(envelope.characters.is_empty());
    assert_eq!(envelope.version, CURRENT_VERSION);
}

#[tokio::test]
async fn test_wrongly_shaped_data_recovers_to_empty() {
    let backend = MemoryBackingStore::with_contents(
        DEFAULT_STORAGE_KEY,
        r#"{"version": 1, "characters": "nope"}"#,
    );
    assert!(store_on(&backend).read().await.unwrap().characters.is_empty());
}

#[tokio::test]
async fn test_strict_policy_surfaces_corruption() {
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, "garbage");
    let store = store_on(&backend).with_corruption_policy(CorruptionPolicy::Strict);

    let err = store.read().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupted(_)));
    assert_eq!(backend.raw(DEFAULT_STORAGE_KEY).await.as_deref(), Some("garbage"));
}

#[tokio::test]
async fn test_one_undecodable_character_keeps_the_rest() {
    let good = character_json("Keeper");
    let mut bad = character_json("Broken");
    bad["currentPage"] = json!(-3);
    let stored = json!({
        "version": CURRENT_VERSION,
        "characters": [good.clone(), bad],
        "lastCharacterId": good["id"],
        "updatedAt": "2024-03-01T12:00:00Z"
    })
    .to_string();
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, stored);
    let store = store_on(&backend);

    let mut envelope = store.read().await.unwrap();
    assert_eq!(envelope.characters.len(), 1);
    assert_eq!(envelope.characters[0].name, "Keeper");
    assert_eq!(envelope.last_character_id.as_deref(), good["id"].as_str());

    // The next write keeps the salvaged character
    store.write(&mut envelope).await.unwrap();
    let reread = store.read().await.unwrap();
    assert_eq!(reread.characters.len(), 1);
    assert_eq!(reread.characters[0].name, "Keeper");
}

#[tokio::test]
async fn test_strict_policy_rejects_one_undecodable_character() {
    let mut bad = character_json("Broken");
    bad["currentPage"] = json!("forty");
    let stored = json!({
        "version": CURRENT_VERSION,
        "characters": [character_json("Keeper"), bad],
        "lastCharacterId": null,
        "updatedAt": "2024-03-01T12:00:00Z"
    })
    .to_string();
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, stored.clone());
    let store = store_on(&backend).with_corruption_policy(CorruptionPolicy::Strict);

    assert!(matches!(store.read().await, Err(StoreError::Corrupted(_))));
    assert_eq!(backend.raw(DEFAULT_STORAGE_KEY).await, Some(stored));
}

#[tokio::test]
async fn test_normalizer_runs_on_read() {
    let mut edited = character_json("Edited");
    edited["currentStamina"] = json!(i32::MAX);
    let stored = json!({
        "version": CURRENT_VERSION,
        "characters": [edited],
        "lastCharacterId": null,
        "updatedAt": "2024-03-01T12:00:00Z"
    })
    .to_string();
    let backend = MemoryBackingStore::with_contents(DEFAULT_STORAGE_KEY, stored);

    let raw_read = store_on(&backend).read().await.unwrap();
    let sheet = raw_read.characters[0].sheet.as_classic().unwrap();
    assert_eq!(sheet.current_stamina, i32::MAX);

    let store = store_on(&backend).with_normalizer(|c| c.notes.push_str(" checked"));
    let normalized = store.read().await.unwrap();
    assert!(normalized.characters[0].notes.ends_with(" checked"));
}

// =============================================================================
// Export / Import
// =============================================================================

#[tokio::test]
async fn test_export_is_pretty_printed_envelope() {
    let backend = MemoryBackingStore::new();
    let text = store_on(&backend).export_data().await.unwrap();

    assert!(text.contains("\n  \"version\": 1"));
    let parsed: Envelope = serde_json::from_str(&text).unwrap();
    assert!(parsed.characters.is_empty());
}

#[tokio::test]
async fn test_import_replaces_rather_than_merges() {
    let backend = MemoryBackingStore::new();
    let store = store_on(&backend);
    let payload = json!({
        "version": 1,
        "characters": [character_json("Imported")],
        "lastCharacterId": null,
        "updatedAt": "2024-03-01T12:00:00Z"
    });
    store
        .import_data(&json!({"version": 1, "characters": [character_json("Existing")], "lastCharacterId": null, "updatedAt": "2024-01-01T00:00:00Z"}).to_string())
        .await
        .unwrap();

    let imported = store.import_data(&payload.to_string()).await.unwrap();
    assert_eq!(imported.characters.len(), 1);

    let envelope = store.read().await.unwrap();
    assert_eq!(envelope.characters.len(), 1);
    assert_eq!(envelope.characters[0].name, "Imported");
}

#[tokio::test]
async fn test_import_rejections() {
    let backend = MemoryBackingStore::new();
    let store = store_on(&backend);
    let a = character_json("A");

    let cases = [
        ("invalid json", "{".to_string()),
        ("zero version", json!({"version": 0, "characters": []}).to_string()),
        ("string version", json!({"version": "1", "characters": []}).to_string()),
        ("null characters", json!({"version": 1, "characters": null}).to_string()),
        (
            "newer version",
            json!({"version": CURRENT_VERSION + 1, "characters": []}).to_string(),
        ),
        (
            "bad character",
            json!({"version": 1, "characters": [{"id": "x"}], "lastCharacterId": null, "updatedAt": "2024-03-01T12:00:00Z"}).to_string(),
        ),
        (
            "duplicate ids",
            json!({"version": 1, "characters": [a.clone(), a], "lastCharacterId": null, "updatedAt": "2024-03-01T12:00:00Z"}).to_string(),
        ),
    ];

    for (case, payload) in cases {
        let err = store.import_data(&payload).await.unwrap_err();
        assert!(err.is_format(), "{case}: expected format error, got {err}");
    }
    assert!(backend.is_empty().await);
}
