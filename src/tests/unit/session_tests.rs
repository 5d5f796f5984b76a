//! Character Session Tests
//!
//! Snapshot, merge and persist through the repository, and undo against
//! the currently loaded character.

use std::time::Duration;

use crate::core::rules::classic::{eat_meal, test_luck};
use crate::core::session::UndoOutcome;
use crate::database::{CharacterPatch, CharacterRepository, ClassicPatch, StoreError};
use crate::tests::common::{
    create_session_on, create_session_with_window, create_test_character, create_test_session,
    FailingBackingStore,
};

fn stamina(patch_value: i32) -> CharacterPatch {
    ClassicPatch {
        current_stamina: Some(patch_value),
        ..Default::default()
    }
    .into()
}

#[tokio::test]
async fn test_load_sets_current_and_active_pointer() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();

    let loaded = session.load(&ayla.id).await.unwrap().cloned();
    assert_eq!(loaded.map(|c| c.id), Some(ayla.id.clone()));
    assert_eq!(
        session.repository().get_last_character_id().await.unwrap(),
        Some(ayla.id.clone())
    );

    assert!(session.load("missing").await.unwrap().is_none());
    assert_eq!(session.current().map(|c| c.id.clone()), Some(ayla.id));
}

#[tokio::test]
async fn test_resume_loads_last_character() {
    let mut session = create_test_session();
    assert!(session.resume().await.unwrap().is_none());

    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.repository().set_last_character_id(&ayla.id).await.unwrap();

    let resumed = session.resume().await.unwrap().map(|c| c.name.clone());
    assert_eq!(resumed.as_deref(), Some("Ayla"));
}

#[tokio::test]
async fn test_update_without_character_is_none() {
    let mut session = create_test_session();
    assert!(session.update(&CharacterPatch::page(3), None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_described_update_can_be_undone() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    let updated = session
        .update(&stamina(12), Some("Lost 8 stamina"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.sheet.as_classic().unwrap().current_stamina, 12);
    assert!(session.undo_controller().is_armed());

    match session.undo().await.unwrap() {
        UndoOutcome::Restored(restored) => {
            assert_eq!(restored.sheet.as_classic().unwrap().current_stamina, 20);
        }
        other => panic!("expected restore, got {:?}", other),
    }

    let stored = session.repository().get_character(&ayla.id).await.unwrap().unwrap();
    assert_eq!(stored.sheet.as_classic().unwrap().current_stamina, 20);
    assert_eq!(session.current().unwrap().sheet, stored.sheet);
    assert_eq!(session.undo().await.unwrap(), UndoOutcome::Nothing);
}

#[tokio::test]
async fn test_undo_survives_failed_restore() {
    let backend = FailingBackingStore::new();
    let mut session = create_session_on(&backend);
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();
    session.update(&stamina(12), Some("Lost 8 stamina")).await.unwrap();

    backend.set_fail_writes(true);
    let err = session.undo().await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    assert!(session.undo_controller().is_armed());
    assert_eq!(session.current().unwrap().sheet.as_classic().unwrap().current_stamina, 12);

    backend.set_fail_writes(false);
    match session.undo().await.unwrap() {
        UndoOutcome::Restored(restored) => {
            assert_eq!(restored.sheet.as_classic().unwrap().current_stamina, 20);
        }
        other => panic!("expected restore, got {:?}", other),
    }
    assert!(!session.undo_controller().is_armed());
    let stored = session.repository().get_character(&ayla.id).await.unwrap().unwrap();
    assert_eq!(stored.sheet.as_classic().unwrap().current_stamina, 20);
}

#[tokio::test]
async fn test_undescribed_update_does_not_arm() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    session.update(&CharacterPatch::notes("Met the ferryman"), None).await.unwrap();
    session.update(&CharacterPatch::page(117), None).await.unwrap();

    assert!(!session.undo_controller().is_armed());
    let current = session.current().unwrap();
    assert_eq!(current.notes, "Met the ferryman");
    assert_eq!(current.current_page, 117);
}

#[tokio::test]
async fn test_only_latest_described_update_is_recoverable() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    session.update(&stamina(15), Some("A")).await.unwrap();
    session.update(&stamina(10), Some("B")).await.unwrap();

    let UndoOutcome::Restored(restored) = session.undo().await.unwrap() else {
        panic!("expected restore");
    };
    assert_eq!(restored.sheet.as_classic().unwrap().current_stamina, 15);
    assert_eq!(session.undo().await.unwrap(), UndoOutcome::Nothing);
}

#[tokio::test]
async fn test_undo_after_switch_is_noop() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    let bram = create_test_character("Bram");
    session.repository().save_character(&ayla).await.unwrap();
    session.repository().save_character(&bram).await.unwrap();

    session.load(&ayla.id).await.unwrap();
    session.update(&stamina(5), Some("Hit by troll")).await.unwrap();

    session.load(&bram.id).await.unwrap();
    session.update(&CharacterPatch::notes("Second hero"), None).await.unwrap();
    let bram_before = session.repository().get_character(&bram.id).await.unwrap();

    assert_eq!(session.undo().await.unwrap(), UndoOutcome::Nothing);
    assert_eq!(
        session.repository().get_character(&bram.id).await.unwrap(),
        bram_before
    );
    let ayla_stored = session.repository().get_character(&ayla.id).await.unwrap().unwrap();
    assert_eq!(ayla_stored.sheet.as_classic().unwrap().current_stamina, 5);
}

#[tokio::test]
async fn test_rule_engine_patches_flow_through_session() {
    let mut session = create_test_session();
    let mut ayla = create_test_character("Ayla");
    ayla.apply_patch(
        &ClassicPatch {
            meals: Some(2),
            current_stamina: Some(10),
            ..Default::default()
        }
        .into(),
    );
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    let sheet = session.current().unwrap().sheet.as_classic().unwrap().clone();
    let patch = eat_meal(&sheet).into_patch().unwrap();
    session.update(&patch.into(), Some("Ate a meal")).await.unwrap();

    let sheet = session.current().unwrap().sheet.as_classic().unwrap().clone();
    assert_eq!((sheet.meals, sheet.current_stamina), (1, 14));

    let luck = test_luck(&sheet, 12);
    session.update(&luck.patch().into(), Some("Tested luck")).await.unwrap();
    assert_eq!(session.current().unwrap().sheet.as_classic().unwrap().current_luck, 8);

    // Undo reverts only the luck test
    session.undo().await.unwrap();
    let sheet = session.current().unwrap().sheet.as_classic().unwrap();
    assert_eq!((sheet.current_luck, sheet.meals), (9, 1));
}

#[tokio::test]
async fn test_unload_and_dismiss() {
    let mut session = create_test_session();
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    session.update(&stamina(18), Some("A")).await.unwrap();
    assert!(session.dismiss_undo());
    assert_eq!(session.undo().await.unwrap(), UndoOutcome::Nothing);

    session.update(&stamina(17), Some("B")).await.unwrap();
    session.unload();
    assert!(session.current().is_none());
    assert!(!session.undo_controller().is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_undo_after_expiry_is_noop() {
    let mut session = create_session_with_window(Duration::from_secs(5));
    let ayla = create_test_character("Ayla");
    session.repository().save_character(&ayla).await.unwrap();
    session.load(&ayla.id).await.unwrap();

    session.update(&stamina(3), Some("Fell into a pit")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    tokio::task::yield_now().await;

    assert_eq!(session.undo().await.unwrap(), UndoOutcome::Nothing);
    assert_eq!(session.current().unwrap().sheet.as_classic().unwrap().current_stamina, 3);
}
