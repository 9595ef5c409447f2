// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Start it with `gcloud emulators firestore start` and export
//! FIRESTORE_EMULATOR_HOST before running `cargo test`.
//!
//! Every test uses fresh uids, so state left over from earlier runs does
//! not interfere.

use flashcard_tracker::config::{CardErrorPolicy, Config};
use flashcard_tracker::db::{new_document_id, Edit};
use flashcard_tracker::error::AppError;
use flashcard_tracker::models::{
    AccountDeletion, CompletionStatus, DeletionStep, FlashcardPatch, SignUp, UserProfile,
};
use flashcard_tracker::services::Session;
use flashcard_tracker::AppState;

mod common;
use common::{draft, groceries, sign_up, test_db, unique_email};

fn unique_uid() -> String {
    new_document_id().unwrap()
}

async fn emulator_state() -> AppState {
    let config = Config {
        card_error_policy: CardErrorPolicy::Propagate,
        ..Config::test_default()
    };
    AppState::new(config, test_db().await)
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();

    assert!(db.get_profile(&uid).await.unwrap().is_none());

    let profile = UserProfile {
        id: uid.clone(),
        first_name: "Test".to_string(),
        created_at: "2024-01-15T10:00:00Z".to_string(),
    };
    db.set_profile(&profile).await.unwrap();
    assert_eq!(db.get_profile(&uid).await.unwrap(), Some(profile));

    db.delete_profile(&uid).await.unwrap();
    assert!(db.get_profile(&uid).await.unwrap().is_none());

    // Deleting again is not an error
    db.delete_profile(&uid).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// FLASHCARD TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_flashcards_scoped_to_owner() {
    require_emulator!();

    let state = emulator_state().await;
    let alice = sign_up(&state, &unique_email("alice"), "Alice").await;
    let bob = sign_up(&state, &unique_email("bob"), "Bob").await;

    let card = state
        .cards
        .add_flashcard(&alice, groceries())
        .await
        .unwrap()
        .expect("card should be saved");
    state
        .cards
        .add_flashcard(&bob, draft("Bob's card", "2024-09-21"))
        .await
        .unwrap();

    let cards = state.cards.get_flashcards(&alice.uid).await.unwrap();
    assert_eq!(cards, vec![card.clone()]);

    let stored = state.db.get_flashcard(&card.id).await.unwrap().unwrap();
    assert_eq!(stored.tasks.as_slice(), ["Milk", "Eggs"]);
    assert_eq!(stored.due_date, card.due_date);
}

#[tokio::test]
async fn test_delete_flashcards_for_user_batches() {
    require_emulator!();

    let state = emulator_state().await;
    let session = sign_up(&state, &unique_email("many"), "Manny").await;

    for i in 0..25 {
        state
            .cards
            .add_flashcard(&session, draft(&format!("card {i}"), "2024-09-20"))
            .await
            .unwrap();
    }

    let removed = state.db.delete_flashcards_for_user(&session.uid).await.unwrap();
    assert_eq!(removed, 25);
    assert!(state.cards.get_flashcards(&session.uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transactional_edit_of_missing_card_creates_nothing() {
    require_emulator!();

    let db = test_db().await;
    let id = unique_uid();

    let edited = db
        .edit_flashcard(&id, |card| {
            card.title = "ghost".to_string();
            Edit::Write(())
        })
        .await
        .unwrap();

    assert!(edited.is_none());
    assert!(db.get_flashcard(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_rename_and_complete_both_land() {
    require_emulator!();

    let state = emulator_state().await;
    let session = sign_up(&state, &unique_email("both"), "Bo").await;
    let card = state
        .cards
        .add_flashcard(&session, groceries())
        .await
        .unwrap()
        .unwrap();

    let rename = state.cards.update_flashcard(
        &session,
        &card.id,
        FlashcardPatch {
            title: Some("renamed".to_string()),
            ..Default::default()
        },
    );
    let complete = state.cards.complete_flashcard(&session, &card.id);
    let (renamed, completed) = tokio::join!(rename, complete);
    renamed.unwrap();
    completed.unwrap();

    let stored = state.db.get_flashcard(&card.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "renamed");
    assert_eq!(stored.status, CompletionStatus::Complete);
}

#[tokio::test]
async fn test_email_claimed_once() {
    require_emulator!();

    let state = emulator_state().await;
    let email = unique_email("claim");
    sign_up(&state, &email, "Cal").await;

    let again = state
        .identity
        .sign_up(SignUp {
            email,
            password: "password123".to_string(),
            first_name: "Cal".to_string(),
        })
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_account_lookup_by_email() {
    require_emulator!();

    let state = emulator_state().await;
    let email = unique_email("Lookup");
    let session = sign_up(&state, &email, "Lou").await;

    let account = state
        .db
        .find_account_by_email(&email.to_lowercase())
        .await
        .unwrap()
        .expect("account should be found by email");
    assert_eq!(account.uid, session.uid);
}

#[tokio::test]
async fn test_full_account_deletion() {
    require_emulator!();

    let state = emulator_state().await;
    let session = sign_up(&state, &unique_email("gone"), "Gwen").await;
    state.cards.add_flashcard(&session, groceries()).await.unwrap();

    let report = state.cards.delete_user_account(&session).await.unwrap();
    assert_eq!(report.flashcards_deleted, 1);

    assert!(state.db.get_profile(&session.uid).await.unwrap().is_none());
    assert!(state.db.get_account(&session.uid).await.unwrap().is_none());
    assert!(state.db.get_deletion(&session.uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deletion_marker_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let session = Session::new(unique_uid());

    let mut marker = AccountDeletion::start(&session.uid, "2024-09-20T00:00:00Z");
    marker.step = DeletionStep::DeleteIdentity;
    db.set_deletion(&marker).await.unwrap();

    assert_eq!(db.get_deletion(&session.uid).await.unwrap(), Some(marker));
    assert!(db
        .pending_deletions()
        .await
        .unwrap()
        .iter()
        .any(|m| m.uid == session.uid));

    db.delete_deletion(&session.uid).await.unwrap();
    assert!(db.get_deletion(&session.uid).await.unwrap().is_none());
}
