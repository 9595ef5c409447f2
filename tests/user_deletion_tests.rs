// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Account deletion tests over the in-memory store.

use flashcard_tracker::config::CardErrorPolicy;
use flashcard_tracker::db::collections;
use flashcard_tracker::error::AppError;
use flashcard_tracker::models::{AccountDeletion, Credentials, DeletionStep};

mod common;
use common::{draft, groceries, memory_state, sign_up};

#[tokio::test]
async fn test_delete_account_removes_all_records() {
    let (state, memory) = memory_state(CardErrorPolicy::Mask);
    let doomed = sign_up(&state, "doomed@example.com", "Dee").await;
    let keeper = sign_up(&state, "keeper@example.com", "Kay").await;

    for i in 0..5 {
        state
            .cards
            .add_flashcard(&doomed, draft(&format!("card {i}"), "2024-09-20"))
            .await
            .unwrap();
    }
    state.cards.add_flashcard(&keeper, groceries()).await.unwrap();

    let report = state.cards.delete_user_account(&doomed).await.unwrap();
    assert_eq!(report.flashcards_deleted, 5);
    assert!(!report.resumed);

    // No cards, profile, account or marker remain for the deleted uid
    assert!(state.db.flashcards_for_user(&doomed.uid).await.unwrap().is_empty());
    assert!(state.cards.get_user_by_id(&doomed.uid).await.unwrap().is_none());
    assert!(state.db.get_account(&doomed.uid).await.unwrap().is_none());
    assert!(state.db.get_deletion(&doomed.uid).await.unwrap().is_none());

    // The other user is untouched
    assert_eq!(state.cards.get_flashcards(&keeper.uid).await.unwrap().len(), 1);
    assert_eq!(memory.count(collections::ACCOUNTS), 1);
}

#[tokio::test]
async fn test_deleted_identity_cannot_authenticate() {
    let (state, _) = memory_state(CardErrorPolicy::Mask);
    let session = sign_up(&state, "gone@example.com", "Gil").await;

    state.cards.delete_user_account(&session).await.unwrap();

    let sign_in = state
        .identity
        .sign_in(Credentials {
            email: "gone@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await;
    assert!(matches!(sign_in, Err(AppError::Unauthorized)));

    // A token issued before deletion no longer reaches the account
    assert!(matches!(
        state.cards.delete_user_account(&session).await,
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        state.cards.add_flashcard(&session, groceries()).await,
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_interrupted_deletion_resumes_from_marker() {
    let (state, _) = memory_state(CardErrorPolicy::Mask);
    let session = sign_up(&state, "crash@example.com", "Cas").await;
    state.cards.add_flashcard(&session, groceries()).await.unwrap();

    // Simulate a crash after the card step: cards gone, marker says profile is next
    let removed = state.db.delete_flashcards_for_user(&session.uid).await.unwrap();
    let mut marker = AccountDeletion::start(&session.uid, "2024-09-20T00:00:00Z");
    marker.step = DeletionStep::DeleteProfile;
    marker.flashcards_deleted = removed;
    state.db.set_deletion(&marker).await.unwrap();

    // Writes are refused while the deletion is pending
    assert!(matches!(
        state.cards.add_flashcard(&session, groceries()).await,
        Err(AppError::Unauthorized)
    ));

    let completed = state.cards.resume_pending_deletions().await.unwrap();
    assert_eq!(completed, 1);

    assert!(state.cards.get_user_by_id(&session.uid).await.unwrap().is_none());
    assert!(state.db.get_account(&session.uid).await.unwrap().is_none());
    assert!(state.db.pending_deletions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retried_request_finishes_deletion() {
    let (state, _) = memory_state(CardErrorPolicy::Mask);
    let session = sign_up(&state, "retry@example.com", "Ray").await;
    state.cards.add_flashcard(&session, groceries()).await.unwrap();

    state
        .db
        .set_deletion(&AccountDeletion::start(&session.uid, "2024-09-20T00:00:00Z"))
        .await
        .unwrap();

    let report = state.cards.delete_user_account(&session).await.unwrap();
    assert!(report.resumed);
    assert_eq!(report.flashcards_deleted, 1);
    assert!(state.db.get_account(&session.uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resume_with_nothing_pending() {
    let (state, _) = memory_state(CardErrorPolicy::Mask);
    assert_eq!(state.cards.resume_pending_deletions().await.unwrap(), 0);
}
