// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data-access layer: one operation per user intent.
//!
//! Every operation is a single round trip to the store (plus the lookups
//! needed to scope it to the caller) and never retries. Operations that act
//! for a user take the caller's `Session` explicitly.
//!
//! Failure reporting for card operations and profile reads follows the
//! configured [`CardErrorPolicy`]. Profile updates and account deletion
//! always propagate failures, and validation errors always propagate.

use crate::config::CardErrorPolicy;
use crate::db::{new_document_id, DocumentStore, Edit};
use crate::error::{AppError, Result};
use crate::models::flashcard::StatusRegression;
use crate::models::{Flashcard, FlashcardDraft, FlashcardPatch, ProfileUpdate, UserProfile};
use crate::services::account_deletion::{AccountDeleter, DeletionReport};
use crate::services::identity::{IdentityProvider, Session};
use crate::time_utils::now_rfc3339;
use validator::Validate;

/// What an update found when it reached the stored card.
enum PatchOutcome {
    Updated(Flashcard),
    OwnedBy(String),
    Regressed(StatusRegression),
}

#[derive(Clone)]
pub struct CardActions {
    db: DocumentStore,
    identity: IdentityProvider,
    deleter: AccountDeleter,
    policy: CardErrorPolicy,
}

impl CardActions {
    pub fn new(db: DocumentStore, identity: IdentityProvider, policy: CardErrorPolicy) -> Self {
        let deleter = AccountDeleter::new(db.clone(), identity.clone());
        Self {
            db,
            identity,
            deleter,
            policy,
        }
    }

    pub fn policy(&self) -> CardErrorPolicy {
        self.policy
    }

    /// Apply the card error policy: backend failures become `fallback`
    /// when masking; everything else passes through.
    fn apply_policy<T>(&self, result: Result<T>, fallback: T, operation: &'static str) -> Result<T> {
        match result {
            Err(e) if e.is_backend_failure() => {
                tracing::error!(operation, error = %e, "Card operation failed");
                match self.policy {
                    CardErrorPolicy::Mask => Ok(fallback),
                    CardErrorPolicy::Propagate => Err(e),
                }
            }
            other => other,
        }
    }

    /// The session must belong to an existing account that is not being deleted.
    async fn ensure_active(&self, session: &Session) -> Result<()> {
        self.identity.account(session).await?;
        if self.db.get_deletion(&session.uid).await?.is_some() {
            tracing::warn!(uid = %session.uid, "Write rejected: account deletion in progress");
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }

    // ─── Flashcards ──────────────────────────────────────────────

    /// Create a card owned by the session's user.
    ///
    /// Returns `None` if a backend failure was masked.
    pub async fn add_flashcard(
        &self,
        session: &Session,
        draft: FlashcardDraft,
    ) -> Result<Option<Flashcard>> {
        draft.validate()?;
        let result = self.try_add(session, draft).await.map(Some);
        self.apply_policy(result, None, "add_flashcard")
    }

    async fn try_add(&self, session: &Session, draft: FlashcardDraft) -> Result<Flashcard> {
        // Refuse to create cards for an account that is gone or going.
        self.ensure_active(session).await?;

        let card = draft.into_flashcard(new_document_id()?, &session.uid, &now_rfc3339());
        self.db.set_flashcard(&card).await?;

        // A deletion that started after the first check may already have
        // swept this user's cards; take the new one back out.
        if let Err(e) = self.ensure_active(session).await {
            tracing::warn!(uid = %session.uid, flashcard_id = %card.id, "Account went away during create");
            self.db.delete_flashcard(&card.id).await?;
            return Err(e);
        }

        tracing::info!(uid = %session.uid, flashcard_id = %card.id, "Flashcard saved");
        Ok(card)
    }

    /// Merge `patch` into the card `id`.
    ///
    /// A missing card, or one owned by someone else, is logged and ignored
    /// (`Ok(None)`). Re-opening a completed card is a `BadRequest`.
    pub async fn update_flashcard(
        &self,
        session: &Session,
        id: &str,
        patch: FlashcardPatch,
    ) -> Result<Option<Flashcard>> {
        patch.validate()?;
        let result = self.try_update(session, id, patch).await;
        self.apply_policy(result, None, "update_flashcard")
    }

    async fn try_update(
        &self,
        session: &Session,
        id: &str,
        patch: FlashcardPatch,
    ) -> Result<Option<Flashcard>> {
        let uid = session.uid.clone();
        let now = now_rfc3339();

        // Checked and merged against the stored version in one atomic step,
        // so a concurrent completion or delete is never overwritten.
        let outcome = self
            .db
            .edit_flashcard(id, move |card| {
                if card.uid != uid {
                    return Edit::Keep(PatchOutcome::OwnedBy(card.uid.clone()));
                }
                match patch.clone().apply_to(card, &now) {
                    Ok(()) => Edit::Write(PatchOutcome::Updated(card.clone())),
                    Err(regression) => Edit::Keep(PatchOutcome::Regressed(regression)),
                }
            })
            .await?;

        match outcome {
            None => {
                tracing::warn!(uid = %session.uid, flashcard_id = id, "Update of missing flashcard ignored");
                Ok(None)
            }
            Some(PatchOutcome::OwnedBy(owner)) => {
                tracing::warn!(
                    uid = %session.uid,
                    owner = %owner,
                    flashcard_id = id,
                    "Update of another user's flashcard ignored"
                );
                Ok(None)
            }
            Some(PatchOutcome::Regressed(regression)) => {
                Err(AppError::BadRequest(regression.to_string()))
            }
            Some(PatchOutcome::Updated(card)) => {
                tracing::info!(uid = %session.uid, flashcard_id = id, status = %card.status, "Flashcard updated");
                Ok(Some(card))
            }
        }
    }

    /// Mark a card complete.
    pub async fn complete_flashcard(&self, session: &Session, id: &str) -> Result<Option<Flashcard>> {
        self.update_flashcard(session, id, FlashcardPatch::complete())
            .await
    }

    /// Delete the card `id`. Deleting a missing card is not an error.
    pub async fn delete_flashcard(&self, session: &Session, id: &str) -> Result<()> {
        let result = self.try_delete(session, id).await;
        self.apply_policy(result, (), "delete_flashcard")
    }

    async fn try_delete(&self, session: &Session, id: &str) -> Result<()> {
        if self.owned_flashcard(session, id).await?.is_none() {
            tracing::debug!(uid = %session.uid, flashcard_id = id, "Flashcard already absent");
            return Ok(());
        }

        self.db.delete_flashcard(id).await?;
        tracing::info!(uid = %session.uid, flashcard_id = id, "Flashcard deleted");
        Ok(())
    }

    /// The card `id` if it exists and belongs to the session's user.
    async fn owned_flashcard(&self, session: &Session, id: &str) -> Result<Option<Flashcard>> {
        match self.db.get_flashcard(id).await? {
            Some(card) if card.uid == session.uid => Ok(Some(card)),
            Some(card) => {
                tracing::warn!(
                    uid = %session.uid,
                    owner = %card.uid,
                    flashcard_id = id,
                    "Flashcard belongs to another user"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// All cards owned by `user_id`, ordered by due date.
    ///
    /// Under the masking policy a backend failure yields an empty list.
    pub async fn get_flashcards(&self, user_id: &str) -> Result<Vec<Flashcard>> {
        let result = self.db.flashcards_for_user(user_id).await.map(|mut cards| {
            cards.retain(|card| card.uid == user_id);
            cards.sort_by(|a, b| {
                (a.due_date, &a.title, &a.id).cmp(&(b.due_date, &b.title, &b.id))
            });
            cards
        });
        self.apply_policy(result, Vec::new(), "get_flashcards")
    }

    // ─── Profiles ────────────────────────────────────────────────

    /// The profile for `uid`, or `None` if there is no such user.
    pub async fn get_user_by_id(&self, uid: &str) -> Result<Option<UserProfile>> {
        let result = self.db.get_profile(uid).await;
        if let Ok(None) = result {
            tracing::info!(uid, "No such user");
        }
        self.apply_policy(result, None, "get_user_by_id")
    }

    /// Change the password and/or display name of the session's user.
    ///
    /// The password is written first. The two writes are independent: if the
    /// name update fails afterwards the new password stays in place and the
    /// error is returned.
    pub async fn update_user_profile(&self, session: &Session, update: ProfileUpdate) -> Result<()> {
        let update = ProfileUpdate {
            first_name: update.first_name.map(|n| n.trim().to_string()),
            password: update.password,
        };
        if update.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        update.validate()?;

        let result = self.try_update_profile(session, update).await;
        match &result {
            Ok(()) => tracing::info!(uid = %session.uid, "User profile updated successfully"),
            Err(e) => tracing::error!(uid = %session.uid, error = %e, "Error updating user profile"),
        }
        result
    }

    async fn try_update_profile(&self, session: &Session, update: ProfileUpdate) -> Result<()> {
        self.identity.account(session).await?;

        if let Some(password) = &update.password {
            self.identity.update_password(session, password).await?;
        }

        if let Some(first_name) = update.first_name {
            let mut profile = self
                .db
                .get_profile(&session.uid)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.uid)))?;
            profile.first_name = first_name;
            self.db.set_profile(&profile).await?;
        }

        Ok(())
    }

    // ─── Accounts ────────────────────────────────────────────────

    /// Delete the session's cards, profile and identity account.
    ///
    /// Retrying after a failure continues where the last attempt stopped.
    pub async fn delete_user_account(&self, session: &Session) -> Result<DeletionReport> {
        let result = self.try_delete_account(session).await;
        if let Err(e) = &result {
            tracing::error!(uid = %session.uid, error = %e, "Error deleting user account");
        }
        result
    }

    async fn try_delete_account(&self, session: &Session) -> Result<DeletionReport> {
        // An interrupted deletion may already have removed other records, but
        // the identity goes last, so a live session still finds its account.
        if self.db.get_deletion(&session.uid).await?.is_none() {
            self.identity.account(session).await?;
        }
        self.deleter.run(&session.uid).await
    }

    /// Finish deletions interrupted by a crash or failure.
    pub async fn resume_pending_deletions(&self) -> Result<usize> {
        self.deleter.resume_pending().await
    }
}
