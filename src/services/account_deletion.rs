// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resumable account deletion.
//!
//! Deleting an account touches three places: the user's flashcards, the
//! profile document and the identity account. Progress is persisted in the
//! `account_deletions` collection before and after each step, and every
//! step is idempotent, so an interrupted deletion can be run again from its
//! marker until it completes.

use crate::db::DocumentStore;
use crate::error::Result;
use crate::models::{AccountDeletion, DeletionStep};
use crate::services::identity::IdentityProvider;
use crate::time_utils::now_rfc3339;

/// Outcome of a completed deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub uid: String,
    pub flashcards_deleted: usize,
    /// True when an earlier, interrupted deletion was continued.
    pub resumed: bool,
}

#[derive(Clone)]
pub struct AccountDeleter {
    db: DocumentStore,
    identity: IdentityProvider,
}

impl AccountDeleter {
    pub fn new(db: DocumentStore, identity: IdentityProvider) -> Self {
        Self { db, identity }
    }

    /// Start, or continue, the deletion of `uid`.
    pub async fn run(&self, uid: &str) -> Result<DeletionReport> {
        let (marker, resumed) = match self.db.get_deletion(uid).await? {
            Some(marker) => {
                tracing::info!(uid, step = ?marker.step, "Resuming account deletion");
                (marker, true)
            }
            None => {
                let marker = AccountDeletion::start(uid, &now_rfc3339());
                self.db.set_deletion(&marker).await?;
                tracing::info!(uid, "Account deletion started");
                (marker, false)
            }
        };

        let marker = self.finish(marker).await?;

        tracing::info!(
            uid,
            flashcards_deleted = marker.flashcards_deleted,
            resumed,
            "User account and associated data deleted"
        );

        Ok(DeletionReport {
            uid: marker.uid,
            flashcards_deleted: marker.flashcards_deleted,
            resumed,
        })
    }

    /// Complete every deletion left unfinished by an earlier run.
    ///
    /// Failures are logged per account; returns how many were completed.
    pub async fn resume_pending(&self) -> Result<usize> {
        let pending = self.db.pending_deletions().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = pending.len(), "Resuming pending account deletions");
        let mut completed = 0;
        for marker in pending {
            let uid = marker.uid.clone();
            match self.finish(marker).await {
                Ok(_) => completed += 1,
                Err(e) => {
                    tracing::error!(uid = %uid, error = %e, "Failed to resume account deletion")
                }
            }
        }
        Ok(completed)
    }

    /// Run the remaining steps of `marker`, persisting progress after each.
    async fn finish(&self, mut marker: AccountDeletion) -> Result<AccountDeletion> {
        let mut step = Some(marker.step);
        while let Some(current) = step {
            self.perform(&mut marker, current).await?;
            step = current.next();

            if let Some(next) = step {
                marker.step = next;
                marker.updated_at = now_rfc3339();
                self.db.set_deletion(&marker).await?;
            }
        }

        self.db.delete_deletion(&marker.uid).await?;
        Ok(marker)
    }

    async fn perform(&self, marker: &mut AccountDeletion, step: DeletionStep) -> Result<()> {
        let uid = marker.uid.as_str();
        match step {
            DeletionStep::DeleteFlashcards => {
                let count = self.db.delete_flashcards_for_user(uid).await?;
                marker.flashcards_deleted += count;
            }
            DeletionStep::DeleteProfile => {
                self.db.delete_profile(uid).await?;
                tracing::debug!(uid, "Deleted user profile");
            }
            DeletionStep::DeleteIdentity => {
                self.identity.delete_account(uid).await?;
            }
        }
        Ok(())
    }
}
