// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted progress of an account deletion.

use serde::{Deserialize, Serialize};

/// Next step an account deletion has to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStep {
    DeleteFlashcards,
    DeleteProfile,
    DeleteIdentity,
}

impl DeletionStep {
    /// Step after this one, or `None` when the deletion is finished.
    pub fn next(self) -> Option<DeletionStep> {
        match self {
            DeletionStep::DeleteFlashcards => Some(DeletionStep::DeleteProfile),
            DeletionStep::DeleteProfile => Some(DeletionStep::DeleteIdentity),
            DeletionStep::DeleteIdentity => None,
        }
    }
}

/// Marker stored in `account_deletions`, keyed by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeletion {
    pub uid: String,
    pub step: DeletionStep,
    #[serde(default)]
    pub flashcards_deleted: usize,
    pub started_at: String,
    pub updated_at: String,
}

impl AccountDeletion {
    pub fn start(uid: &str, now: &str) -> Self {
        Self {
            uid: uid.to_string(),
            step: DeletionStep::DeleteFlashcards,
            flashcards_deleted: 0,
            started_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}
