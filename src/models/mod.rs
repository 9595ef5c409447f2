// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod deletion;
pub mod flashcard;
pub mod user;

pub use deletion::{AccountDeletion, DeletionStep};
pub use flashcard::{
    CardColor, CompletionStatus, Flashcard, FlashcardDraft, FlashcardPatch, TaskList,
};
pub use user::{Account, Credentials, EmailClaim, ProfileUpdate, SignUp, UserProfile};
