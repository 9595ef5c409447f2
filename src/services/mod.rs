// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account_deletion;
pub mod card_actions;
pub mod identity;

pub use account_deletion::{AccountDeleter, DeletionReport};
pub use card_actions::CardActions;
pub use identity::{IdentityProvider, Session, SignedIn};
