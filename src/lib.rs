// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Flashcard Tracker: task flashcards with per-user storage
//!
//! This crate provides the backend API for creating, listing, completing
//! and deleting flashcards, and for managing the owning user's profile and
//! account.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{CardActions, IdentityProvider};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: DocumentStore,
    pub identity: IdentityProvider,
    pub cards: CardActions,
}

impl AppState {
    /// Wire the services on top of `db`.
    pub fn new(config: Config, db: DocumentStore) -> Self {
        let identity = IdentityProvider::new(db.clone(), config.jwt_signing_key.clone());
        let cards = CardActions::new(db.clone(), identity.clone(), config.card_error_policy);
        Self {
            config,
            db,
            identity,
            cards,
        }
    }
}
