// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use flashcard_tracker::config::{CardErrorPolicy, Config};
use flashcard_tracker::db::{DocumentStore, MemoryStore};
use flashcard_tracker::models::{CardColor, FlashcardDraft, SignUp, TaskList};
use flashcard_tracker::routes::create_router;
use flashcard_tracker::services::Session;
use flashcard_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a Firestore emulator connection.
#[allow(dead_code)]
pub async fn test_db() -> DocumentStore {
    DocumentStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> DocumentStore {
    DocumentStore::new_mock()
}

/// Shared state over an in-memory store. The returned `MemoryStore` is a
/// handle to the same contents.
#[allow(dead_code)]
pub fn memory_state(policy: CardErrorPolicy) -> (Arc<AppState>, MemoryStore) {
    let memory = MemoryStore::new();
    let config = Config {
        card_error_policy: policy,
        ..Config::test_default()
    };
    let state = Arc::new(AppState::new(
        config,
        DocumentStore::with_memory(memory.clone()),
    ));
    (state, memory)
}

/// Shared state over an offline store; every store call fails.
#[allow(dead_code)]
pub fn offline_state(policy: CardErrorPolicy) -> Arc<AppState> {
    let config = Config {
        card_error_policy: policy,
        ..Config::test_default()
    };
    Arc::new(AppState::new(config, test_db_offline()))
}

/// Create a test app over an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let (state, _) = memory_state(CardErrorPolicy::Mask);
    (create_router(state.clone()), state)
}

/// Sign up a user and return their session.
#[allow(dead_code)]
pub async fn sign_up(state: &AppState, email: &str, first_name: &str) -> Session {
    let signed_in = state
        .identity
        .sign_up(SignUp {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: first_name.to_string(),
        })
        .await
        .expect("sign up should succeed");
    Session::new(signed_in.uid)
}

/// Unique email for test isolation.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}@example.com")
}

#[allow(dead_code)]
pub fn parse_date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

/// The "Groceries" card used across tests.
#[allow(dead_code)]
pub fn groceries() -> FlashcardDraft {
    FlashcardDraft {
        title: "Groceries".to_string(),
        tasks: TaskList::new(["Milk", "Eggs"]),
        color: CardColor::Red,
        due_date: parse_date("2024-09-20"),
    }
}

#[allow(dead_code)]
pub fn draft(title: &str, due: &str) -> FlashcardDraft {
    FlashcardDraft {
        title: title.to_string(),
        tasks: TaskList::new(["one", "two", "three"]),
        color: CardColor::Green,
        due_date: parse_date(due),
    }
}
