// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flashcard Tracker API Server
//!
//! Stores users' task flashcards and profiles and serves them to the
//! mobile and web clients.

use flashcard_tracker::{config::Config, db::DocumentStore, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        store = ?config.store,
        card_error_policy = ?config.card_error_policy,
        "Starting Flashcard Tracker API"
    );

    let db = DocumentStore::connect(&config).await?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Finish account deletions interrupted by an earlier crash
    let cards = state.cards.clone();
    tokio::spawn(async move {
        match cards.resume_pending_deletions().await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Resumed pending account deletions"),
            Err(e) => tracing::error!(error = %e, "Failed to list pending account deletions"),
        }
    });

    // Build router
    let app = flashcard_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flashcard_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
