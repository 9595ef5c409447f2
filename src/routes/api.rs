// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::session_cookie_removal;
use crate::models::{Flashcard, FlashcardDraft, FlashcardPatch, ProfileUpdate, UserProfile};
use crate::services::Session;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_ID_LEN: usize = 128;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/flashcards", get(list_flashcards).post(create_flashcard))
        .route(
            "/api/flashcards/{id}",
            put(update_flashcard).delete(delete_flashcard),
        )
        .route("/api/flashcards/{id}/complete", post(complete_flashcard))
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/account", delete(delete_account))
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(AppError::BadRequest("Invalid flashcard id".to_string()));
    }
    Ok(())
}

// ─── Flashcards ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FlashcardListResponse {
    pub flashcards: Vec<Flashcard>,
}

/// Result of a create or update. `saved` is false when the write was
/// skipped (missing card) or its failure was masked.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveFlashcardResponse {
    pub saved: bool,
    pub flashcard: Option<Flashcard>,
}

impl From<Option<Flashcard>> for SaveFlashcardResponse {
    fn from(flashcard: Option<Flashcard>) -> Self {
        Self {
            saved: flashcard.is_some(),
            flashcard,
        }
    }
}

async fn list_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<FlashcardListResponse>> {
    let flashcards = state.cards.get_flashcards(&session.uid).await?;
    Ok(Json(FlashcardListResponse { flashcards }))
}

async fn create_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(draft): Json<FlashcardDraft>,
) -> Result<(StatusCode, Json<SaveFlashcardResponse>)> {
    let created = state.cards.add_flashcard(&session, draft).await?;
    let status = if created.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(created.into())))
}

async fn update_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(patch): Json<FlashcardPatch>,
) -> Result<Json<SaveFlashcardResponse>> {
    check_id(&id)?;
    let updated = state.cards.update_flashcard(&session, &id, patch).await?;
    Ok(Json(updated.into()))
}

async fn complete_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<SaveFlashcardResponse>> {
    check_id(&id)?;
    let updated = state.cards.complete_flashcard(&session, &id).await?;
    Ok(Json(updated.into()))
}

async fn delete_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    check_id(&id)?;
    state.cards.delete_flashcard(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .cards
        .get_user_by_id(&session.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.uid)))?;
    Ok(Json(profile))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<MessageResponse>> {
    state.cards.update_user_profile(&session, update).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Profile updated successfully".to_string(),
    }))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
    pub flashcards_deleted: usize,
}

/// Delete the user's account and all associated data, then clear the session.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    tracing::info!(uid = %session.uid, "User-initiated account deletion");

    let report = state.cards.delete_user_account(&session).await?;
    let jar = jar.remove(session_cookie_removal(&state.config.frontend_url));

    Ok((
        jar,
        Json(DeleteAccountResponse {
            success: true,
            message: "Account deleted successfully".to_string(),
            flashcards_deleted: report.flashcards_deleted,
        }),
    ))
}
