// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and sign-out routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::{session_cookie, session_cookie_removal};
use crate::models::{Credentials, SignUp};
use crate::services::SignedIn;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Session issued to the client. The token is also set as a cookie.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub uid: String,
    pub token: String,
}

fn with_session_cookie(
    state: &AppState,
    jar: CookieJar,
    signed_in: SignedIn,
) -> (CookieJar, Json<SessionResponse>) {
    let jar = jar.add(session_cookie(
        signed_in.token.clone(),
        &state.config.frontend_url,
    ));
    (
        jar,
        Json(SessionResponse {
            uid: signed_in.uid,
            token: signed_in.token,
        }),
    )
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignUp>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let signed_in = state.identity.sign_up(request).await?;
    let (jar, body) = with_session_cookie(&state, jar, signed_in);
    Ok((StatusCode::CREATED, jar, body))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let signed_in = state.identity.sign_in(credentials).await?;
    tracing::info!(uid = %signed_in.uid, "User signed in");
    Ok(with_session_cookie(&state, jar, signed_in))
}

/// Sign out. Tokens are stateless, so this only clears the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(session_cookie_removal(&state.config.frontend_url)),
        StatusCode::NO_CONTENT,
    )
}
