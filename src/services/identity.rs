// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider: accounts, password credentials and session tokens.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 hashes with a per-account
//! salt. Sessions are stateless HS256 JWTs whose subject is the uid.

use crate::db::{new_document_id, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::user::MIN_PASSWORD_LEN;
use crate::models::{Account, Credentials, EmailClaim, SignUp, UserProfile};
use crate::time_utils::now_rfc3339;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::{SystemTime, UNIX_EPOCH};
use validator::Validate;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
/// Session token lifetime: 30 days.
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Salt for the verification run when no account matches, so unknown
/// emails cost the same as wrong passwords.
static UNKNOWN_ACCOUNT_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

/// The verified identity behind a request.
///
/// Passed explicitly to every data-access operation that acts on behalf of
/// a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (uid)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub uid: String,
    pub token: String,
}

/// Identity provider backed by the `accounts` collection.
#[derive(Clone)]
pub struct IdentityProvider {
    db: DocumentStore,
    signing_key: Vec<u8>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

fn hash_password(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations(), salt, password.as_bytes(), &mut out);
    out
}

impl IdentityProvider {
    pub fn new(db: DocumentStore, signing_key: Vec<u8>) -> Self {
        Self { db, signing_key }
    }

    /// Create an account and its profile, then sign in.
    ///
    /// The email is claimed first; a concurrent sign-up for the same email
    /// gets `Conflict`.
    pub async fn sign_up(&self, request: SignUp) -> Result<SignedIn> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let uid = new_document_id()?;

        let claim = EmailClaim {
            email: email.clone(),
            uid: uid.clone(),
        };
        if !self.db.claim_email(&claim).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        if let Err(e) = self.create_account(&uid, email, &request).await {
            if let Err(release) = self.db.release_email(&claim.email).await {
                tracing::error!(uid = %uid, error = %release, "Failed to release email claim");
            }
            return Err(e);
        }

        tracing::info!(uid = %uid, "Account created");

        let token = self.issue_token(&uid)?;
        Ok(SignedIn { uid, token })
    }

    async fn create_account(&self, uid: &str, email: String, request: &SignUp) -> Result<()> {
        let now = now_rfc3339();
        let (password_hash, password_salt) = self.new_credentials(&request.password)?;

        let account = Account {
            uid: uid.to_string(),
            email,
            password_hash,
            password_salt,
            created_at: now.clone(),
        };
        self.db.set_account(&account).await?;

        let profile = UserProfile {
            id: uid.to_string(),
            first_name: request.first_name.trim().to_string(),
            created_at: now,
        };
        self.db.set_profile(&profile).await
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignedIn> {
        let email = normalize_email(&credentials.email);
        let Some(account) = self.db.find_account_by_email(&email).await? else {
            tracing::debug!("Sign-in for unknown email");
            let _ = pbkdf2::verify(
                PBKDF2_ALG,
                iterations(),
                &UNKNOWN_ACCOUNT_SALT,
                credentials.password.as_bytes(),
                &[0u8; HASH_LEN],
            );
            return Err(AppError::Unauthorized);
        };

        let salt = STANDARD
            .decode(&account.password_salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt password salt: {}", e)))?;
        let expected = STANDARD
            .decode(&account.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt password hash: {}", e)))?;

        pbkdf2::verify(
            PBKDF2_ALG,
            iterations(),
            &salt,
            credentials.password.as_bytes(),
            &expected,
        )
        .map_err(|_| {
            tracing::debug!(uid = %account.uid, "Sign-in with wrong password");
            AppError::Unauthorized
        })?;

        let token = self.issue_token(&account.uid)?;
        Ok(SignedIn {
            uid: account.uid,
            token,
        })
    }

    /// Create a JWT for a user session.
    pub fn issue_token(&self, uid: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let claims = Claims {
            sub: uid.to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AppError::Internal(e.into()))
    }

    /// Validate a session token. Does not touch the store.
    pub fn verify_token(&self, token: &str) -> Result<Session> {
        let key = DecodingKey::from_secret(&self.signing_key);
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &key, &validation).map_err(|_| AppError::InvalidToken)?;
        if data.claims.sub.is_empty() {
            return Err(AppError::InvalidToken);
        }
        Ok(Session::new(data.claims.sub))
    }

    /// The session's account, or `Unauthorized` if it no longer exists.
    pub async fn account(&self, session: &Session) -> Result<Account> {
        self.db
            .get_account(&session.uid)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Replace the password of the session's account.
    pub async fn update_password(&self, session: &Session, password: &str) -> Result<()> {
        if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let mut account = self.account(session).await?;
        let (password_hash, password_salt) = self.new_credentials(password)?;
        account.password_hash = password_hash;
        account.password_salt = password_salt;
        self.db.set_account(&account).await?;

        tracing::info!(uid = %session.uid, "Password updated");
        Ok(())
    }

    /// Remove the account for `uid` and free its email. Removing a missing
    /// account succeeds.
    pub async fn delete_account(&self, uid: &str) -> Result<()> {
        let Some(account) = self.db.get_account(uid).await? else {
            return Ok(());
        };
        // Claim first: if interrupted, the account is still there to find
        // the email from on the next attempt.
        self.db.release_email(&account.email).await?;
        self.db.delete_account(uid).await?;
        tracing::info!(uid, "Identity account deleted");
        Ok(())
    }

    fn new_credentials(&self, password: &str) -> Result<(String, String)> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        let hash = hash_password(password, &salt);
        Ok((STANDARD.encode(hash), STANDARD.encode(salt)))
    }
}
