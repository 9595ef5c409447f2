// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Google Cloud Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set)
    Firestore,
    /// Process-local store; contents are lost on restart
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreKind::Firestore),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::Invalid("FLASHCARDS_STORE", s.to_string())),
        }
    }
}

/// How flashcard operations report backend failures.
///
/// Profile and account operations always propagate; this only governs the
/// card operations (add, update, delete, list) and profile reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardErrorPolicy {
    /// Log the failure and return an empty/absent result.
    #[default]
    Mask,
    /// Return the failure to the caller.
    Propagate,
}

impl FromStr for CardErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mask" => Ok(CardErrorPolicy::Mask),
            "propagate" => Ok(CardErrorPolicy::Propagate),
            _ => Err(ConfigError::Invalid("CARD_ERROR_POLICY", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store backend
    pub store: StoreKind,
    /// Failure reporting for card operations
    pub card_error_policy: CardErrorPolicy,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store: env::var("FLASHCARDS_STORE")
                .map(|v| v.parse())
                .unwrap_or(Ok(StoreKind::Firestore))?,
            card_error_policy: env::var("CARD_ERROR_POLICY")
                .map(|v| v.parse())
                .unwrap_or(Ok(CardErrorPolicy::Mask))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
        })
    }

    /// Config for tests: in-memory store, masking policy, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store: StoreKind::Memory,
            card_error_policy: CardErrorPolicy::Mask,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
