//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::DocumentStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    pub const FLASHCARDS: &str = "flashcards";
    /// Profiles (keyed by uid)
    pub const USERS: &str = "users";
    /// Identity provider credentials (keyed by uid)
    pub const ACCOUNTS: &str = "accounts";
    /// In-progress account deletions (keyed by uid)
    pub const ACCOUNT_DELETIONS: &str = "account_deletions";
    /// Email ownership claims (keyed by encoded email)
    pub const ACCOUNT_EMAILS: &str = "account_emails";
}

/// Result of an edit applied to the current version of a document.
pub enum Edit<R> {
    /// Store the modified document, then return the value.
    Write(R),
    /// Leave the stored document untouched.
    Keep(R),
}

const DOCUMENT_ID_LEN: usize = 20;
const DOCUMENT_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a document ID in Firestore's auto-ID format (20 alphanumerics).
pub fn new_document_id() -> Result<String, AppError> {
    let rng = SystemRandom::new();
    // Largest multiple of the alphabet size that fits in a byte; bytes at or
    // above it are discarded so every character is equally likely.
    let limit = (256 / DOCUMENT_ID_ALPHABET.len() * DOCUMENT_ID_ALPHABET.len()) as u8;
    let mut id = String::with_capacity(DOCUMENT_ID_LEN);
    let mut buf = [0u8; 32];

    while id.len() < DOCUMENT_ID_LEN {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        for b in buf.iter().copied().filter(|b| *b < limit) {
            if id.len() == DOCUMENT_ID_LEN {
                break;
            }
            id.push(DOCUMENT_ID_ALPHABET[b as usize % DOCUMENT_ID_ALPHABET.len()] as char);
        }
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_fresh() {
        let a = new_document_id().unwrap();
        let b = new_document_id().unwrap();
        assert_eq!(a.len(), DOCUMENT_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
