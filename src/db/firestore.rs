// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store with typed operations.
//!
//! Provides high-level operations for:
//! - Flashcards (owner-scoped card records)
//! - Users (profile storage)
//! - Accounts (identity provider credentials)
//! - Account deletions (resumable deletion markers)
//! - Email claims (one account per email)

use crate::config::{Config, StoreKind};
use crate::db::memory::MemoryStore;
use crate::db::{collections, Edit};
use crate::error::AppError;
use crate::models::{Account, AccountDeletion, EmailClaim, Flashcard, UserProfile};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{FirestoreDb, FirestoreTransaction};
use futures_util::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(MemoryStore),
    /// Every call fails; used to exercise failure paths.
    Offline,
}

/// Handle to the document store. Cheap to clone.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Backend,
}

impl DocumentStore {
    /// Open the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store {
            StoreKind::Firestore => Self::new(&config.gcp_project_id).await,
            StoreKind::Memory => {
                tracing::warn!("Using in-memory document store; data is not persisted");
                Ok(Self::in_memory())
            }
        }
    }

    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::with_memory(MemoryStore::new())
    }

    /// Store backed by an existing memory store (tests keep a handle to it).
    pub fn with_memory(store: MemoryStore) -> Self {
        Self {
            backend: Backend::Memory(store),
        }
    }

    /// Create a mock store for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── Generic Document Operations ─────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.get(collection, id),
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => store.set(collection, id, doc),
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.delete(collection, id);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn query_eq<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| q.field(field).eq(value.clone()))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => store.query_eq(collection, field, value),
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.list(collection),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Store `doc` under `id` unless a document already exists there.
    ///
    /// Returns `false` when the ID is taken.
    async fn insert_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let inserted: Result<T, FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await;
                match inserted {
                    Ok(_) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => store.insert_new(collection, id, doc),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Read-modify-write of an existing document.
    ///
    /// On Firestore the read and the write run in one transaction, retried on
    /// contention, so a concurrent write or delete is never overwritten. A
    /// missing document yields `None` and is not created.
    async fn edit_doc<T, R, F>(&self, collection: &str, id: &str, edit: F) -> Result<Option<R>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(&mut T) -> Edit<R> + Send + Sync + 'static,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let edit = Arc::new(edit);
                let collection = collection.to_string();
                let id = id.to_string();
                client
                    .run_transaction(move |db, transaction| {
                        edit_in_transaction(
                            db,
                            transaction,
                            collection.clone(),
                            id.clone(),
                            edit.clone(),
                        )
                        .boxed()
                    })
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction failed: {}", e)))
            }
            Backend::Memory(store) => store.edit(collection, id, edit),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Delete documents by ID using transactions of at most `BATCH_SIZE` writes.
    async fn batch_delete(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        let client = match &self.backend {
            Backend::Firestore(client) => client,
            Backend::Memory(store) => {
                for id in ids {
                    store.delete(collection, id);
                }
                return Ok(());
            }
            Backend::Offline => return Err(Self::offline()),
        };

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Flashcard Operations ────────────────────────────────────

    pub async fn get_flashcard(&self, id: &str) -> Result<Option<Flashcard>, AppError> {
        self.get_doc(collections::FLASHCARDS, id).await
    }

    /// Create or replace a flashcard document (keyed by `card.id`).
    pub async fn set_flashcard(&self, card: &Flashcard) -> Result<(), AppError> {
        self.set_doc(collections::FLASHCARDS, &card.id, card).await
    }

    /// Apply `edit` to the stored card `id` atomically. `None` if it does not exist.
    pub async fn edit_flashcard<R, F>(&self, id: &str, edit: F) -> Result<Option<R>, AppError>
    where
        R: Send + 'static,
        F: Fn(&mut Flashcard) -> Edit<R> + Send + Sync + 'static,
    {
        self.edit_doc(collections::FLASHCARDS, id, edit).await
    }

    /// Delete a flashcard. Deleting a missing document succeeds.
    pub async fn delete_flashcard(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::FLASHCARDS, id).await
    }

    /// All flashcards whose `uid` field equals `uid`.
    pub async fn flashcards_for_user(&self, uid: &str) -> Result<Vec<Flashcard>, AppError> {
        self.query_eq(collections::FLASHCARDS, "uid", uid).await
    }

    /// Delete every flashcard owned by `uid`. Returns how many were deleted.
    pub async fn delete_flashcards_for_user(&self, uid: &str) -> Result<usize, AppError> {
        let ids: Vec<String> = self
            .flashcards_for_user(uid)
            .await?
            .into_iter()
            .map(|card| card.id)
            .collect();

        self.batch_delete(collections::FLASHCARDS, &ids).await?;
        tracing::debug!(uid, count = ids.len(), "Deleted flashcards");
        Ok(ids.len())
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    pub async fn set_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &profile.id, profile).await
    }

    pub async fn delete_profile(&self, uid: &str) -> Result<(), AppError> {
        self.delete_doc(collections::USERS, uid).await
    }

    // ─── Account Operations ──────────────────────────────────────

    pub async fn get_account(&self, uid: &str) -> Result<Option<Account>, AppError> {
        self.get_doc(collections::ACCOUNTS, uid).await
    }

    /// Look up an account by its normalized email.
    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let Some(claim) = self.get_email_claim(email).await? else {
            return Ok(None);
        };
        // A claim can outlive its account if sign-up failed halfway.
        Ok(self
            .get_account(&claim.uid)
            .await?
            .filter(|account| account.email == email))
    }

    pub async fn set_account(&self, account: &Account) -> Result<(), AppError> {
        self.set_doc(collections::ACCOUNTS, &account.uid, account).await
    }

    pub async fn delete_account(&self, uid: &str) -> Result<(), AppError> {
        self.delete_doc(collections::ACCOUNTS, uid).await
    }

    // ─── Email Claims ────────────────────────────────────────────

    /// Reserve `claim.email` for `claim.uid`. Returns `false` if the email is
    /// already claimed; of two concurrent claims exactly one succeeds.
    pub async fn claim_email(&self, claim: &EmailClaim) -> Result<bool, AppError> {
        self.insert_doc(collections::ACCOUNT_EMAILS, &email_key(&claim.email), claim)
            .await
    }

    pub async fn get_email_claim(&self, email: &str) -> Result<Option<EmailClaim>, AppError> {
        self.get_doc(collections::ACCOUNT_EMAILS, &email_key(email))
            .await
    }

    pub async fn release_email(&self, email: &str) -> Result<(), AppError> {
        self.delete_doc(collections::ACCOUNT_EMAILS, &email_key(email))
            .await
    }

    // ─── Account Deletion Markers ────────────────────────────────

    pub async fn get_deletion(&self, uid: &str) -> Result<Option<AccountDeletion>, AppError> {
        self.get_doc(collections::ACCOUNT_DELETIONS, uid).await
    }

    pub async fn set_deletion(&self, marker: &AccountDeletion) -> Result<(), AppError> {
        self.set_doc(collections::ACCOUNT_DELETIONS, &marker.uid, marker)
            .await
    }

    pub async fn delete_deletion(&self, uid: &str) -> Result<(), AppError> {
        self.delete_doc(collections::ACCOUNT_DELETIONS, uid).await
    }

    /// Every unfinished deletion.
    pub async fn pending_deletions(&self) -> Result<Vec<AccountDeletion>, AppError> {
        self.list_docs(collections::ACCOUNT_DELETIONS).await
    }
}

/// Document ID for an email claim. Emails may contain `/`, which Firestore
/// does not allow in IDs.
fn email_key(email: &str) -> String {
    URL_SAFE_NO_PAD.encode(email.as_bytes())
}

async fn edit_in_transaction<T, R, F>(
    db: FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    collection: String,
    id: String,
    edit: Arc<F>,
) -> Result<Option<R>, BackoffError<AppError>>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: Fn(&mut T) -> Edit<R>,
{
    // `db` reads through the transaction, so this document is guarded
    // against concurrent writes until commit.
    let current: Option<T> = db
        .fluent()
        .select()
        .by_id_in(&collection)
        .obj()
        .one(&id)
        .await
        .map_err(|e| BackoffError::permanent(AppError::Database(e.to_string())))?;

    let Some(mut doc) = current else {
        return Ok(None);
    };

    match edit(&mut doc) {
        Edit::Write(out) => {
            db.fluent()
                .update()
                .in_col(&collection)
                .document_id(&id)
                .object(&doc)
                .add_to_transaction(transaction)
                .map_err(|e| BackoffError::permanent(AppError::Database(e.to_string())))?;
            Ok(Some(out))
        }
        Edit::Keep(out) => Ok(Some(out)),
    }
}
