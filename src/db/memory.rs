// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store used for local development and tests.
//!
//! Documents are kept as JSON values so they go through the same serde
//! mapping as Firestore documents. Clones share the same contents.

use crate::db::Edit;
use crate::error::AppError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

type DocKey = (String, String);

#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<DashMap<DocKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> DocKey {
        (collection.to_string(), id.to_string())
    }

    fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, AppError> {
        serde_json::from_value(value.clone()).map_err(|e| AppError::Database(e.to_string()))
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        self.docs
            .get(&Self::key(collection, id))
            .map(|doc| Self::decode(doc.value()))
            .transpose()
    }

    pub fn set<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(doc).map_err(|e| AppError::Database(e.to_string()))?;
        self.docs.insert(Self::key(collection, id), value);
        Ok(())
    }

    /// Store `doc` only if nothing exists under `id`. Returns whether it was stored.
    pub fn insert_new<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError> {
        let value = serde_json::to_value(doc).map_err(|e| AppError::Database(e.to_string()))?;
        match self.docs.entry(Self::key(collection, id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    /// Apply `edit` to an existing document while holding its shard lock.
    ///
    /// Returns `None` without creating anything if the document is missing.
    pub fn edit<T, R, F>(&self, collection: &str, id: &str, edit: F) -> Result<Option<R>, AppError>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut T) -> Edit<R>,
    {
        let Some(mut entry) = self.docs.get_mut(&Self::key(collection, id)) else {
            return Ok(None);
        };

        let mut doc: T = Self::decode(entry.value())?;
        match edit(&mut doc) {
            Edit::Write(out) => {
                *entry.value_mut() =
                    serde_json::to_value(&doc).map_err(|e| AppError::Database(e.to_string()))?;
                Ok(Some(out))
            }
            Edit::Keep(out) => Ok(Some(out)),
        }
    }

    pub fn delete(&self, collection: &str, id: &str) {
        self.docs.remove(&Self::key(collection, id));
    }

    /// All documents in `collection` whose string `field` equals `value`.
    pub fn query_eq<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        self.docs
            .iter()
            .filter(|doc| {
                doc.key().0 == collection
                    && doc.value().get(field).and_then(Value::as_str) == Some(value)
            })
            .map(|doc| Self::decode(doc.value()))
            .collect()
    }

    pub fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        self.docs
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .map(|doc| Self::decode(doc.value()))
            .collect()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.docs.iter().filter(|doc| doc.key().0 == collection).count()
    }
}
