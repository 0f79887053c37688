//! Document store port - The key-value and query primitives of the backing database
//!
//! Repositories depend on this trait only. Adapters live in
//! `infrastructure::persistence` and own connection details; a single store
//! handle is shared by every repository.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::value_objects::{DocumentKey, DocumentPath, MutationMode};

/// Failures reported by a document store adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Path '{path}' already exists in document {key}")]
    PathExists { key: String, path: String },

    #[error("Path '{path}' cannot be written in document {key}: {reason}")]
    PathMismatch {
        key: String,
        path: String,
        reason: String,
    },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Query templates understood by every store adapter
///
/// Values are always passed to the store as bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentQuery {
    /// Documents whose `entity` field matches, ordered by key.
    /// Rows are the stored documents.
    SelectByEntity {
        entity: String,
        limit: u32,
        offset: u32,
    },
    /// A single row holding the number of documents whose `entity` matches
    CountByEntity { entity: String },
    /// Deletes documents whose `entity` matches; one row per removed key
    DeleteByEntity { entity: String },
}

impl DocumentQuery {
    pub fn entity(&self) -> &str {
        match self {
            Self::SelectByEntity { entity, .. }
            | Self::CountByEntity { entity }
            | Self::DeleteByEntity { entity } => entity,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    /// Read the document at `key`
    async fn get(&self, key: &DocumentKey) -> Result<Value, StoreError>;

    /// Create a document; fails with `AlreadyExists` if the key is taken
    async fn insert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError>;

    /// Create or replace a document
    async fn upsert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError>;

    /// Delete a document; fails with `NotFound` if the key is absent
    async fn remove(&self, key: &DocumentKey) -> Result<(), StoreError>;

    /// Write `value` at `path` inside the document at `key`, atomically for that document
    async fn mutate_in(
        &self,
        key: &DocumentKey,
        path: &DocumentPath,
        value: &Value,
        mode: MutationMode,
    ) -> Result<(), StoreError>;

    /// Run a query template and return its rows
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError>;
}
