//! Repository ports - Interfaces for entity persistence
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.

use async_trait::async_trait;
use thiserror::Error;

use super::document_store_port::StoreError;
use crate::application::context::CallContext;
use crate::domain::entities::{DocumentEntity, World};
use crate::domain::value_objects::{KeyError, PathError, SubDocumentValue};

/// Repository operation errors with context for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Document absent - includes entity type and ID for actionable error messages.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Key already taken on insert, or sub-document path already present.
    #[error("{entity} {id} conflicts with existing data{}", at_path(.path))]
    Conflict {
        entity: &'static str,
        id: String,
        path: Option<String>,
    },

    /// Query rejected or failed inside the store.
    #[error("Query error in {operation}: {message}")]
    Query {
        operation: &'static str,
        message: String,
    },

    /// Deadline passed before the operation completed.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Caller cancelled the operation.
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    /// Connectivity failure to the document store.
    #[error("Store unavailable during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },

    /// Stored document could not be converted to or from the entity type.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Blank id or unusable entity tag.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sub-document path is malformed or crosses a non-object value.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

fn at_path(path: &Option<String>) -> String {
    path.as_deref()
        .map(|p| format!(" at '{p}'"))
        .unwrap_or_default()
}

impl RepositoryError {
    /// Wrap a store failure with the entity and id it concerned
    pub fn from_store(
        error: StoreError,
        operation: &'static str,
        entity: &'static str,
        id: &str,
    ) -> Self {
        match error {
            StoreError::NotFound(_) => Self::NotFound {
                entity,
                id: id.to_string(),
            },
            StoreError::AlreadyExists(_) => Self::Conflict {
                entity,
                id: id.to_string(),
                path: None,
            },
            StoreError::PathExists { path, .. } => Self::Conflict {
                entity,
                id: id.to_string(),
                path: Some(path),
            },
            e @ StoreError::PathMismatch { .. } => Self::InvalidPath(e.to_string()),
            StoreError::Query(message) => Self::Query { operation, message },
            StoreError::Unavailable(message) => Self::StoreUnavailable { operation, message },
            StoreError::Serialization(message) => Self::Serialization(message),
        }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<KeyError> for RepositoryError {
    fn from(error: KeyError) -> Self {
        Self::InvalidArgument(error.to_string())
    }
}

impl From<PathError> for RepositoryError {
    fn from(error: PathError) -> Self {
        Self::InvalidPath(error.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Pagination window for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

// =============================================================================
// Document Repository Port
// =============================================================================

/// Repository port for any tagged document entity
///
/// Every write re-tags the entity with `E::ENTITY_TAG`, and every write returns
/// the document as re-read from the store.
#[async_trait]
pub trait DocumentRepositoryPort<E: DocumentEntity>: Send + Sync {
    /// Get a document by ID
    async fn find_one(&self, id: &str, ctx: &CallContext) -> Result<E, RepositoryError>;

    /// List documents of this entity type, ordered by key
    async fn find_all(&self, page: Page, ctx: &CallContext) -> Result<Vec<E>, RepositoryError>;

    /// Count documents of this entity type
    async fn count(&self, ctx: &CallContext) -> Result<u64, RepositoryError>;

    /// Create a document, assigning an ID when the entity has none
    async fn insert(&self, entity: E, ctx: &CallContext) -> Result<E, RepositoryError>;

    /// Create or replace the document at `id`
    async fn upsert(&self, id: &str, entity: E, ctx: &CallContext) -> Result<E, RepositoryError>;

    /// Delete the document at `id`, returning the id
    async fn remove(&self, id: &str, ctx: &CallContext) -> Result<String, RepositoryError>;

    /// Add a value at `path` in the document; fails if the path exists
    async fn insert_sub_document(
        &self,
        document_id: &str,
        path: &str,
        value: SubDocumentValue,
        ctx: &CallContext,
    ) -> Result<E, RepositoryError>;

    /// Write a value at `path` in the document unconditionally
    async fn upsert_sub_document(
        &self,
        document_id: &str,
        path: &str,
        value: SubDocumentValue,
        ctx: &CallContext,
    ) -> Result<E, RepositoryError>;

    /// Delete every document of this entity type, returning how many were removed
    async fn remove_all(&self, ctx: &CallContext) -> Result<u64, RepositoryError>;
}

// =============================================================================
// World Repository Port
// =============================================================================

/// Repository port for World records
pub trait WorldRepositoryPort: DocumentRepositoryPort<World> {}

impl<T: DocumentRepositoryPort<World> + ?Sized> WorldRepositoryPort for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let not_found =
            RepositoryError::from_store(StoreError::NotFound("World-1".into()), "find_one", "World", "1");
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "World not found: 1");

        let conflict = RepositoryError::from_store(
            StoreError::PathExists {
                key: "World-1".into(),
                path: "moons".into(),
            },
            "insert_sub_document",
            "World",
            "1",
        );
        assert!(conflict.is_conflict());
        assert_eq!(conflict.to_string(), "World 1 conflicts with existing data at 'moons'");

        let unavailable = RepositoryError::from_store(
            StoreError::Unavailable("pool closed".into()),
            "count",
            "World",
            "",
        );
        assert_eq!(
            unavailable,
            RepositoryError::StoreUnavailable {
                operation: "count",
                message: "pool closed".into()
            }
        );
    }

    #[test]
    fn test_default_page() {
        assert_eq!(Page::default(), Page::new(20, 0));
    }
}
