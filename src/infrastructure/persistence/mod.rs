//! Document store adapters and the generic document repository
//!
//! Two store adapters implement `DocumentStorePort` (in-memory and SQLite).
//! Repositories are generic over the entity type and share one store handle.

mod document_repository;
mod memory_store;
mod sqlite_store;
mod world_repository;


pub use document_repository::DocumentRepository;
pub use memory_store::InMemoryDocumentStore;
pub use sqlite_store::SqliteDocumentStore;
pub use world_repository::WorldRepository;

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::outbound::{ClockPort, DocumentStorePort, StoreError};
use crate::domain::entities::DocumentEntity;
use crate::domain::value_objects::{DocumentKey, PathError};

/// Translate a failed path mutation into the store's error vocabulary
pub(crate) fn path_error(key: &DocumentKey, error: PathError) -> StoreError {
    match error {
        PathError::Exists(path) => StoreError::PathExists {
            key: key.to_string(),
            path,
        },
        other => StoreError::PathMismatch {
            key: key.to_string(),
            path: other.path().to_string(),
            reason: other.to_string(),
        },
    }
}

/// Combined repository providing access to every document repository
#[derive(Clone)]
pub struct DocumentRepositories {
    store: Arc<dyn DocumentStorePort>,
    clock: Arc<dyn ClockPort>,
    default_timeout: Option<Duration>,
}

impl DocumentRepositories {
    pub fn new(store: Arc<dyn DocumentStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            store,
            clock,
            default_timeout: None,
        }
    }

    /// Timeout applied to calls whose context carries no deadline
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> Arc<dyn DocumentStorePort> {
        Arc::clone(&self.store)
    }

    pub fn repository<E: DocumentEntity>(&self) -> DocumentRepository<E> {
        DocumentRepository::new(Arc::clone(&self.store), Arc::clone(&self.clock))
            .with_default_timeout(self.default_timeout)
    }

    pub fn worlds(&self) -> WorldRepository {
        self.repository()
    }
}
