//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::dispatch::Dispatcher;
use crate::application::ports::outbound::DocumentStorePort;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::{AppConfig, StoreBackend};
use crate::infrastructure::persistence::{
    DocumentRepositories, InMemoryDocumentStore, SqliteDocumentStore,
};

/// Shared application state
///
/// Owns the single store handle; every repository handed out shares it.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repositories: DocumentRepositories,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStorePort> = match config.store_backend {
            StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
            StoreBackend::Sqlite => {
                let store =
                    SqliteDocumentStore::connect(&config.store_path, config.bucket_name.clone())
                        .await
                        .with_context(|| {
                            format!("Failed to open SQLite store at {}", config.store_path)
                        })?;
                Arc::new(store)
            }
        };
        tracing::info!(
            backend = ?config.store_backend,
            bucket = %config.bucket_name,
            "Document store ready"
        );

        let mut repositories = DocumentRepositories::new(store, Arc::new(SystemClock::new()));
        if let Some(timeout) = config.operation_timeout() {
            repositories = repositories.with_default_timeout(timeout);
        }

        let dispatcher = Dispatcher::new(Arc::new(repositories.worlds()));

        Ok(Self {
            config,
            repositories,
            dispatcher,
        })
    }
}
