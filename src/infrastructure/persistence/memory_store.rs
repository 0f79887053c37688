//! In-memory document store for development and testing
//!
//! Documents live in a `BTreeMap` keyed by document key, so listing queries
//! come back in key order exactly like the SQLite adapter. Nothing is persisted.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::path_error;
use crate::application::ports::outbound::{DocumentQuery, DocumentStorePort, StoreError};
use crate::domain::value_objects::{DocumentKey, DocumentPath, MutationMode};

/// In-memory document store
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all entity types
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn entity_of(document: &Value) -> Option<&str> {
    document.get("entity").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStorePort for InMemoryDocumentStore {
    async fn get(&self, key: &DocumentKey) -> Result<Value, StoreError> {
        self.documents
            .read()
            .await
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn insert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(key.as_str()) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        documents.insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn upsert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn remove(&self, key: &DocumentKey) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .remove(key.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn mutate_in(
        &self,
        key: &DocumentKey,
        path: &DocumentPath,
        value: &Value,
        mode: MutationMode,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(key.as_str())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        // Mutate a copy so a failed write leaves the stored document untouched
        let mut updated = document.clone();
        path.apply(&mut updated, value.clone(), mode)
            .map_err(|e| path_error(key, e))?;
        *document = updated;
        Ok(())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError> {
        match query {
            DocumentQuery::SelectByEntity {
                entity,
                limit,
                offset,
            } => {
                let documents = self.documents.read().await;
                Ok(documents
                    .values()
                    .filter(|doc| entity_of(doc) == Some(entity.as_str()))
                    .skip(*offset as usize)
                    .take(*limit as usize)
                    .cloned()
                    .collect())
            }
            DocumentQuery::CountByEntity { entity } => {
                let documents = self.documents.read().await;
                let count = documents
                    .values()
                    .filter(|doc| entity_of(doc) == Some(entity.as_str()))
                    .count();
                Ok(vec![Value::from(count as u64)])
            }
            DocumentQuery::DeleteByEntity { entity } => {
                let mut documents = self.documents.write().await;
                let keys: Vec<String> = documents
                    .iter()
                    .filter(|(_, doc)| entity_of(doc) == Some(entity.as_str()))
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in &keys {
                    documents.remove(key);
                }
                Ok(keys.into_iter().map(Value::String).collect())
            }
        }
    }
}
