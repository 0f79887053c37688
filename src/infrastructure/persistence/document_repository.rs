//! Generic document repository
//!
//! One implementation serves every `DocumentEntity`. Documents live at
//! `"{ENTITY_TAG}-{id}"`, carry their tag in the `entity` field, and listing
//! queries select on that field.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::context::{CallContext, Interrupted};
use crate::application::ports::outbound::{
    ClockPort, DocumentQuery, DocumentRepositoryPort, DocumentStorePort, Page, RepositoryError,
    StoreError,
};
use crate::domain::entities::DocumentEntity;
use crate::domain::value_objects::{
    next_update_timestamp, DocumentKey, DocumentMeta, DocumentPath, MutationMode,
    SubDocumentValue,
};

const ENTITY_FIELD: &str = "entity";
const UPDATED_AT_FIELD: &str = "updatedAt";

/// Repository for documents of entity type `E`
pub struct DocumentRepository<E> {
    store: Arc<dyn DocumentStorePort>,
    clock: Arc<dyn ClockPort>,
    default_timeout: Option<Duration>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DocumentRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            default_timeout: self.default_timeout,
            _entity: PhantomData,
        }
    }
}

impl<E: DocumentEntity> DocumentRepository<E> {
    pub fn new(store: Arc<dyn DocumentStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            store,
            clock,
            default_timeout: None,
            _entity: PhantomData,
        }
    }

    /// Timeout for calls whose context has no deadline; `None` waits indefinitely
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn key(id: &str) -> Result<DocumentKey, RepositoryError> {
        Ok(DocumentKey::new(E::ENTITY_TAG, id)?)
    }

    fn store_error(error: StoreError, operation: &'static str, id: &str) -> RepositoryError {
        RepositoryError::from_store(error, operation, E::ENTITY_TAG, id)
    }

    fn decode(document: Value) -> Result<E, RepositoryError> {
        Ok(serde_json::from_value(document)?)
    }

    /// Run one repository operation under the caller's deadline and cancellation
    async fn guarded<T, F>(
        &self,
        operation: &'static str,
        ctx: &CallContext,
        future: F,
    ) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        let started = Instant::now();
        let result = match ctx.run(self.default_timeout, future).await {
            Ok(result) => result,
            Err(Interrupted::DeadlineExceeded) => Err(RepositoryError::Timeout { operation }),
            Err(Interrupted::Cancelled) => Err(RepositoryError::Cancelled { operation }),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(
                entity_tag = E::ENTITY_TAG,
                operation,
                elapsed_ms,
                "Document operation completed"
            ),
            Err(e) if e.is_not_found() => debug!(
                entity_tag = E::ENTITY_TAG,
                operation,
                elapsed_ms,
                "Document not found"
            ),
            Err(e) => warn!(
                entity_tag = E::ENTITY_TAG,
                operation,
                elapsed_ms,
                error = %e,
                "Document operation failed"
            ),
        }

        result
    }

    async fn read(
        &self,
        key: &DocumentKey,
        operation: &'static str,
    ) -> Result<E, RepositoryError> {
        let document = self
            .store
            .get(key)
            .await
            .map_err(|e| Self::store_error(e, operation, key.id()))?;
        Self::decode(document)
    }

    async fn rows(
        &self,
        query: DocumentQuery,
        operation: &'static str,
    ) -> Result<Vec<Value>, RepositoryError> {
        self.store
            .query(&query)
            .await
            .map_err(|e| Self::store_error(e, operation, ""))
    }

    /// Apply a path mutation, then re-tag and touch the whole document.
    ///
    /// The refresh is a separate read and write, so a concurrent writer can
    /// land between the mutation and the refresh.
    async fn write_sub_document(
        &self,
        document_id: &str,
        path: &str,
        value: SubDocumentValue,
        mode: MutationMode,
        operation: &'static str,
    ) -> Result<E, RepositoryError> {
        let key = Self::key(document_id)?;
        let path = DocumentPath::parse(path)?;
        path.ensure_not_reserved(&DocumentMeta::FIELDS)?;
        let value = Value::from(value);

        self.store
            .mutate_in(&key, &path, &value, mode)
            .await
            .map_err(|e| Self::store_error(e, operation, document_id))?;

        let mut document = self
            .store
            .get(&key)
            .await
            .map_err(|e| Self::store_error(e, operation, document_id))?;
        self.refresh_fields(&mut document, document_id)?;

        self.store
            .upsert(&key, &document)
            .await
            .map_err(|e| Self::store_error(e, operation, document_id))?;

        debug!(key = %key, path = %path, "Refreshed document after sub-document write");
        self.read(&key, operation).await
    }

    /// Stamp the entity tag and a fresh `updatedAt` onto a raw stored document.
    ///
    /// Works on the JSON directly so fields the entity type does not model are
    /// written back unchanged.
    fn refresh_fields(&self, document: &mut Value, document_id: &str) -> Result<(), RepositoryError> {
        let now = self.clock.now();
        let object = document.as_object_mut().ok_or_else(|| {
            RepositoryError::Serialization(format!(
                "{} {} is not stored as a JSON object",
                E::ENTITY_TAG,
                document_id
            ))
        })?;

        let previous = object
            .get(UPDATED_AT_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let updated_at = match previous {
            Some(previous) => next_update_timestamp(previous, now),
            None => now,
        };

        object.insert(
            ENTITY_FIELD.to_string(),
            Value::String(E::ENTITY_TAG.to_string()),
        );
        object.insert(UPDATED_AT_FIELD.to_string(), serde_json::to_value(updated_at)?);
        Ok(())
    }
}

#[async_trait]
impl<E: DocumentEntity> DocumentRepositoryPort<E> for DocumentRepository<E> {
    #[instrument(skip(self, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn find_one(&self, id: &str, ctx: &CallContext) -> Result<E, RepositoryError> {
        self.guarded("find_one", ctx, async {
            let key = Self::key(id)?;
            self.read(&key, "find_one").await
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn find_all(&self, page: Page, ctx: &CallContext) -> Result<Vec<E>, RepositoryError> {
        self.guarded("find_all", ctx, async {
            let rows = self
                .rows(
                    DocumentQuery::SelectByEntity {
                        entity: E::ENTITY_TAG.to_string(),
                        limit: page.limit,
                        offset: page.offset,
                    },
                    "find_all",
                )
                .await?;
            rows.into_iter().map(Self::decode).collect()
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn count(&self, ctx: &CallContext) -> Result<u64, RepositoryError> {
        self.guarded("count", ctx, async {
            let rows = self
                .rows(
                    DocumentQuery::CountByEntity {
                        entity: E::ENTITY_TAG.to_string(),
                    },
                    "count",
                )
                .await?;
            rows.first()
                .and_then(Value::as_u64)
                .ok_or_else(|| RepositoryError::Query {
                    operation: "count",
                    message: "count query returned no numeric row".to_string(),
                })
        })
        .await
    }

    #[instrument(skip(self, entity, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn insert(&self, entity: E, ctx: &CallContext) -> Result<E, RepositoryError> {
        self.guarded("insert", ctx, async move {
            let mut entity = entity;
            let now = self.clock.now();

            let meta = entity.meta_mut();
            if meta.has_blank_id() {
                meta.id = Uuid::new_v4().to_string();
            }
            meta.entity = E::ENTITY_TAG.to_string();
            meta.created_at = Some(now);
            meta.updated_at = now;

            let key = Self::key(entity.id())?;
            let document = serde_json::to_value(&entity)?;
            self.store
                .insert(&key, &document)
                .await
                .map_err(|e| Self::store_error(e, "insert", key.id()))?;

            debug!(key = %key, "Inserted document");
            self.read(&key, "insert").await
        })
        .await
    }

    #[instrument(skip(self, entity, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn upsert(&self, id: &str, entity: E, ctx: &CallContext) -> Result<E, RepositoryError> {
        self.guarded("upsert", ctx, async move {
            let key = Self::key(id)?;
            let mut entity = entity;
            let now = self.clock.now();

            let meta = entity.meta_mut();
            meta.id = id.to_string();
            meta.entity = E::ENTITY_TAG.to_string();
            meta.touch(now);

            let document = serde_json::to_value(&entity)?;
            self.store
                .upsert(&key, &document)
                .await
                .map_err(|e| Self::store_error(e, "upsert", id))?;

            debug!(key = %key, "Upserted document");
            self.read(&key, "upsert").await
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn remove(&self, id: &str, ctx: &CallContext) -> Result<String, RepositoryError> {
        self.guarded("remove", ctx, async {
            let key = Self::key(id)?;
            self.store
                .remove(&key)
                .await
                .map_err(|e| Self::store_error(e, "remove", id))?;
            Ok(id.to_string())
        })
        .await
    }

    #[instrument(skip(self, value, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn insert_sub_document(
        &self,
        document_id: &str,
        path: &str,
        value: SubDocumentValue,
        ctx: &CallContext,
    ) -> Result<E, RepositoryError> {
        self.guarded(
            "insert_sub_document",
            ctx,
            self.write_sub_document(
                document_id,
                path,
                value,
                MutationMode::Insert,
                "insert_sub_document",
            ),
        )
        .await
    }

    #[instrument(skip(self, value, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn upsert_sub_document(
        &self,
        document_id: &str,
        path: &str,
        value: SubDocumentValue,
        ctx: &CallContext,
    ) -> Result<E, RepositoryError> {
        self.guarded(
            "upsert_sub_document",
            ctx,
            self.write_sub_document(
                document_id,
                path,
                value,
                MutationMode::Upsert,
                "upsert_sub_document",
            ),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(entity_tag = E::ENTITY_TAG))]
    async fn remove_all(&self, ctx: &CallContext) -> Result<u64, RepositoryError> {
        self.guarded("remove_all", ctx, async {
            let removed = self
                .rows(
                    DocumentQuery::DeleteByEntity {
                        entity: E::ENTITY_TAG.to_string(),
                    },
                    "remove_all",
                )
                .await?;
            Ok(removed.len() as u64)
        })
        .await
    }
}
