//! SQLite-backed document store.
//!
//! All buckets share one `documents` table; the bucket name is a column and,
//! like every other value, is passed as a bound parameter. Entity filtering
//! reads the stored `entity` field with `json_extract`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::path_error;
use crate::application::ports::outbound::{DocumentQuery, DocumentStorePort, StoreError};
use crate::domain::value_objects::{DocumentKey, DocumentPath, MutationMode};

const CREATE_DOCUMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        bucket TEXT NOT NULL,
        doc_key TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (bucket, doc_key)
    )
"#;

const CREATE_ENTITY_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_documents_entity
    ON documents (bucket, json_extract(body, '$.entity'))
"#;

const SELECT_BODY: &str = "SELECT body FROM documents WHERE bucket = ? AND doc_key = ?";

const INSERT_DOCUMENT: &str = "INSERT INTO documents (bucket, doc_key, body) VALUES (?, ?, ?)";

const UPSERT_DOCUMENT: &str = r#"
    INSERT INTO documents (bucket, doc_key, body)
    VALUES (?, ?, ?)
    ON CONFLICT(bucket, doc_key) DO UPDATE SET body = excluded.body
"#;

const UPDATE_BODY: &str = "UPDATE documents SET body = ? WHERE bucket = ? AND doc_key = ?";

const DELETE_DOCUMENT: &str = "DELETE FROM documents WHERE bucket = ? AND doc_key = ?";

const SELECT_BY_ENTITY: &str = r#"
    SELECT body FROM documents
    WHERE bucket = ? AND json_extract(body, '$.entity') = ?
    ORDER BY doc_key
    LIMIT ? OFFSET ?
"#;

const COUNT_BY_ENTITY: &str = r#"
    SELECT COUNT(*) AS count FROM documents
    WHERE bucket = ? AND json_extract(body, '$.entity') = ?
"#;

const DELETE_BY_ENTITY: &str = r#"
    DELETE FROM documents
    WHERE bucket = ? AND json_extract(body, '$.entity') = ?
    RETURNING doc_key
"#;

/// SQLite implementation of the document store
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    bucket: String,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database file at `db_path`
    pub async fn connect(db_path: &str, bucket: impl Into<String>) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(store_error)?;
        Self::from_pool(pool, bucket).await
    }

    /// Private in-memory database; a single connection keeps every query on it
    pub async fn in_memory(bucket: impl Into<String>) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(store_error)?;
        Self::from_pool(pool, bucket).await
    }

    pub async fn from_pool(pool: SqlitePool, bucket: impl Into<String>) -> Result<Self, StoreError> {
        sqlx::query(CREATE_DOCUMENTS)
            .execute(&pool)
            .await
            .map_err(store_error)?;
        sqlx::query(CREATE_ENTITY_INDEX)
            .execute(&pool)
            .await
            .map_err(store_error)?;

        Ok(Self {
            pool,
            bucket: bucket.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Primary result codes for a database held by another writer
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Takes the write lock up front so concurrent read-modify-writes queue on the
/// busy timeout instead of failing on a lock upgrade
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

fn is_lock_contention(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

fn store_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(error.to_string()),
        sqlx::Error::Database(db) if is_lock_contention(db.as_ref()) => {
            StoreError::Unavailable(error.to_string())
        }
        _ => StoreError::Query(error.to_string()),
    }
}

fn parse_body(body: &str) -> Result<Value, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode_body(document: &Value) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl DocumentStorePort for SqliteDocumentStore {
    async fn get(&self, key: &DocumentKey) -> Result<Value, StoreError> {
        let body: Option<String> = sqlx::query_scalar(SELECT_BODY)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match body {
            Some(body) => parse_body(&body),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn insert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError> {
        let body = encode_body(document)?;
        let result = sqlx::query(INSERT_DOCUMENT)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .bind(body)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn upsert(&self, key: &DocumentKey, document: &Value) -> Result<(), StoreError> {
        let body = encode_body(document)?;
        sqlx::query(UPSERT_DOCUMENT)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn remove(&self, key: &DocumentKey) -> Result<(), StoreError> {
        let result = sqlx::query(DELETE_DOCUMENT)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn mutate_in(
        &self,
        key: &DocumentKey,
        path: &DocumentPath,
        value: &Value,
        mode: MutationMode,
    ) -> Result<(), StoreError> {
        // Read-modify-write in one transaction; dropping `tx` on error rolls back
        let mut tx = self
            .pool
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(store_error)?;

        let body: Option<String> = sqlx::query_scalar(SELECT_BODY)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;
        let body = body.ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let mut document = parse_body(&body)?;
        path.apply(&mut document, value.clone(), mode)
            .map_err(|e| path_error(key, e))?;

        sqlx::query(UPDATE_BODY)
            .bind(encode_body(&document)?)
            .bind(self.bucket.as_str())
            .bind(key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError> {
        match query {
            DocumentQuery::SelectByEntity {
                entity,
                limit,
                offset,
            } => {
                let bodies: Vec<String> = sqlx::query_scalar(SELECT_BY_ENTITY)
                    .bind(self.bucket.as_str())
                    .bind(entity.as_str())
                    .bind(i64::from(*limit))
                    .bind(i64::from(*offset))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(store_error)?;

                bodies.iter().map(|body| parse_body(body)).collect()
            }
            DocumentQuery::CountByEntity { entity } => {
                let row = sqlx::query(COUNT_BY_ENTITY)
                    .bind(self.bucket.as_str())
                    .bind(entity.as_str())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(store_error)?;
                let count: i64 = row.try_get("count").map_err(store_error)?;
                Ok(vec![Value::from(count)])
            }
            DocumentQuery::DeleteByEntity { entity } => {
                let keys: Vec<String> = sqlx::query_scalar(DELETE_BY_ENTITY)
                    .bind(self.bucket.as_str())
                    .bind(entity.as_str())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(store_error)?;
                Ok(keys.into_iter().map(Value::String).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(id: &str) -> DocumentKey {
        DocumentKey::new("World", id).unwrap()
    }

    async fn file_store(dir: &tempfile::TempDir, bucket: &str) -> SqliteDocumentStore {
        let db_path = dir.path().join("documents.db");
        SqliteDocumentStore::connect(&db_path.to_string_lossy(), bucket)
            .await
            .expect("open store")
    }

    #[tokio::test]
    async fn test_key_value_operations() {
        let store = SqliteDocumentStore::in_memory("worlds").await.unwrap();
        let doc = json!({"id": "a", "entity": "World", "name": "Mars"});

        store.insert(&key("a"), &doc).await.unwrap();
        assert_eq!(store.get(&key("a")).await.unwrap(), doc);
        assert_eq!(
            store.insert(&key("a"), &doc).await,
            Err(StoreError::AlreadyExists("World-a".to_string()))
        );

        let replaced = json!({"id": "a", "entity": "World", "name": "Jupiter"});
        store.upsert(&key("a"), &replaced).await.unwrap();
        assert_eq!(store.get(&key("a")).await.unwrap(), replaced);

        store.remove(&key("a")).await.unwrap();
        assert_eq!(
            store.remove(&key("a")).await,
            Err(StoreError::NotFound("World-a".to_string()))
        );
    }

    #[tokio::test]
    async fn test_mutate_in() {
        let store = SqliteDocumentStore::in_memory("worlds").await.unwrap();
        store
            .insert(&key("a"), &json!({"id": "a", "entity": "World"}))
            .await
            .unwrap();

        let path = DocumentPath::parse("moons").unwrap();
        store
            .mutate_in(&key("a"), &path, &json!(["Phobos"]), MutationMode::Insert)
            .await
            .unwrap();
        assert_eq!(
            store
                .mutate_in(&key("a"), &path, &json!([]), MutationMode::Insert)
                .await,
            Err(StoreError::PathExists {
                key: "World-a".to_string(),
                path: "moons".to_string()
            })
        );
        store
            .mutate_in(&key("a"), &path, &json!(["Phobos", "Deimos"]), MutationMode::Upsert)
            .await
            .unwrap();

        let doc = store.get(&key("a")).await.unwrap();
        assert_eq!(doc["moons"], json!(["Phobos", "Deimos"]));

        assert_eq!(
            store
                .mutate_in(&key("missing"), &path, &json!(1), MutationMode::Upsert)
                .await,
            Err(StoreError::NotFound("World-missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_entity_queries() {
        let store = SqliteDocumentStore::in_memory("worlds").await.unwrap();
        for id in ["c", "a", "b"] {
            store
                .insert(&key(id), &json!({"id": id, "entity": "World"}))
                .await
                .unwrap();
        }
        store
            .insert(
                &DocumentKey::new("Moon", "x").unwrap(),
                &json!({"id": "x", "entity": "Moon"}),
            )
            .await
            .unwrap();

        let rows = store
            .query(&DocumentQuery::SelectByEntity {
                entity: "World".into(),
                limit: 2,
                offset: 0,
            })
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let count = store
            .query(&DocumentQuery::CountByEntity {
                entity: "World".into(),
            })
            .await
            .unwrap();
        assert_eq!(count, vec![json!(3)]);

        let removed = store
            .query(&DocumentQuery::DeleteByEntity {
                entity: "World".into(),
            })
            .await
            .unwrap();
        let mut removed: Vec<&str> = removed.iter().filter_map(Value::as_str).collect();
        removed.sort_unstable();
        assert_eq!(removed, vec!["World-a", "World-b", "World-c"]);

        let moons = store
            .query(&DocumentQuery::CountByEntity {
                entity: "Moon".into(),
            })
            .await
            .unwrap();
        assert_eq!(moons, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_all_land() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir, "worlds").await;
        store
            .insert(&key("a"), &json!({"id": "a", "entity": "World"}))
            .await
            .unwrap();

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let path = DocumentPath::parse(&format!("f{i}")).unwrap();
                    store
                        .mutate_in(&key("a"), &path, &json!(i), MutationMode::Upsert)
                        .await
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let doc = store.get(&key("a")).await.unwrap();
        for i in 0..16 {
            assert_eq!(doc[format!("f{i}")], json!(i));
        }
    }

    #[tokio::test]
    async fn test_held_write_lock_is_unavailable() {
        use std::time::Duration;

        use sqlx::sqlite::SqliteConnectOptions;

        let dir = tempfile::tempdir().expect("tempdir");
        let holder = file_store(&dir, "worlds").await;
        let doc = json!({"id": "a", "entity": "World"});
        holder.insert(&key("a"), &doc).await.unwrap();

        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("documents.db"))
            .busy_timeout(Duration::ZERO);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .expect("open second pool");
        let contender = SqliteDocumentStore::from_pool(pool, "worlds")
            .await
            .unwrap();

        let held = holder.pool().begin_with(BEGIN_IMMEDIATE).await.unwrap();

        let path = DocumentPath::parse("moons").unwrap();
        assert!(matches!(
            contender
                .mutate_in(&key("a"), &path, &json!(1), MutationMode::Upsert)
                .await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            contender.upsert(&key("a"), &doc).await,
            Err(StoreError::Unavailable(_))
        ));

        held.rollback().await.unwrap();
        contender
            .mutate_in(&key("a"), &path, &json!(1), MutationMode::Upsert)
            .await
            .unwrap();
        assert_eq!(contender.get(&key("a")).await.unwrap()["moons"], json!(1));
    }

    #[tokio::test]
    async fn test_buckets_are_isolated_and_persist_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = json!({"id": "a", "entity": "World"});

        {
            let worlds = file_store(&dir, "worlds").await;
            worlds.insert(&key("a"), &doc).await.unwrap();
        }

        let test_bucket = file_store(&dir, "worlds_test").await;
        assert_eq!(
            test_bucket.get(&key("a")).await,
            Err(StoreError::NotFound("World-a".to_string()))
        );
        let removed = test_bucket
            .query(&DocumentQuery::DeleteByEntity {
                entity: "World".into(),
            })
            .await
            .unwrap();
        assert!(removed.is_empty());

        let reopened = file_store(&dir, "worlds").await;
        assert_eq!(reopened.get(&key("a")).await.unwrap(), doc);
    }
}
