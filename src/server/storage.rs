//! Server-side record storage.
//!
//! Every collection lives in one SQLite table keyed by `(collection, id)`.
//! Bodies are stored as the JSON object the client sent, so owner queries
//! filter with `json_extract` on the requested owner field.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

pub type Record = Map<String, Value>;

/// Field stamped on every upsert that does not already carry it.
pub const SERVER_UPDATED_AT: &str = "server_updated_at";

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// Error from the SQLite database.
    Database(sqlx::Error),
    /// Error applying schema migrations.
    Migrate(sqlx::migrate::MigrateError),
    /// Collection name that is not a plain identifier.
    InvalidCollection(String),
    /// Owner field name that is not a plain identifier.
    InvalidOwnerKey(String),
    /// Empty or oversized record id.
    InvalidId(String),
    /// Stored body that is not a JSON object.
    Corrupt(String, serde_json::Error),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::Database(e) => write!(f, "Database error: {}", e),
            ServerStorageError::Migrate(e) => write!(f, "Migration failed: {}", e),
            ServerStorageError::InvalidCollection(name) => {
                write!(f, "Invalid collection name: {}", name)
            }
            ServerStorageError::InvalidOwnerKey(key) => write!(f, "Invalid owner key: {}", key),
            ServerStorageError::InvalidId(id) => write!(f, "Invalid record id: {:?}", id),
            ServerStorageError::Corrupt(id, e) => write!(f, "Stored record {} is corrupt: {}", id, e),
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::Database(e) => Some(e),
            ServerStorageError::Migrate(e) => Some(e),
            ServerStorageError::Corrupt(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ServerStorageError {
    fn from(e: sqlx::Error) -> Self {
        ServerStorageError::Database(e)
    }
}

impl From<sqlx::migrate::MigrateError> for ServerStorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        ServerStorageError::Migrate(e)
    }
}

impl ServerStorageError {
    /// True when the caller sent something unusable, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerStorageError::InvalidCollection(_)
                | ServerStorageError::InvalidOwnerKey(_)
                | ServerStorageError::InvalidId(_)
        )
    }
}

/// Record store shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ServerStorage {
    pool: SqlitePool,
}

const MAX_ID_LEN: usize = 256;

impl ServerStorage {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: &Path) -> Result<Self, ServerStorageError> {
        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database for tests.
    pub async fn in_memory() -> Result<Self, ServerStorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, ServerStorageError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Collection and owner-field names must be plain identifiers.
    fn validate_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 64
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn validate_collection(collection: &str) -> Result<(), ServerStorageError> {
        if Self::validate_name(collection) {
            Ok(())
        } else {
            Err(ServerStorageError::InvalidCollection(collection.to_string()))
        }
    }

    fn validate_id(id: &str) -> Result<(), ServerStorageError> {
        if id.trim().is_empty() || id.len() > MAX_ID_LEN {
            return Err(ServerStorageError::InvalidId(id.to_string()));
        }
        Ok(())
    }

    /// Inserts or replaces a record and returns the stored copy, stamped with
    /// the write time. A client-sent `server_updated_at` is overwritten.
    pub async fn upsert(
        &self,
        collection: &str,
        id: &str,
        mut record: Record,
    ) -> Result<Record, ServerStorageError> {
        Self::validate_collection(collection)?;
        Self::validate_id(id)?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        record.insert(SERVER_UPDATED_AT.to_string(), Value::String(now.clone()));
        let body = Value::Object(record).to_string();

        sqlx::query(
            r#"
            INSERT INTO records (collection, id, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(collection, id)
            .await?
            .ok_or(ServerStorageError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, ServerStorageError> {
        Self::validate_collection(collection)?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM records WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(body,)| parse_body(id, &body)).transpose()
    }

    /// Deletes a record; returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, ServerStorageError> {
        Self::validate_collection(collection)?;

        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records whose `owner_key` field equals `owner`, ordered by id.
    pub async fn query_by_owner(
        &self,
        collection: &str,
        owner_key: &str,
        owner: &str,
    ) -> Result<Vec<Record>, ServerStorageError> {
        Self::validate_collection(collection)?;
        if !Self::validate_name(owner_key) {
            return Err(ServerStorageError::InvalidOwnerKey(owner_key.to_string()));
        }

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, body FROM records WHERE collection = ? AND json_extract(body, ?) = ? ORDER BY id",
        )
        .bind(collection)
        .bind(format!("$.{}", owner_key))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id, body)| parse_body(id, body)).collect()
    }

    /// Number of records in a collection.
    pub async fn count(&self, collection: &str) -> Result<i64, ServerStorageError> {
        Self::validate_collection(collection)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn parse_body(id: &str, body: &str) -> Result<Record, ServerStorageError> {
    serde_json::from_str(body).map_err(|e| ServerStorageError::Corrupt(id.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_upsert_stamps_server_updated_at() {
        let storage = ServerStorage::in_memory().await.unwrap();
        let stored = storage
            .upsert("pets", "p1", record(json!({"id": "p1", "owner_id": "o"})))
            .await
            .unwrap();

        let stamp = stored[SERVER_UPDATED_AT].as_str().unwrap();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stored["owner_id"], json!("o"));
    }

    #[tokio::test]
    async fn test_upsert_restamps_client_server_updated_at() {
        let storage = ServerStorage::in_memory().await.unwrap();
        let first = storage
            .upsert("pets", "p1", record(json!({"id": "p1", "name": "Rex"})))
            .await
            .unwrap();

        // A client echoing an old stamp back does not freeze it.
        let stored = storage
            .upsert(
                "pets",
                "p1",
                record(json!({"id": "p1", "name": "Max", "server_updated_at": "2020-01-01T00:00:00.000Z"})),
            )
            .await
            .unwrap();
        let stamp = stored[SERVER_UPDATED_AT].as_str().unwrap();
        assert_ne!(stamp, "2020-01-01T00:00:00.000Z");
        assert!(stamp >= first[SERVER_UPDATED_AT].as_str().unwrap());
        assert_eq!(stored["name"], json!("Max"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let storage = ServerStorage::in_memory().await.unwrap();
        storage
            .upsert("pets", "p1", record(json!({"id": "p1", "name": "Old"})))
            .await
            .unwrap();
        storage
            .upsert("pets", "p1", record(json!({"id": "p1", "name": "New"})))
            .await
            .unwrap();

        assert_eq!(storage.count("pets").await.unwrap(), 1);
        let stored = storage.get("pets", "p1").await.unwrap().unwrap();
        assert_eq!(stored["name"], json!("New"));
    }

    #[tokio::test]
    async fn test_query_by_owner_filters_collection_and_owner() {
        let storage = ServerStorage::in_memory().await.unwrap();
        storage
            .upsert("pets", "b", record(json!({"id": "b", "owner_id": "o1"})))
            .await
            .unwrap();
        storage
            .upsert("pets", "a", record(json!({"id": "a", "owner_id": "o1"})))
            .await
            .unwrap();
        storage
            .upsert("pets", "c", record(json!({"id": "c", "owner_id": "o2"})))
            .await
            .unwrap();
        storage
            .upsert("meals", "m", record(json!({"id": "m", "owner_id": "o1"})))
            .await
            .unwrap();

        let found = storage.query_by_owner("pets", "owner_id", "o1").await.unwrap();
        let ids: Vec<&str> = found.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let users = storage.query_by_owner("pets", "id", "c").await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let storage = ServerStorage::in_memory().await.unwrap();
        storage
            .upsert("pets", "p1", record(json!({"id": "p1"})))
            .await
            .unwrap();

        assert!(storage.delete("pets", "p1").await.unwrap());
        assert!(!storage.delete("pets", "p1").await.unwrap());
        assert!(storage.get("pets", "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_names() {
        let storage = ServerStorage::in_memory().await.unwrap();
        let err = storage
            .upsert("../etc", "p1", Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerStorageError::InvalidCollection(_)));
        assert!(err.is_client_error());

        let err = storage
            .query_by_owner("pets", "owner_id') OR 1=1 --", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ServerStorageError::InvalidOwnerKey(_)));

        let err = storage.upsert("pets", " ", Record::new()).await.unwrap_err();
        assert!(matches!(err, ServerStorageError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_open_persists_across_pools() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("server.db");

        {
            let storage = ServerStorage::open(&path).await.unwrap();
            storage
                .upsert("pets", "p1", record(json!({"id": "p1"})))
                .await
                .unwrap();
        }

        let storage = ServerStorage::open(&path).await.unwrap();
        assert!(storage.get("pets", "p1").await.unwrap().is_some());
    }
}
