use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use super::backend::StorageBackend;
use super::error::LocalStoreError;

/// SQLite-backed storage: one row per key in the `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: &Path) -> Result<Self, LocalStoreError> {
        let key = path.display().to_string();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LocalStoreError::io(&key, e))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| LocalStoreError::database(&key, e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| LocalStoreError::database(&key, e))?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, gone when the backend is dropped.
    pub async fn in_memory() -> Result<Self, LocalStoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| LocalStoreError::database(":memory:", e))?;

        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| LocalStoreError::database(":memory:", e))?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, LocalStoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, LocalStoreError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LocalStoreError::database(key, e))?;

        Ok(row.map(|(value,)| value))
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), LocalStoreError> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(bytes)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LocalStoreError::database(key, e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), LocalStoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| LocalStoreError::database(key, e))?;

        Ok(())
    }
}
