//! Local store: persistent named collections over a pluggable byte backend.
//!
//! A collection is a JSON array stored under its name. All mutations of a
//! collection are serialized through a per-collection async lock shared by
//! every clone of the same [`LocalStore`].

mod backend;
mod error;
mod file;
mod sqlite;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::LocalStoreError;
pub use file::FileBackend;
pub use sqlite::SqliteBackend;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

type LockTable = HashMap<String, Arc<AsyncMutex<()>>>;

/// Result of a [`LocalStore::modify`] closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Modified<R> {
    pub value: R,
    /// When false the collection is not written back.
    pub changed: bool,
}

impl<R> Modified<R> {
    pub fn changed(value: R) -> Self {
        Self {
            value,
            changed: true,
        }
    }

    pub fn unchanged(value: R) -> Self {
        Self {
            value,
            changed: false,
        }
    }
}

/// Cheaply cloneable handle to the device-local store.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
    locks: Arc<Mutex<LockTable>>,
}

impl LocalStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self::from_backend(Arc::new(backend))
    }

    pub fn from_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Reads a whole collection; absent collections are empty.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, LocalStoreError> {
        validate_key(collection)?;
        self.read(collection).await
    }

    /// Atomically replaces a whole collection.
    pub async fn set<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<(), LocalStoreError> {
        validate_key(collection)?;
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.write(collection, records).await
    }

    pub async fn remove(&self, collection: &str) -> Result<(), LocalStoreError> {
        validate_key(collection)?;
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.backend.delete(collection).await
    }

    /// Read-mutate-write of one collection under its lock.
    ///
    /// No other `set`, `remove` or `modify` of the same collection can
    /// interleave between the read and the write. The write is skipped when
    /// the closure reports no change.
    pub async fn modify<T, R, F>(&self, collection: &str, f: F) -> Result<R, LocalStoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Modified<R>,
    {
        validate_key(collection)?;
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        let mut records: Vec<T> = self.read(collection).await?;
        let Modified { value, changed } = f(&mut records);
        if changed {
            self.write(collection, &records).await?;
        }
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, LocalStoreError> {
        match self.backend.read(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| LocalStoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), LocalStoreError> {
        let bytes = serde_json::to_vec(records).map_err(|source| LocalStoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, bytes).await
    }

    fn lock_for(&self, collection: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Checks that a collection key is safe to use as a file name or row key.
pub fn validate_key(key: &str) -> Result<(), LocalStoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(LocalStoreError::InvalidKey(key.to_string()))
    }
}
