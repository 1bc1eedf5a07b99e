use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::LocalStoreError;

/// Durable byte storage addressed by key.
///
/// A successful `write` must survive a process restart (for persistent
/// backends). Keys are validated by [`LocalStore`](super::LocalStore) before
/// they reach a backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns `None` when nothing is stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, LocalStoreError>;

    /// Replaces whatever is stored under `key`.
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), LocalStoreError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// In-memory backend.
///
/// Clones share the same map, so dropping a `LocalStore` and building a new
/// one over a clone behaves like an app restart.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, LocalStoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), LocalStoreError> {
        self.lock().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), LocalStoreError> {
        self.lock().remove(key);
        Ok(())
    }
}
