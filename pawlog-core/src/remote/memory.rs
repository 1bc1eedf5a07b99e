//! In-process remote stores for tests, demos and unconfigured clients.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{RemoteCollection, RemoteError, RemoteStore};
use crate::codec::{wire_id, WireRecord};

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, WireRecord>>,
    offline: bool,
    failure: Option<RemoteError>,
}

/// Remote store held in memory.
///
/// Clones share state, so two "devices" can talk to the same backend. It can
/// be switched offline or made to fail every call with a given error.
#[derive(Clone, Default)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<State>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `Unreachable`.
    pub fn set_online(&self, online: bool) {
        self.lock().offline = !online;
    }

    /// Makes every call fail with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<RemoteError>) {
        self.lock().failure = error;
    }

    /// Records in a collection, ordered by id.
    pub fn records(&self, collection: &str) -> Vec<WireRecord> {
        self.lock()
            .collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.lock()
            .collections
            .get(collection)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Seeds a record directly, bypassing the online switch.
    pub fn insert(&self, collection: &str, record: WireRecord) {
        if let Some(id) = wire_id(&record).map(String::from) {
            self.lock()
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(id, record);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn available(&self) -> Result<MutexGuard<'_, State>, RemoteError> {
        let state = self.lock();
        if state.offline {
            return Err(RemoteError::unreachable("memory remote is offline"));
        }
        if let Some(err) = &state.failure {
            return Err(err.clone());
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn upsert(
        &self,
        collection: RemoteCollection,
        record: WireRecord,
    ) -> Result<WireRecord, RemoteError> {
        let id = wire_id(&record)
            .ok_or_else(|| RemoteError::rejected(400, "record has no id"))?
            .to_string();

        let mut state = self.available()?;
        state
            .collections
            .entry(collection.name.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, collection: RemoteCollection, id: &str) -> Result<(), RemoteError> {
        let mut state = self.available()?;
        if let Some(records) = state.collections.get_mut(collection.name) {
            records.remove(id);
        }
        Ok(())
    }

    async fn query_by_owner(
        &self,
        collection: RemoteCollection,
        owner_id: &str,
    ) -> Result<Vec<WireRecord>, RemoteError> {
        let state = self.available()?;
        let records = state
            .collections
            .get(collection.name)
            .map(|records| {
                records
                    .values()
                    .filter(|r| r.get(collection.owner_key).and_then(Value::as_str) == Some(owner_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }
}

/// Remote store used when no server is configured: every call is `Unreachable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemoteStore;

const OFFLINE_MESSAGE: &str = "no remote store configured";

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    async fn upsert(&self, _: RemoteCollection, _: WireRecord) -> Result<WireRecord, RemoteError> {
        Err(RemoteError::unreachable(OFFLINE_MESSAGE))
    }

    async fn delete_by_id(&self, _: RemoteCollection, _: &str) -> Result<(), RemoteError> {
        Err(RemoteError::unreachable(OFFLINE_MESSAGE))
    }

    async fn query_by_owner(&self, _: RemoteCollection, _: &str) -> Result<Vec<WireRecord>, RemoteError> {
        Err(RemoteError::unreachable(OFFLINE_MESSAGE))
    }
}
