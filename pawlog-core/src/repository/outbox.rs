//! Durable queue of remote mirrors that have not succeeded yet.
//!
//! One entry per record id, stored in the local store under
//! `<collection>.outbox`. The latest operation for an id wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::models::now;
use crate::store::{LocalStore, LocalStoreError, Modified};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOp {
    Upsert,
    Delete,
}

impl fmt::Display for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOp::Upsert => write!(f, "upsert"),
            PendingOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMirror {
    pub id: String,
    pub op: PendingOp,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub queued_at: DateTime<Utc>,
}

pub fn outbox_key(collection: &str) -> String {
    format!("{}.outbox", collection)
}

/// Handle to one collection's outbox.
#[derive(Clone)]
pub struct Outbox {
    store: LocalStore,
    key: String,
}

impl Outbox {
    pub fn new(store: LocalStore, collection: &str) -> Self {
        Self {
            store,
            key: outbox_key(collection),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn list(&self) -> Result<Vec<PendingMirror>, LocalStoreError> {
        self.store.get(&self.key).await
    }

    /// Records a failed mirror of `op` for `id`.
    ///
    /// A repeat of the same operation bumps `attempts`; a different operation
    /// replaces the entry.
    pub async fn record(&self, id: &str, op: PendingOp, error: &str) -> Result<(), LocalStoreError> {
        self.store
            .modify(&self.key, |entries: &mut Vec<PendingMirror>| {
                match entries.iter_mut().find(|e| e.id == id) {
                    Some(entry) if entry.op == op => {
                        entry.attempts += 1;
                        entry.last_error = Some(error.to_string());
                    }
                    Some(entry) => {
                        *entry = PendingMirror {
                            id: id.to_string(),
                            op,
                            attempts: 1,
                            last_error: Some(error.to_string()),
                            queued_at: now(),
                        };
                    }
                    None => entries.push(PendingMirror {
                        id: id.to_string(),
                        op,
                        attempts: 1,
                        last_error: Some(error.to_string()),
                        queued_at: now(),
                    }),
                }
                Modified::changed(())
            })
            .await
    }

    /// Drops the entry for `id` if it still holds `op`; returns whether
    /// there was one.
    ///
    /// An entry replaced by a later operation stays queued.
    pub async fn clear(&self, id: &str, op: PendingOp) -> Result<bool, LocalStoreError> {
        self.clear_many(&[id], op).await.map(|removed| removed > 0)
    }

    /// Drops the `op` entries for all `ids`; returns how many were removed.
    pub async fn clear_many<S: AsRef<str>>(
        &self,
        ids: &[S],
        op: PendingOp,
    ) -> Result<usize, LocalStoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        self.store
            .modify(&self.key, |entries: &mut Vec<PendingMirror>| {
                let before = entries.len();
                entries.retain(|e| e.op != op || !ids.contains(e.id.as_str()));
                let removed = before - entries.len();
                Modified {
                    value: removed,
                    changed: removed > 0,
                }
            })
            .await
    }

    /// Ids whose latest pending operation is a delete.
    pub async fn pending_deletes(&self) -> Result<HashSet<String>, LocalStoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|e| e.op == PendingOp::Delete)
            .map(|e| e.id)
            .collect())
    }
}
