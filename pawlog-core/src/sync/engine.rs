//! Bulk reconciliation of one collection between the local and remote stores.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ConflictPolicy, SyncDiff, SyncError, SyncReport, SyncState};
use crate::codec::{from_wire, to_wire, wire_id, WireRecord};
use crate::models::Entity;
use crate::remote::{call_with_timeout, RemoteStore, DEFAULT_CALL_TIMEOUT};
use crate::repository::mirror::{self, MirrorFailure};
use crate::repository::{Outbox, PendingMirror, PendingOp};
use crate::store::{LocalStore, LocalStoreError, Modified};

/// Remote calls made during one push phase.
#[derive(Debug, Default, Clone, Copy)]
struct Attempts {
    total: usize,
    transport_failures: usize,
}

impl Attempts {
    fn record(&mut self, failure: Option<&MirrorFailure>) {
        self.total += 1;
        if failure.map_or(false, MirrorFailure::is_transport) {
            self.transport_failures += 1;
        }
    }

    fn absorb(&mut self, other: Attempts) {
        self.total += other.total;
        self.transport_failures += other.transport_failures;
    }

    /// Something was attempted and nothing got through the transport.
    fn unreachable(&self) -> bool {
        self.total > 0 && self.transport_failures == self.total
    }
}

/// Counts produced inside the locked pull merge.
#[derive(Debug, Default)]
struct Merge {
    pulled: usize,
    replaced: usize,
    conflicts: Vec<String>,
}

/// On-demand push/pull/diff for one entity type.
pub struct SyncEngine<T: Entity> {
    store: LocalStore,
    remote: Arc<dyn RemoteStore>,
    outbox: Outbox,
    policy: ConflictPolicy,
    call_timeout: Duration,
    state: Arc<Mutex<SyncState>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
            outbox: self.outbox.clone(),
            policy: self.policy,
            call_timeout: self.call_timeout,
            state: Arc::clone(&self.state),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> SyncEngine<T> {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        let outbox = Outbox::new(store.clone(), T::COLLECTION);
        Self {
            store,
            remote,
            outbox,
            policy: ConflictPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            state: Arc::new(Mutex::new(SyncState::Idle)),
            _entity: PhantomData,
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn state(&self) -> SyncState {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn pending(&self) -> Result<Vec<PendingMirror>, LocalStoreError> {
        self.outbox.list().await
    }

    /// Upserts every local record. Leaves the engine `Failed` when no call
    /// got through the transport.
    pub async fn push(&self) -> SyncReport {
        let mut report = SyncReport::new(T::COLLECTION);
        self.set_state(SyncState::Pushing);

        let attempts = self.push_records(&mut report, &HashSet::new()).await;
        self.finish_push(&report, attempts);
        report
    }

    /// Retries only the mirrors queued in the outbox.
    pub async fn push_pending(&self) -> SyncReport {
        let mut report = SyncReport::new(T::COLLECTION);
        self.set_state(SyncState::Pushing);

        let attempts = self.flush_outbox(&mut report, None).await;
        self.finish_push(&report, attempts);
        report
    }

    /// Imports remote records for `owner_id`. Under the default policy no
    /// existing local record is modified.
    pub async fn pull(&self, owner_id: &str) -> SyncReport {
        let mut report = SyncReport::new(T::COLLECTION);
        self.set_state(SyncState::Pulling);
        self.pull_into(owner_id, &mut report).await;
        self.set_state(SyncState::Idle);

        tracing::info!(
            collection = T::COLLECTION,
            pulled = report.pulled,
            conflicts = report.conflicts.len(),
            "Pull complete"
        );
        report
    }

    /// Read-only comparison of the id sets on both sides for one owner.
    pub async fn diagnostic_diff(&self, owner_id: &str) -> Result<SyncDiff, SyncError> {
        let remote = call_with_timeout(
            self.call_timeout,
            self.remote.query_by_owner(T::remote_collection(), owner_id),
        )
        .await?;
        let remote_ids: BTreeSet<String> = remote
            .iter()
            .filter_map(wire_id)
            .map(String::from)
            .collect();
        let local_ids = self.local_ids(owner_id).await?;
        Ok(SyncDiff::between(&local_ids, &remote_ids))
    }

    /// Push phase, pull phase, then the diff against the pull's snapshot.
    ///
    /// Never fails: every problem is recorded in the returned report.
    pub async fn sync(&self, owner_id: &str) -> SyncReport {
        let mut report = SyncReport::new(T::COLLECTION);
        self.set_state(SyncState::Pushing);

        // Deletes go first so the pull below cannot bring them back.
        let mut attempts = self.flush_outbox(&mut report, Some(PendingOp::Delete)).await;

        let skip = match self.policy {
            ConflictPolicy::PreferLocal => Some(HashSet::new()),
            ConflictPolicy::PreferRemote | ConflictPolicy::Reject => {
                self.conflicting_ids(owner_id, &mut report, &mut attempts)
                    .await
            }
        };
        if let Some(skip) = skip {
            let pushed = self.push_records(&mut report, &skip).await;
            attempts.absorb(pushed);
        }

        if attempts.unreachable() {
            self.set_state(SyncState::Failed);
            tracing::warn!(
                collection = T::COLLECTION,
                failed = report.push_failed,
                "Remote unreachable during push, continuing with pull"
            );
        }

        self.set_state(SyncState::Pulling);
        if let Some(remote_ids) = self.pull_into(owner_id, &mut report).await {
            match self.local_ids(owner_id).await {
                Ok(local_ids) => report.apply_diff(SyncDiff::between(&local_ids, &remote_ids)),
                Err(e) => report.local_error = Some(e.to_string()),
            }
        }
        self.set_state(SyncState::Idle);

        tracing::info!(
            collection = T::COLLECTION,
            pushed = report.pushed,
            push_failed = report.push_failed,
            pulled = report.pulled,
            conflicts = report.conflicts.len(),
            local_only = report.local_only_ids.len(),
            remote_only = report.remote_only_ids.len(),
            "Sync complete"
        );
        report
    }

    fn set_state(&self, state: SyncState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    fn finish_push(&self, report: &SyncReport, attempts: Attempts) {
        let state = if attempts.unreachable() {
            SyncState::Failed
        } else {
            SyncState::Idle
        };
        self.set_state(state);

        tracing::info!(
            collection = T::COLLECTION,
            pushed = report.pushed,
            flushed = report.pending_flushed,
            failed = report.push_failed,
            "Push complete"
        );
    }

    async fn push_records(&self, report: &mut SyncReport, skip: &HashSet<String>) -> Attempts {
        let mut attempts = Attempts::default();
        let records: Vec<T> = match self.store.get(T::COLLECTION).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(collection = T::COLLECTION, error = %e, "Failed to read local records for push");
                report.local_error = Some(e.to_string());
                return attempts;
            }
        };

        let mut settled = Vec::new();
        for record in records.iter().filter(|r| !skip.contains(r.id())) {
            match mirror::upsert(self.remote.as_ref(), self.call_timeout, record).await {
                Ok(_) => {
                    attempts.record(None);
                    report.pushed += 1;
                    settled.push(record.id().to_string());
                }
                Err(failure) => {
                    attempts.record(Some(&failure));
                    self.note_push_failure(report, record.id(), &failure);
                }
            }
        }

        match self.outbox.clear_many(&settled, PendingOp::Upsert).await {
            Ok(cleared) => report.pending_flushed += cleared,
            Err(e) => tracing::error!(
                collection = T::COLLECTION,
                error = %e,
                "Failed to clear outbox after push"
            ),
        }
        attempts
    }

    async fn flush_outbox(&self, report: &mut SyncReport, only: Option<PendingOp>) -> Attempts {
        let mut attempts = Attempts::default();
        let pending = match self.outbox.list().await {
            Ok(pending) => pending,
            Err(e) => {
                report.local_error = Some(e.to_string());
                return attempts;
            }
        };
        let pending: Vec<PendingMirror> = pending
            .into_iter()
            .filter(|entry| only.map_or(true, |op| entry.op == op))
            .collect();
        if pending.is_empty() {
            return attempts;
        }

        let mut records: HashMap<String, T> = HashMap::new();
        if pending.iter().any(|entry| entry.op == PendingOp::Upsert) {
            match self.store.get::<T>(T::COLLECTION).await {
                Ok(all) => records = all.into_iter().map(|r| (r.id().to_string(), r)).collect(),
                Err(e) => {
                    report.local_error = Some(e.to_string());
                    return attempts;
                }
            }
        }

        let mut settled = Vec::new();
        let mut dropped = Vec::new();
        for entry in &pending {
            let result = match entry.op {
                PendingOp::Upsert => match records.get(&entry.id) {
                    Some(record) => mirror::upsert(self.remote.as_ref(), self.call_timeout, record)
                        .await
                        .map(|_| ()),
                    None => {
                        dropped.push(entry.id.clone());
                        continue;
                    }
                },
                PendingOp::Delete => {
                    mirror::delete::<T>(self.remote.as_ref(), self.call_timeout, &entry.id).await
                }
            };

            match result {
                Ok(()) => {
                    attempts.record(None);
                    settled.push((entry.id.clone(), entry.op));
                }
                Err(failure) => {
                    attempts.record(Some(&failure));
                    self.note_push_failure(report, &entry.id, &failure);
                    if let Err(e) = self.outbox.record(&entry.id, entry.op, &failure.to_string()).await {
                        tracing::error!(id = %entry.id, error = %e, "Failed to update pending mirror");
                    }
                }
            }
        }

        if !dropped.is_empty() {
            tracing::debug!(
                collection = T::COLLECTION,
                count = dropped.len(),
                "Dropping pending upserts for records that no longer exist"
            );
            if let Err(e) = self.outbox.clear_many(&dropped, PendingOp::Upsert).await {
                tracing::error!(error = %e, "Failed to drop stale outbox entries");
            }
        }

        for op in [PendingOp::Upsert, PendingOp::Delete] {
            let ids: Vec<&str> = settled
                .iter()
                .filter(|(_, settled_op)| *settled_op == op)
                .map(|(id, _)| id.as_str())
                .collect();
            match self.outbox.clear_many(&ids, op).await {
                Ok(cleared) => report.pending_flushed += cleared,
                Err(e) => tracing::error!(error = %e, "Failed to clear flushed outbox entries"),
            }
        }
        attempts
    }

    fn note_push_failure(&self, report: &mut SyncReport, id: &str, failure: &MirrorFailure) {
        tracing::warn!(
            entity = T::KIND,
            id,
            variant = failure.variant(),
            error = %failure,
            "Push failed"
        );
        report.push_failed += 1;
        if report.push_error.is_none() {
            report.push_error = Some(failure.to_string());
        }
    }

    /// Ids that differ between the sides, fetched before pushing so that a
    /// non-default policy does not overwrite them. `None` skips the push.
    async fn conflicting_ids(
        &self,
        owner_id: &str,
        report: &mut SyncReport,
        attempts: &mut Attempts,
    ) -> Option<HashSet<String>> {
        let remote = match call_with_timeout(
            self.call_timeout,
            self.remote.query_by_owner(T::remote_collection(), owner_id),
        )
        .await
        {
            Ok(remote) => remote,
            Err(e) => {
                let failure = MirrorFailure::Remote(e);
                attempts.record(Some(&failure));
                report.push_error = Some(format!("could not check for conflicts: {}", failure));
                return None;
            }
        };

        let local: Vec<T> = match self.store.get(T::COLLECTION).await {
            Ok(local) => local,
            Err(e) => {
                report.local_error = Some(e.to_string());
                return None;
            }
        };
        let local: HashMap<&str, &T> = local.iter().map(|r| (r.id(), r)).collect();

        Some(
            remote
                .iter()
                .filter_map(|wire| {
                    let id = wire_id(wire)?;
                    let record = local.get(id)?;
                    differs(*record, wire).then(|| id.to_string())
                })
                .collect(),
        )
    }

    /// Returns every id the remote reported, or `None` if the pull did not run.
    async fn pull_into(&self, owner_id: &str, report: &mut SyncReport) -> Option<BTreeSet<String>> {
        let remote = match call_with_timeout(
            self.call_timeout,
            self.remote.query_by_owner(T::remote_collection(), owner_id),
        )
        .await
        {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    variant = e.variant(),
                    error = %e,
                    "Pull failed"
                );
                report.pull_error = Some(e.to_string());
                return None;
            }
        };

        let tombstones = match self.outbox.pending_deletes().await {
            Ok(ids) => ids,
            Err(e) => {
                report.local_error = Some(e.to_string());
                return None;
            }
        };

        // Remote copies of ids held locally are decoded only when they may
        // replace the local record.
        let known: HashSet<String> = if self.policy == ConflictPolicy::PreferRemote {
            HashSet::new()
        } else {
            match self.store.get::<T>(T::COLLECTION).await {
                Ok(local) => local.iter().map(|r| r.id().to_string()).collect(),
                Err(e) => {
                    report.local_error = Some(e.to_string());
                    return None;
                }
            }
        };

        let mut remote_ids = BTreeSet::new();
        let mut incoming: Vec<(String, WireRecord, Option<T>)> = Vec::new();
        for wire in remote {
            let Some(id) = wire_id(&wire).map(String::from) else {
                tracing::warn!(collection = T::COLLECTION, "Remote record without an id");
                report.decode_failed += 1;
                continue;
            };
            if !remote_ids.insert(id.clone()) || tombstones.contains(&id) {
                continue;
            }
            if known.contains(&id) {
                incoming.push((id, wire, None));
                continue;
            }
            match from_wire::<T>(wire.clone()) {
                Ok(entity) => incoming.push((id, wire, Some(entity))),
                Err(e) => {
                    tracing::warn!(
                        entity = T::KIND,
                        id = %id,
                        variant = e.variant(),
                        error = %e,
                        "Skipping undecodable remote record"
                    );
                    report.decode_failed += 1;
                }
            }
        }

        let policy = self.policy;
        let merged = self
            .store
            .modify(T::COLLECTION, |records: &mut Vec<T>| {
                let mut merge = Merge::default();
                let mut index: HashMap<String, usize> = records
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (r.id().to_string(), i))
                    .collect();

                for (id, wire, entity) in incoming {
                    let slot = index.get(&id).copied();
                    match (slot, entity) {
                        (None, Some(entity)) => {
                            index.insert(id, records.len());
                            records.push(entity);
                            merge.pulled += 1;
                        }
                        // Removed locally after the snapshot above.
                        (None, None) => {}
                        (Some(i), entity) if differs(&records[i], &wire) => {
                            merge.conflicts.push(id);
                            if let (ConflictPolicy::PreferRemote, Some(entity)) = (policy, entity) {
                                records[i] = entity;
                                merge.replaced += 1;
                            }
                        }
                        (Some(_), _) => {}
                    }
                }

                let changed = merge.pulled > 0 || merge.replaced > 0;
                Modified {
                    value: merge,
                    changed,
                }
            })
            .await;

        match merged {
            Ok(merge) => {
                report.pulled += merge.pulled;
                report.replaced += merge.replaced;
                report.conflicts.extend(merge.conflicts);
                Some(remote_ids)
            }
            Err(e) => {
                tracing::error!(collection = T::COLLECTION, error = %e, "Failed to store pulled records");
                report.local_error = Some(e.to_string());
                None
            }
        }
    }

    async fn local_ids(&self, owner_id: &str) -> Result<BTreeSet<String>, LocalStoreError> {
        Ok(self
            .store
            .get::<T>(T::COLLECTION)
            .await?
            .iter()
            .filter(|r| r.owner_id() == owner_id)
            .map(|r| r.id().to_string())
            .collect())
    }
}

/// Whether the remote copy disagrees with the local record on any field the
/// local record carries. Fields only the remote has (server bookkeeping) are
/// ignored.
fn differs<T: Entity>(local: &T, remote: &WireRecord) -> bool {
    match to_wire(local) {
        Ok(local) => local
            .iter()
            .any(|(key, value)| remote.get(key).unwrap_or(&Value::Null) != value),
        Err(_) => true,
    }
}
