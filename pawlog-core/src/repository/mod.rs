//! Offline-first CRUD over one entity collection.
//!
//! Every mutation commits to the local store first and returns the local
//! result. The change is then mirrored to the remote store; a failed mirror is
//! logged and queued in the collection's [`Outbox`] but never undoes the local
//! change.

mod activity_repo;
mod error;
mod food_repo;
mod health_repo;
mod meal_repo;
mod medication_repo;
pub(crate) mod mirror;
mod outbox;
mod pet_repo;
mod user_repo;

pub use error::RepositoryError;
pub use outbox::{outbox_key, Outbox, PendingMirror, PendingOp};

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{new_id, Entity};
use crate::remote::{RemoteStore, DEFAULT_CALL_TIMEOUT};
use crate::store::{LocalStore, Modified};
use mirror::MirrorFailure;

pub struct Repository<T: Entity> {
    store: LocalStore,
    remote: Arc<dyn RemoteStore>,
    outbox: Outbox,
    call_timeout: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
            outbox: self.outbox.clone(),
            call_timeout: self.call_timeout,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        let outbox = Outbox::new(store.clone(), T::COLLECTION);
        Self {
            store,
            remote,
            outbox,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            _entity: PhantomData,
        }
    }

    /// Deadline for each remote mirror call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Stores a new record, assigning an id when it has none.
    pub async fn create(&self, mut entity: T) -> Result<T, RepositoryError> {
        if entity.id().is_empty() {
            entity.set_id(new_id());
        }

        let created = self
            .store
            .modify(T::COLLECTION, |records: &mut Vec<T>| {
                if records.iter().any(|r| r.id() == entity.id()) {
                    return Modified::unchanged(Err(RepositoryError::DuplicateId {
                        collection: T::COLLECTION.to_string(),
                        id: entity.id().to_string(),
                    }));
                }
                records.push(entity.clone());
                Modified::changed(Ok(entity))
            })
            .await??;

        self.mirror_upsert(&created).await;
        Ok(created)
    }

    /// Replaces the record with `id`. Returns `None` when no such record
    /// exists locally; the record is not created in that case.
    pub async fn update(&self, id: &str, mut entity: T) -> Result<Option<T>, RepositoryError> {
        entity.set_id(id.to_string());

        let updated = self
            .store
            .modify(T::COLLECTION, |records: &mut Vec<T>| {
                match records.iter_mut().find(|r| r.id() == id) {
                    Some(slot) => {
                        *slot = entity.clone();
                        Modified::changed(Some(entity))
                    }
                    None => Modified::unchanged(None),
                }
            })
            .await?;

        if let Some(entity) = &updated {
            self.mirror_upsert(entity).await;
        }
        Ok(updated)
    }

    /// Removes the record with `id`; returns whether one was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let removed = self
            .store
            .modify(T::COLLECTION, |records: &mut Vec<T>| {
                let before = records.len();
                records.retain(|r| r.id() != id);
                let removed = records.len() != before;
                Modified {
                    value: removed,
                    changed: removed,
                }
            })
            .await?;

        if removed {
            match mirror::delete::<T>(self.remote.as_ref(), self.call_timeout, id).await {
                Ok(()) => self.settle(id, PendingOp::Delete).await,
                Err(failure) => self.queue(id, PendingOp::Delete, &failure).await,
            }
        }
        Ok(removed)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        Ok(self.get_all().await?.into_iter().find(|r| r.id() == id))
    }

    /// All local records in insertion order.
    pub async fn get_all(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.store.get(T::COLLECTION).await?)
    }

    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<T>, RepositoryError> {
        self.find(|r| r.owner_id() == owner_id).await
    }

    pub async fn find<P>(&self, predicate: P) -> Result<Vec<T>, RepositoryError>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }

    async fn mirror_upsert(&self, entity: &T) {
        match mirror::upsert(self.remote.as_ref(), self.call_timeout, entity).await {
            Ok(_) => self.settle(entity.id(), PendingOp::Upsert).await,
            Err(failure) => self.queue(entity.id(), PendingOp::Upsert, &failure).await,
        }
    }

    async fn settle(&self, id: &str, op: PendingOp) {
        if let Err(e) = self.outbox.clear(id, op).await {
            tracing::error!(
                entity = T::KIND,
                id,
                error = %e,
                "Failed to clear outbox entry after successful mirror"
            );
        }
    }

    async fn queue(&self, id: &str, op: PendingOp, failure: &MirrorFailure) {
        tracing::warn!(
            entity = T::KIND,
            id,
            op = %op,
            variant = failure.variant(),
            error = %failure,
            "Remote mirror failed, queued for retry"
        );

        if let Err(e) = self.outbox.record(id, op, &failure.to_string()).await {
            tracing::error!(
                entity = T::KIND,
                id,
                error = %e,
                "Failed to record pending mirror"
            );
        }
    }
}
