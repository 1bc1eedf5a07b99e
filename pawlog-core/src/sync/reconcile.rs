use async_trait::async_trait;

use super::{SyncDiff, SyncEngine, SyncError, SyncReport, SyncState};
use crate::models::Entity;
use crate::repository::PendingMirror;
use crate::store::LocalStoreError;

/// Object-safe view of a [`SyncEngine`], so callers can drive every
/// collection the same way without knowing its entity type.
#[async_trait]
pub trait Reconcile: Send + Sync {
    fn collection(&self) -> &'static str;
    fn state(&self) -> SyncState;

    async fn sync(&self, owner_id: &str) -> SyncReport;
    async fn push(&self) -> SyncReport;
    async fn push_pending(&self) -> SyncReport;
    async fn pull(&self, owner_id: &str) -> SyncReport;
    async fn diagnostic_diff(&self, owner_id: &str) -> Result<SyncDiff, SyncError>;
    async fn pending(&self) -> Result<Vec<PendingMirror>, LocalStoreError>;
}

#[async_trait]
impl<T: Entity> Reconcile for SyncEngine<T> {
    fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    fn state(&self) -> SyncState {
        SyncEngine::state(self)
    }

    async fn sync(&self, owner_id: &str) -> SyncReport {
        SyncEngine::sync(self, owner_id).await
    }

    async fn push(&self) -> SyncReport {
        SyncEngine::push(self).await
    }

    async fn push_pending(&self) -> SyncReport {
        SyncEngine::push_pending(self).await
    }

    async fn pull(&self, owner_id: &str) -> SyncReport {
        SyncEngine::pull(self, owner_id).await
    }

    async fn diagnostic_diff(&self, owner_id: &str) -> Result<SyncDiff, SyncError> {
        SyncEngine::diagnostic_diff(self, owner_id).await
    }

    async fn pending(&self) -> Result<Vec<PendingMirror>, LocalStoreError> {
        SyncEngine::pending(self).await
    }
}
