//! Remote store client: the capability boundary for all network calls.

mod error;
mod http;
mod memory;

pub use error::RemoteError;
pub use http::HttpRemoteStore;
pub use memory::{MemoryRemoteStore, OfflineRemoteStore};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::codec::WireRecord;

/// Default deadline for a single remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Names a remote collection and the wire field its owner filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCollection {
    pub name: &'static str,
    pub owner_key: &'static str,
}

impl RemoteCollection {
    pub const fn new(name: &'static str, owner_key: &'static str) -> Self {
        Self { name, owner_key }
    }
}

/// Authoritative backend holding wire-shaped records.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts or replaces the record with the same `id`; returns the stored copy.
    async fn upsert(
        &self,
        collection: RemoteCollection,
        record: WireRecord,
    ) -> Result<WireRecord, RemoteError>;

    /// Deleting an id the server does not have is a success.
    async fn delete_by_id(&self, collection: RemoteCollection, id: &str) -> Result<(), RemoteError>;

    /// Every record whose owner field equals `owner_id`.
    async fn query_by_owner(
        &self,
        collection: RemoteCollection,
        owner_id: &str,
    ) -> Result<Vec<WireRecord>, RemoteError>;
}

/// Runs a remote call with a deadline, mapping expiry to [`RemoteError::Timeout`].
pub async fn call_with_timeout<T, F>(limit: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_with_timeout_passes_result_through() {
        let ok = call_with_timeout(Duration::from_secs(1), async { Ok::<_, RemoteError>(5) }).await;
        assert_eq!(ok, Ok(5));

        let err = call_with_timeout(Duration::from_secs(1), async {
            Err::<(), _>(RemoteError::rejected(400, "bad"))
        })
        .await;
        assert_eq!(err, Err(RemoteError::rejected(400, "bad")));
    }

    #[tokio::test]
    async fn test_call_with_timeout_expires() {
        let result = call_with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, RemoteError>(())
        })
        .await;
        assert_eq!(result, Err(RemoteError::Timeout));
    }
}
