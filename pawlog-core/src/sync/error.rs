//! Sync error types.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::store::LocalStoreError;

/// Errors from sync operations that return a `Result` instead of a report.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local store error: {0}")]
    Local(#[from] LocalStoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
