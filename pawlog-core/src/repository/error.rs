use thiserror::Error;

use crate::store::LocalStoreError;

/// Errors surfaced by repository mutations.
///
/// Remote failures never appear here: mirroring is best-effort and failures
/// are queued in the outbox instead.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Local(#[from] LocalStoreError),

    #[error("{collection} already contains a record with id '{id}'")]
    DuplicateId { collection: String, id: String },
}
