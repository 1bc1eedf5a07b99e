//! On-demand reconciliation between the local and remote stores.
//!
//! A [`SyncEngine`] handles one collection:
//!
//! - `push` upserts every local record and settles the outbox
//! - `push_pending` retries only what the outbox holds
//! - `pull` imports remote records the local store lacks
//! - `sync` runs push then pull and reports the remaining id differences
//!
//! Local data is never deleted by a pull, and under the default
//! [`ConflictPolicy`] no existing local record is modified either.

mod engine;
mod error;
mod policy;
mod reconcile;
mod report;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use policy::ConflictPolicy;
pub use reconcile::Reconcile;
pub use report::{SyncDiff, SyncReport, SyncState};
