//! Pawlog Core Library
//!
//! Entity models, the device-local store and the offline-first sync layer
//! shared by Pawlog clients.

pub mod codec;
pub mod models;
pub mod remote;
pub mod repository;
pub mod store;
pub mod sync;
pub mod workspace;

pub use codec::{from_wire, to_wire, CodecError, WireRecord};
pub use models::{
    ActivityKind, ActivitySession, Entity, FoodCategory, FoodItem, Frequency, HealthRecord,
    HealthRecordType, Meal, MealItem, MealType, Medication, Nutrient, Pet, Species, User,
};
pub use remote::{
    HttpRemoteStore, MemoryRemoteStore, OfflineRemoteStore, RemoteCollection, RemoteError,
    RemoteStore,
};
pub use repository::{Outbox, PendingMirror, PendingOp, Repository, RepositoryError};
pub use store::{FileBackend, LocalStore, LocalStoreError, MemoryBackend, SqliteBackend, StorageBackend};
pub use sync::{ConflictPolicy, Reconcile, SyncDiff, SyncEngine, SyncError, SyncReport, SyncState};
pub use workspace::Workspace;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
