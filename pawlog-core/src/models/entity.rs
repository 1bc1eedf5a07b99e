//! The [`Entity`] trait shared by every record type.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::Field;
use crate::remote::RemoteCollection;

/// A uniquely identified, owner-scoped record that can live in both stores.
///
/// `Serialize`/`Deserialize` produce the local shape (camelCase names);
/// [`Entity::FIELDS`] tells the codec how each known field travels on the wire.
pub trait Entity: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static {
    /// Collection name in both the local and the remote store.
    const COLLECTION: &'static str;
    /// Human-readable kind used in log lines.
    const KIND: &'static str;
    /// Wire field holding the owner reference.
    const OWNER_KEY: &'static str = "owner_id";
    /// Field table consumed by the codec.
    const FIELDS: &'static [Field];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn owner_id(&self) -> &str;

    fn remote_collection() -> RemoteCollection {
        RemoteCollection::new(Self::COLLECTION, Self::OWNER_KEY)
    }
}

/// Generates a new entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time at the precision the wire keeps (milliseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
