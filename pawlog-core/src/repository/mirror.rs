//! Encode-and-send helpers shared by the repository and the sync engine.

use std::fmt;
use std::time::Duration;

use crate::codec::{to_wire, CodecError, WireRecord};
use crate::models::Entity;
use crate::remote::{call_with_timeout, RemoteError, RemoteStore};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MirrorFailure {
    Codec(CodecError),
    Remote(RemoteError),
}

impl MirrorFailure {
    pub(crate) fn variant(&self) -> &'static str {
        match self {
            MirrorFailure::Codec(e) => e.variant(),
            MirrorFailure::Remote(e) => e.variant(),
        }
    }

    pub(crate) fn is_transport(&self) -> bool {
        matches!(self, MirrorFailure::Remote(e) if e.is_transport())
    }
}

impl fmt::Display for MirrorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorFailure::Codec(e) => write!(f, "{}", e),
            MirrorFailure::Remote(e) => write!(f, "{}", e),
        }
    }
}

pub(crate) async fn upsert<T: Entity>(
    remote: &dyn RemoteStore,
    limit: Duration,
    entity: &T,
) -> Result<WireRecord, MirrorFailure> {
    let wire = to_wire(entity).map_err(MirrorFailure::Codec)?;
    call_with_timeout(limit, remote.upsert(T::remote_collection(), wire))
        .await
        .map_err(MirrorFailure::Remote)
}

pub(crate) async fn delete<T: Entity>(
    remote: &dyn RemoteStore,
    limit: Duration,
    id: &str,
) -> Result<(), MirrorFailure> {
    call_with_timeout(limit, remote.delete_by_id(T::remote_collection(), id))
        .await
        .map_err(MirrorFailure::Remote)
}
