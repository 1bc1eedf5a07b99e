//! Builds the core workspace from the loaded configuration.

use pawlog_core::{
    HttpRemoteStore, LocalStore, OfflineRemoteStore, RemoteStore, SqliteBackend, Workspace,
};
use std::sync::Arc;

use crate::config::{Config, SyncConfig};
use crate::error::CommandError;

/// Remote client for the configured server, or one that is always offline.
pub fn remote_store(sync: &SyncConfig) -> Result<Arc<dyn RemoteStore>, CommandError> {
    match (&sync.server_url, &sync.api_key) {
        (Some(url), Some(key)) => {
            let store = HttpRemoteStore::new(url.as_str(), key.as_str(), sync.timeout())?;
            Ok(Arc::new(store))
        }
        _ => {
            tracing::debug!("Sync not configured, using offline remote");
            Ok(Arc::new(OfflineRemoteStore))
        }
    }
}

pub async fn open_workspace(config: &Config) -> Result<Workspace, CommandError> {
    let backend = SqliteBackend::open(&config.database_path.value).await?;
    let store = LocalStore::new(backend);

    Ok(Workspace::with_options(
        store,
        remote_store(&config.sync)?,
        config.sync.conflict_policy,
        config.sync.timeout(),
    ))
}
