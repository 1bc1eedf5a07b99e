use pawlog_core::{LocalStoreError, RemoteError, RepositoryError, SyncError};

use crate::config::ConfigError;

/// Errors from CLI commands
#[derive(Debug)]
pub enum CommandError {
    Config(ConfigError),
    Store(LocalStoreError),
    Remote(RemoteError),
    Sync(SyncError),
    InvalidInput(String),
    NotFound(String),
    NotConfigured,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Config(e) => write!(f, "{}", e),
            CommandError::Store(e) => write!(f, "Local store error: {}", e),
            CommandError::Remote(e) => write!(f, "{}", e),
            CommandError::Sync(e) => write!(f, "Sync failed: {}", e),
            CommandError::InvalidInput(msg) => write!(f, "{}", msg),
            CommandError::NotFound(what) => write!(f, "Not found: {}", what),
            CommandError::NotConfigured => write!(
                f,
                "Sync is not configured. Set sync.server_url and sync.api_key in the config file."
            ),
            CommandError::Io(e) => write!(f, "I/O error: {}", e),
            CommandError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Config(e) => Some(e),
            CommandError::Store(e) => Some(e),
            CommandError::Remote(e) => Some(e),
            CommandError::Sync(e) => Some(e),
            CommandError::Io(e) => Some(e),
            CommandError::Json(e) => Some(e),
            CommandError::InvalidInput(_) | CommandError::NotFound(_) | CommandError::NotConfigured => {
                None
            }
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        CommandError::Config(e)
    }
}

impl From<LocalStoreError> for CommandError {
    fn from(e: LocalStoreError) -> Self {
        CommandError::Store(e)
    }
}

impl From<RepositoryError> for CommandError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Local(e) => CommandError::Store(e),
            other => CommandError::InvalidInput(other.to_string()),
        }
    }
}

impl From<RemoteError> for CommandError {
    fn from(e: RemoteError) -> Self {
        CommandError::Remote(e)
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::Io(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Json(e)
    }
}
