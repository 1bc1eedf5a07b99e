use thiserror::Error;

/// Errors raised by the local store and its backends.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Keys must be non-empty, made of `[A-Za-z0-9_.-]` and not start with a dot.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("I/O error for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("database error for key '{key}': {source}")]
    Database { key: String, source: sqlx::Error },

    #[error("failed to run local store migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Bytes under the key are not a valid collection.
    #[error("stored data for '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("failed to encode records for '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

impl LocalStoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    pub(crate) fn database(key: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            key: key.into(),
            source,
        }
    }
}
