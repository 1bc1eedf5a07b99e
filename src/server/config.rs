//! Server configuration and API keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// API key entry in the config file.
///
/// Entries written by `pawlog-admin` carry only `key_hash`; a plain `key`
/// is accepted for hand-written configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Config file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

impl ConfigFile {
    /// Reads the file, or returns an empty config if it does not exist.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_yaml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Directory holding the records database
    pub data_dir: PathBuf,
    /// Path to the API key file
    pub config_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PAWLOG_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("PAWLOG_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());

        let config_path = std::env::var("PAWLOG_SERVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path());

        Self {
            port,
            data_dir,
            config_path,
        }
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pawlog-server")
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pawlog-server")
            .join("config.yaml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("records.db")
    }
}

/// Hex SHA-256 of an API key, as stored in `key_hash`.
pub fn hash_key(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Authenticated client info, added to request extensions after auth
#[derive(Debug, Clone, PartialEq)]
pub struct AuthClient {
    pub name: String,
}

/// API key store - maps key hash -> client
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, AuthClient>,
}

impl ApiKeyStore {
    /// Load API keys from config file
    pub fn load(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => {
                    let store = Self::from_entries(config.api_keys);
                    tracing::info!("Loaded {} API key(s)", store.len());
                    store
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                tracing::warn!("No API keys loaded - all authenticated requests will fail");
                Self::default()
            }
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ApiKeyEntry>) -> Self {
        let mut keys = HashMap::new();
        for entry in entries {
            let hash = match (entry.key_hash, entry.key) {
                (Some(hash), _) => hash.to_lowercase(),
                (None, Some(key)) => hash_key(&key),
                (None, None) => {
                    tracing::warn!(name = %entry.name, "API key entry has neither key nor key_hash");
                    continue;
                }
            };
            keys.insert(hash, AuthClient { name: entry.name });
        }
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validate an API key and return the associated client
    pub fn validate(&self, key: &str) -> Option<AuthClient> {
        self.keys.get(&hash_key(key)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(name: &str, key: Option<&str>, key_hash: Option<String>) -> ApiKeyEntry {
        ApiKeyEntry {
            name: name.to_string(),
            key: key.map(String::from),
            key_hash,
            created_at: None,
        }
    }

    #[test]
    fn test_hash_key_is_sha256_hex() {
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_plain_and_hashed_keys() {
        let store = ApiKeyStore::from_entries(vec![
            entry("phone", Some("plain-key"), None),
            entry("tablet", None, Some(hash_key("hashed-key").to_uppercase())),
            entry("broken", None, None),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.validate("plain-key").unwrap().name, "phone");
        assert_eq!(store.validate("hashed-key").unwrap().name, "tablet");
        assert!(store.validate("wrong").is_none());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let store = ApiKeyStore::load(&temp_dir.path().join("missing.yaml"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/config.yaml");

        let mut config = ConfigFile::load(&path).unwrap();
        assert!(config.api_keys.is_empty());
        config
            .api_keys
            .push(entry("phone", None, Some(hash_key("secret"))));
        config.save(&path).unwrap();

        let store = ApiKeyStore::load(&path);
        assert_eq!(store.validate("secret").unwrap().name, "phone");
    }
}
