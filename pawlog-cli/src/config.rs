use pawlog_core::ConflictPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a setting came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        })
    }
}

/// A resolved setting and the layer that supplied it.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn layer(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            *self = Self::new(value, source);
        }
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// The `sync:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Server base URL, e.g. "http://localhost:8080"
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    /// Flush pending mirrors after writes
    #[serde(default)]
    pub auto_sync: bool,
    /// Deadline for each remote call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// What a pull does with ids that differ on both sides
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            auto_sync: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Sync needs both a server and a key.
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// SQLite database holding the local store
    pub database_path: ConfigValue<PathBuf>,
    /// Owner id stamped on new records and used to scope pulls
    pub owner_id: ConfigValue<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
}

/// On-disk shape of `config.yaml`; every key is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileLayer {
    database_path: Option<PathBuf>,
    owner_id: Option<String>,
    sync: Option<SyncConfig>,
}

impl FileLayer {
    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::ReadError(path.to_path_buf(), e)),
        };
        serde_yaml::from_str(&contents)
            .map(Some)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }
}

impl Config {
    /// Resolves settings as defaults, then the config file, then `PAWLOG_*` variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or_else(Self::default_config_path);
        let file = FileLayer::read(&path)?.map(|layer| (path, layer));
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(
        file: Option<(PathBuf, FileLayer)>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self {
            database_path: ConfigValue::new(
                Self::default_data_dir().join("pawlog.db"),
                ConfigSource::Default,
            ),
            owner_id: ConfigValue::new("default".to_string(), ConfigSource::Default),
            config_file: None,
            sync: SyncConfig::default(),
        };

        if let Some((path, layer)) = file {
            // A relative database path is relative to the config file.
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            config.database_path.layer(
                layer.database_path.map(|db| base.join(db)),
                ConfigSource::File,
            );
            config.owner_id.layer(layer.owner_id, ConfigSource::File);
            if let Some(sync) = layer.sync {
                config.sync = sync;
            }
            config.config_file = Some(path);
        }

        config.database_path.layer(
            env("PAWLOG_DATABASE_PATH").map(PathBuf::from),
            ConfigSource::Environment,
        );
        config
            .owner_id
            .layer(env("PAWLOG_OWNER_ID"), ConfigSource::Environment);
        if let Some(url) = env("PAWLOG_SYNC_URL") {
            config.sync.server_url = Some(url);
        }
        if let Some(key) = env("PAWLOG_SYNC_API_KEY") {
            config.sync.api_key = Some(key);
        }
        if let Some(policy) = env("PAWLOG_SYNC_POLICY") {
            config.sync.conflict_policy = policy
                .parse()
                .map_err(|e| ConfigError::InvalidValue("PAWLOG_SYNC_POLICY", e))?;
        }

        Ok(config)
    }

    /// Platform config directory joined with `pawlog`
    /// (`~/.config/pawlog` on Linux).
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pawlog")
    }

    /// Platform data directory joined with `pawlog`
    /// (`~/.local/share/pawlog` on Linux).
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pawlog")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, e) => write!(f, "Invalid value for {}: {}", name, e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidValue(..) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn layer(yaml: &str) -> FileLayer {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = Config::resolve(None, no_env).unwrap();

        assert!(config.database_path.value.ends_with("pawlog/pawlog.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.owner_id.value, "default");
        assert_eq!(config.sync.timeout(), Duration::from_secs(10));
        assert_eq!(config.sync.conflict_policy, ConflictPolicy::PreferLocal);
        assert!(!config.sync.is_configured());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load(Some(temp_dir.path().join("none.yaml"))).unwrap();
        assert!(config.config_file.is_none());
        assert_eq!(config.owner_id.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_layer() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "database_path: /var/lib/pawlog.sqlite\n\
             owner_id: user-42\n\
             sync:\n  server_url: http://localhost:8080\n  api_key: secret\n  conflict_policy: prefer-remote\n",
        )
        .unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.database_path.value, PathBuf::from("/var/lib/pawlog.sqlite"));
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.owner_id.value, "user-42");
        assert_eq!(config.config_file, Some(path));
        assert!(config.sync.is_configured());
        assert_eq!(config.sync.conflict_policy, ConflictPolicy::PreferRemote);
        assert_eq!(config.sync.timeout_secs, 10);
    }

    #[test]
    fn test_relative_database_path_joins_config_dir() {
        let file = (
            PathBuf::from("/home/me/.config/pawlog/config.yaml"),
            layer("database_path: data/pawlog.db"),
        );
        let config = Config::resolve(Some(file), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/home/me/.config/pawlog/data/pawlog.db")
        );
    }

    #[test]
    fn test_environment_beats_file() {
        let env: HashMap<&str, &str> = [
            ("PAWLOG_OWNER_ID", "from-env"),
            ("PAWLOG_SYNC_URL", "http://sync.local"),
            ("PAWLOG_SYNC_API_KEY", "k"),
            ("PAWLOG_SYNC_POLICY", "reject"),
        ]
        .into_iter()
        .collect();
        let file = (
            PathBuf::from("/etc/pawlog.yaml"),
            layer("owner_id: from-file\nsync:\n  auto_sync: true\n"),
        );

        let config =
            Config::resolve(Some(file), |name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.owner_id.value, "from-env");
        assert_eq!(config.owner_id.source, ConfigSource::Environment);
        assert!(config.sync.auto_sync);
        assert!(config.sync.is_configured());
        assert_eq!(config.sync.conflict_policy, ConflictPolicy::Reject);
    }

    #[test]
    fn test_bad_policy_in_environment() {
        let err = Config::resolve(None, |name| {
            (name == "PAWLOG_SYNC_POLICY").then(|| "merge".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("PAWLOG_SYNC_POLICY"));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "invalid: yaml: content: [\n").unwrap();

        let err = Config::load(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_conflict_policy_in_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "sync:\n  conflict_policy: merge\n").unwrap();

        assert!(Config::load(Some(path)).is_err());
    }
}
