//! Configuration loading.
//!
//! Reads `config.toml` from the platform config directory (override with
//! `SKOOLACTL_CONFIG`). A missing file yields defaults; unknown keys are
//! logged at WARN and ignored so an older binary tolerates a newer file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SKOOLACTL_CONFIG";

/// Default Skoola API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.skoola.app";

/// Default request timeout (seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the session database file. Defaults to
    /// `sessions.db` in the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load from the default location (or `SKOOLACTL_CONFIG`).
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and parse one file, warning on unknown keys.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        Self::parse(&raw, &path.display().to_string())
    }

    fn parse(raw: &str, origin: &str) -> anyhow::Result<Self> {
        let deserializer = toml::de::Deserializer::new(raw);
        let config: Config = serde_ignored::deserialize(deserializer, |unknown| {
            tracing::warn!(key = %unknown, origin = %origin, "ignoring unknown config key");
        })
        .map_err(|e| anyhow::anyhow!("invalid config {origin}: {e}"))?;
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        directories::ProjectDirs::from("com", "Skoola", "skoolactl")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Where the session database lives, creating parent directories.
    pub fn session_db_path(&self) -> anyhow::Result<PathBuf> {
        let path = match &self.storage.path {
            Some(path) => path.clone(),
            None => directories::ProjectDirs::from("com", "Skoola", "skoolactl")
                .ok_or_else(|| anyhow::anyhow!("cannot determine a data directory on this host"))?
                .data_dir()
                .join("sessions.db"),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = Config::parse("", "test").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = Config::parse("[api]\nbase_url = \"https://staging.skoola.app\"\n", "test")
            .unwrap();
        assert_eq!(config.api.base_url, "https://staging.skoola.app");
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn storage_path_override() {
        let config =
            Config::parse("[storage]\npath = \"/tmp/skoola/sessions.db\"\n", "test").unwrap();
        assert_eq!(
            config.storage.path.as_deref(),
            Some(Path::new("/tmp/skoola/sessions.db"))
        );
    }

    #[test]
    fn unknown_keys_are_ignored_not_fatal() {
        let config = Config::parse(
            "[api]\nbase_url = \"https://api.skoola.app\"\nshiny_new_flag = true\n",
            "test",
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.skoola.app");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("[api\nbase_url=", "test").is_err());
    }

    #[test]
    fn explicit_storage_path_is_used_verbatim() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("nested").join("sessions.db");
        let config = Config {
            storage: StorageConfig {
                path: Some(target.clone()),
            },
            ..Config::default()
        };

        let resolved = config.session_db_path().unwrap();
        assert_eq!(resolved, target);
        assert!(target.parent().unwrap().exists());
    }
}
