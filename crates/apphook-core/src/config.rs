//! Persistent configuration for apphook.
//!
//! Stores harness settings in `~/.apphook/config.json`: where the automation
//! server listens, which capability file to use, where failure screenshots
//! go, and the timeouts applied to tests and element waits.
//!
//! # Example
//!
//! ```no_run
//! use apphook_core::config::HarnessConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = HarnessConfig::load();
//! println!("Appium at {}", config.endpoint);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::Endpoint;

const CONFIG_FILENAME: &str = "config.json";

/// Default overall per-test timeout. Device round-trips make tests slow.
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 300_000;

/// Default timeout for waiting on an element to become visible.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 15_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),
}

/// Returns the apphook home directory (`~/.apphook/`).
///
/// Creates the directory if it doesn't exist. Falls back to the current
/// directory when no home directory can be determined.
pub fn apphook_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".apphook");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Returns the logs directory path (`~/.apphook/logs/`).
///
/// Creates the directory if it doesn't exist.
pub fn logs_dir() -> PathBuf {
    let dir = apphook_dir().join("logs");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Persistent harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// The automation server to open sessions against.
    pub endpoint: Endpoint,

    /// JSON capability file. When unset the built-in Android descriptor is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities_file: Option<PathBuf>,

    /// Directory receiving failure screenshots.
    pub artifacts_dir: PathBuf,

    /// Overall timeout for one test, in milliseconds.
    pub test_timeout_ms: u64,

    /// Default element visibility timeout, in milliseconds.
    pub wait_timeout_ms: u64,

    /// Terminate and relaunch the app before every test.
    pub reset_app: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            capabilities_file: None,
            artifacts_dir: PathBuf::from("artifacts"),
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            reset_app: false,
        }
    }
}

impl HarnessConfig {
    /// Load config from `~/.apphook/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&apphook_dir().join(CONFIG_FILENAME))
    }

    /// Load config from `path`, falling back to [`Default`].
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.apphook/config.json`, returning the path written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = apphook_dir().join(CONFIG_FILENAME);
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.endpoint, Endpoint::new("localhost", 4723, "/"));
        assert!(config.capabilities_file.is_none());
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.test_timeout(), Duration::from_secs(300));
        assert_eq!(config.wait_timeout(), Duration::from_secs(15));
        assert!(!config.reset_app);
    }

    #[test]
    fn roundtrip_serialization() {
        let config = HarnessConfig {
            endpoint: Endpoint::new("192.168.1.20", 4444, "/wd/hub"),
            capabilities_file: Some(PathBuf::from("/etc/apphook/caps.json")),
            reset_app: true,
            ..HarnessConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: HarnessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn deserialize_empty_json() {
        let loaded: HarnessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, HarnessConfig::default());
    }

    #[test]
    fn deserialize_partial_json() {
        let loaded: HarnessConfig =
            serde_json::from_str(r#"{"test_timeout_ms": 1000, "artifacts_dir": "out"}"#).unwrap();
        assert_eq!(loaded.test_timeout_ms, 1000);
        assert_eq!(loaded.artifacts_dir, PathBuf::from("out"));
        assert_eq!(loaded.wait_timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load_from(&tmp.path().join("config.json"));
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn load_from_unparsable_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(HarnessConfig::load_from(&path), HarnessConfig::default());
    }

    #[test]
    fn save_to_then_load_from() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        let config = HarnessConfig {
            wait_timeout_ms: 2_500,
            reset_app: true,
            ..HarnessConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(HarnessConfig::load_from(&path), config);
    }

    #[test]
    fn save_to_missing_directory_is_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent").join("config.json");
        let err = HarnessConfig::default().save_to(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Write(_)));
    }

    #[test]
    fn serialize_error_is_not_a_parse_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::Serialize(source);
        assert!(err.to_string().starts_with("failed to serialize config"));
    }
}
