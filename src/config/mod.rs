//! Configuration
//!
//! Layered configuration: built-in defaults, then an optional
//! `$XDG_CONFIG_HOME/agora/config.toml` (or an explicit file), then
//! `AGORA__SECTION__KEY` environment variables. Every field has a default, so
//! an empty file or no file at all yields a working in-memory setup.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::discovery::DiscoveryConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::registry::RegistryConfig;
use crate::reputation::ReputationConfig;
use crate::store::{SledStore, StoreBackend};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Sled,
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// Sled directory; `None` uses `$XDG_DATA_HOME/agora/store`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => paths::default_store_dir(),
        }
    }

    /// Open the configured backend.
    pub fn open(&self) -> Result<StoreBackend, ApiError> {
        match self.backend {
            StorageKind::Memory => Ok(StoreBackend::Memory),
            StorageKind::Sled => {
                let path = self.resolve_path()?;
                Ok(StoreBackend::Sled(SledStore::open(&path)?))
            }
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgoraConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub reputation: ReputationConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), ApiError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::ConfigError(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

impl AgoraConfig {
    /// Reject values the components cannot run with.
    pub fn validate(&self) -> Result<(), ApiError> {
        check_unit_interval(
            "registry.default_quality_score",
            self.registry.default_quality_score,
        )?;
        check_unit_interval(
            "discovery.default_min_reputation",
            self.discovery.default_min_reputation,
        )?;
        if self.discovery.default_limit == 0 {
            return Err(ApiError::ConfigError(
                "discovery.default_limit must be greater than 0".to_string(),
            ));
        }
        if self.discovery.request_timeout_secs == 0 {
            return Err(ApiError::ConfigError(
                "discovery.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.discovery.remote_url {
            reqwest::Url::parse(url).map_err(|e| {
                ApiError::ConfigError(format!("discovery.remote_url '{}' is invalid: {}", url, e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_validate() {
        let config = ConfigLoader::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageKind::Memory);
        assert_eq!(config.registry.default_quality_score, 0.8);
        assert_eq!(config.discovery.default_limit, 10);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let file = write_config(
            r#"
[discovery]
default_limit = 3
remote_url = "http://index.local:8080"

[reputation]
rating_window_secs = 3600

[logging]
level = "debug"

[logging.modules]
"agora::protocol" = "trace"
"#,
        );
        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.discovery.default_limit, 3);
        assert_eq!(
            config.discovery.remote_url.as_deref(),
            Some("http://index.local:8080")
        );
        assert_eq!(config.discovery.cache_ttl_secs, 300);
        assert_eq!(config.reputation.rating_window_secs, Some(3600));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.modules.get("agora::protocol").map(String::as_str),
            Some("trace")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = AgoraConfig::default();
        config.registry.default_quality_score = 1.5;
        assert!(config.validate().is_err());

        let mut config = AgoraConfig::default();
        config.discovery.default_limit = 0;
        assert!(config.validate().is_err());

        let mut config = AgoraConfig::default();
        config.discovery.remote_url = Some("::nope".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sled_backend_opens_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_config(&format!(
            "[storage]\nbackend = \"sled\"\npath = {:?}\n",
            dir.path().join("db").display().to_string()
        ));
        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.storage.backend, StorageKind::Sled);
        assert!(matches!(config.storage.open().unwrap(), StoreBackend::Sled(_)));
    }
}
