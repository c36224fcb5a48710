//! Importer configuration.
//!
//! Settings are read from `<config_dir>/contactstore/importer.json`. Every
//! field is optional; missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderPolicy;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ImporterConfig`].
    #[error("Invalid configuration in {path}: {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Configuration for an [`Importer`](crate::Importer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Executable that performs the provider-specific retrieval.
    pub program: PathBuf,
    /// Leading arguments placed before provider, email and password.
    pub args: Vec<String>,
    /// Seconds to wait for the retrieval program before killing it.
    pub timeout_secs: u64,
    /// Maximum number of retrieval programs running at once.
    pub max_concurrent: usize,
    /// Treatment of unrecognised domain labels.
    pub provider_policy: ProviderPolicy,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("php"),
            args: vec!["openinviter/script.php".to_string()],
            timeout_secs: 120,
            max_concurrent: 4,
            provider_policy: ProviderPolicy::Permissive,
        }
    }
}

impl ImporterConfig {
    /// Wait limit for one retrieval.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contactstore")
            .join("importer.json")
    }

    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads configuration from [`default_path`](Self::default_path).
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            tracing::debug!("No importer config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImporterConfig::default();
        assert_eq!(config.program, PathBuf::from("php"));
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.provider_policy, ProviderPolicy::Permissive);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"timeout_secs": 5, "provider_policy": "strict"}"#;
        let config: ImporterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.provider_policy, ProviderPolicy::Strict);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.args, vec!["openinviter/script.php".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImporterConfig::load("/nonexistent/contactstore/importer.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let path = std::env::temp_dir()
            .join(format!("contactstore-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = ImporterConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir()
            .join(format!("contactstore-config-ok-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"program": "/usr/bin/env", "args": ["inviter"]}"#).unwrap();
        let config = ImporterConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.program, PathBuf::from("/usr/bin/env"));
        assert_eq!(config.args, vec!["inviter".to_string()]);
    }
}
