//! Engine configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the defaults of
//! the portal's release index.
//!
//! ```toml
//! index = "icgc27-release"
//! terms_size = 500
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Index every compiled request targets.
    pub index: String,

    /// Bucket count requested for each terms aggregation.
    pub terms_size: u32,

    /// Index holding entity-set id lists referenced by `ES:` values.
    pub lookup_index: String,

    /// Field of a lookup document that lists the ids.
    pub lookup_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index: "icgc-release".to_string(),
            terms_size: 1000,
            lookup_index: "terms-lookup".to_string(),
            lookup_path: "values".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.index.is_empty() {
            return Err(ConfigError::Invalid("index must not be empty".into()));
        }
        if self.terms_size == 0 {
            return Err(ConfigError::Invalid("terms_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_toml_str("index = \"icgc27\"").unwrap();
        assert_eq!(config.index, "icgc27");
        assert_eq!(config.terms_size, 1000);
        assert_eq!(config.lookup_index, "terms-lookup");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(EngineConfig::from_toml_str("shards = 3").is_err());
    }

    #[test]
    fn test_zero_terms_size_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("terms_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
