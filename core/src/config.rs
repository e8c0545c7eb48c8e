//! Sync-layer configuration.

use std::fs;
use std::path::{Path, PathBuf};

use boardsync_protocol::{PAGE_SIZE_DEFAULT, PAGE_SIZE_MAX};
use serde::Deserialize;
use thiserror::Error;

/// Failed to load or validate a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the cache and pagination layer.
///
/// ```toml
/// page_size = 10
/// max_page_size = 50
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Rows per list-query page.
    pub page_size: u32,
    /// Upper bound accepted for any caller-supplied limit.
    pub max_page_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE_DEFAULT,
            max_page_size: PAGE_SIZE_MAX,
        }
    }
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.max_page_size > PAGE_SIZE_MAX {
            return Err(ConfigError::Invalid(format!(
                "max_page_size must not exceed {PAGE_SIZE_MAX}"
            )));
        }
        if self.page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "page_size must not exceed max_page_size".into(),
            ));
        }
        Ok(())
    }
}
