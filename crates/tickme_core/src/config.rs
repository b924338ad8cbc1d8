//! Core configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Storage keys are non-blank and pairwise distinct after validation.

use crate::logging::{default_log_level, normalize_level};
use crate::store::{Daily, Granularity, Monthly, Weekly};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "config is not valid JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage key per task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            daily: Daily::DEFAULT_STORAGE_KEY.to_string(),
            weekly: Weekly::DEFAULT_STORAGE_KEY.to_string(),
            monthly: Monthly::DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StorageKeys {
    pub fn all(&self) -> [&str; 3] {
        [
            self.daily.as_str(),
            self.weekly.as_str(),
            self.monthly.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub storage_keys: StorageKeys,
    /// SQLite file for persisted snapshots; `None` keeps them in memory.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_keys: StorageKeys::default(),
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = self.storage_keys.all();
        if keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "storage keys cannot be blank".to_string(),
            ));
        }
        for (index, key) in keys.iter().enumerate() {
            if keys[index + 1..].contains(key) {
                return Err(ConfigError::Invalid(format!(
                    "storage key `{key}` is used by more than one store"
                )));
            }
        }
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
