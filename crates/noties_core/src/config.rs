//! Core runtime configuration.
//!
//! # Responsibility
//! - Name where the storage database and logs live.
//! - Name the key-value slot holding the note blob.
//!
//! # Invariants
//! - `data_dir`, when set, is absolute.
//! - `storage_key` and `db_file_name` are never blank.

use crate::logging::default_log_level;
use crate::repo::note_repo::DEFAULT_NOTES_KEY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "noties.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
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

/// Runtime configuration for embedding the note core.
///
/// Missing JSON fields fall back to [`CoreConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Directory holding the database and `logs/`. `None` keeps storage in
    /// memory and disables file logging.
    pub data_dir: Option<PathBuf>,
    pub db_file_name: String,
    /// Key of the slot holding the notes JSON array.
    pub storage_key: String,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            storage_key: DEFAULT_NOTES_KEY.to_string(),
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses a (possibly partial) JSON document and validates it.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory configuration rooted nowhere.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// File-backed configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key cannot be empty".to_string()));
        }
        if self.db_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("db_file_name cannot be empty".to_string()));
        }
        if let Some(dir) = &self.data_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "data_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Database file path, or `None` for in-memory storage.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(&self.db_file_name))
    }

    /// Rolling log directory, or `None` when file logging is off.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(LOG_DIR_NAME))
    }
}
