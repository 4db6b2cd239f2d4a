//! Runtime assembly from [`CoreConfig`].
//!
//! # Responsibility
//! - Start file logging and open the storage database named by the config.
//! - Hand callers a `NoteStore` bound to the configured storage key.
//!
//! # Invariants
//! - The configuration is validated before anything touches disk.
//! - In-memory configurations never create files or start file logging.

use crate::config::{ConfigError, CoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::{init_logging, LoggingError};
use crate::repo::note_repo::BlobNoteRepository;
use crate::service::note_store::NoteStore;
use crate::storage::{SqliteKeyValueStorage, StorageError};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Note store over the configured SQLite key-value slot.
pub type SqliteNoteStore<'conn> = NoteStore<BlobNoteRepository<SqliteKeyValueStorage<'conn>>>;

/// Failure while assembling the runtime.
#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Logging(LoggingError),
    DataDir(std::io::Error),
    Db(DbError),
    Storage(StorageError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "logging init failed: {err}"),
            Self::DataDir(err) => write!(f, "cannot create data directory: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::DataDir(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for BootstrapError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for BootstrapError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StorageError> for BootstrapError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Configured storage connection plus the settings that shaped it.
pub struct CoreRuntime {
    config: CoreConfig,
    conn: Connection,
}

impl CoreRuntime {
    /// Validates `config`, starts file logging when a data directory is set
    /// and opens the storage database.
    ///
    /// # Errors
    /// - `Config` for invalid settings, `Logging` when file logging cannot
    ///   start, `DataDir`/`Db` when the database cannot be opened.
    pub fn start(config: CoreConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        if let Some(log_dir) = config.log_dir() {
            init_logging(&config.log_level, log_dir)?;
        }

        let conn = match (&config.data_dir, config.db_path()) {
            (Some(data_dir), Some(db_path)) => {
                std::fs::create_dir_all(data_dir).map_err(BootstrapError::DataDir)?;
                open_db(db_path)?
            }
            _ => open_db_in_memory()?,
        };
        info!(
            "event=core_start module=bootstrap status=ok storage={}",
            if config.data_dir.is_some() { "file" } else { "memory" }
        );
        Ok(Self { config, conn })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Runs `f` against a freshly loaded store over the configured slot.
    ///
    /// # Errors
    /// - `Storage` when the database schema is not usable.
    pub fn with_note_store<T>(
        &self,
        f: impl FnOnce(&mut SqliteNoteStore<'_>) -> T,
    ) -> Result<T, BootstrapError> {
        let storage = SqliteKeyValueStorage::try_new(&self.conn)?;
        let repo = BlobNoteRepository::new(storage, self.config.storage_key.clone());
        let mut store = NoteStore::open(repo);
        Ok(f(&mut store))
    }
}

#[cfg(test)]
mod tests {
    use super::{BootstrapError, CoreRuntime};
    use crate::config::CoreConfig;
    use crate::model::note::{Note, NoteInput};
    use crate::service::note_store::NoteStoreResult;
    use crate::storage::{KeyValueStorage, SqliteKeyValueStorage};

    #[test]
    fn in_memory_runtime_serves_a_working_store() {
        let runtime = CoreRuntime::start(CoreConfig::in_memory()).unwrap();
        let revealed = runtime
            .with_note_store(|store| -> NoteStoreResult<Note> {
                let note = store.save(NoteInput::new("Errands", "body", "k1"))?;
                store.reveal(note.id, "k1")
            })
            .unwrap()
            .unwrap();
        assert_eq!(revealed.decrypted_content, "body");
    }

    #[test]
    fn configured_storage_key_names_the_slot() {
        let config = CoreConfig::from_json(r#"{"storage_key": "vault"}"#).unwrap();
        let runtime = CoreRuntime::start(config).unwrap();
        runtime
            .with_note_store(|store| store.save(NoteInput::new("Keyed", "body", "k1")))
            .unwrap()
            .unwrap();

        let storage = SqliteKeyValueStorage::try_new(&runtime.conn).unwrap();
        assert!(storage.get_item("vault").unwrap().is_some());
        assert!(storage.get_item("notes").unwrap().is_none());
        assert_eq!(runtime.config().storage_key, "vault");
    }

    #[test]
    fn invalid_config_is_rejected_before_opening_storage() {
        let mut config = CoreConfig::in_memory();
        config.storage_key = " ".to_string();
        assert!(matches!(
            CoreRuntime::start(config),
            Err(BootstrapError::Config(_))
        ));
    }
}
