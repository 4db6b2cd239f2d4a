//! Core domain logic for Noties, a passphrase-encrypted note keeper.
//! This crate is the single source of truth for note invariants.

pub mod bootstrap;
pub mod cipher;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use bootstrap::{BootstrapError, CoreRuntime, SqliteNoteStore};
pub use cipher::{open, seal, CipherError, CipherResult};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Importance, Note, NoteId, NoteInput, TagSet};
pub use repo::note_repo::{
    BlobNoteRepository, NoteRepository, RepoError, RepoResult, DEFAULT_NOTES_KEY,
};
pub use service::locale::Locale;
pub use service::note_store::{NoteStore, NoteStoreError, NoteStoreResult};
pub use service::session::{
    DraftError, Interaction, NoteDraft, RevealPurpose, SessionError, SessionOutcome,
    SessionResult,
};
pub use storage::{
    KeyValueStorage, MemoryKeyValueStorage, SqliteKeyValueStorage, StorageError, StorageResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
