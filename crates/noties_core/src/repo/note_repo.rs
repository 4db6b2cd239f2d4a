//! Note collection repository over a key-value slot.
//!
//! # Responsibility
//! - Encode/decode the note collection as one JSON array.
//! - Read and write that array through a `KeyValueStorage` backend.
//!
//! # Invariants
//! - `commit_notes` performs exactly one `set_item` call.
//! - A missing slot is an empty collection, not an error.
//! - Decoded notes always come back hidden.
//! - An unreadable blob is copied to `<key>.unreadable` before it is
//!   replaced.

use crate::model::note::Note;
use crate::storage::{KeyValueStorage, StorageError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key used by the original application.
pub const DEFAULT_NOTES_KEY: &str = "notes";
const UNREADABLE_SUFFIX: &str = ".unreadable";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for blob persistence.
#[derive(Debug)]
pub enum RepoError {
    Storage(StorageError),
    /// Persisted blob exists but cannot be decoded.
    InvalidData(String),
    Serialize(serde_json::Error),
    /// The collection was never read from storage, so it cannot replace it.
    NotLoaded,
}

impl RepoError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(err) => err.code(),
            Self::InvalidData(_) => "invalid_blob",
            Self::Serialize(_) => "serialize_failed",
            Self::NotLoaded => "collection_not_loaded",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted notes blob: {message}"),
            Self::Serialize(err) => write!(f, "failed to encode notes blob: {err}"),
            Self::NotLoaded => write!(
                f,
                "notes were not loaded from storage; reload before writing"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidData(_) | Self::NotLoaded => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Repository interface for whole-collection note persistence.
pub trait NoteRepository {
    /// Loads the persisted collection in stored order.
    fn load_notes(&self) -> RepoResult<Vec<Note>>;
    /// Replaces the persisted collection with `notes`.
    fn commit_notes(&self, notes: &[Note]) -> RepoResult<()>;
    /// Copies a persisted collection that failed to decode somewhere it will
    /// not be overwritten.
    fn preserve_unreadable(&self) -> RepoResult<()>;
}

/// Repository storing the collection as a JSON array under one key.
pub struct BlobNoteRepository<S: KeyValueStorage> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> BlobNoteRepository<S> {
    /// Creates a repository writing under `key`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Creates a repository writing under [`DEFAULT_NOTES_KEY`].
    pub fn with_default_key(storage: S) -> Self {
        Self::new(storage, DEFAULT_NOTES_KEY)
    }

    fn unreadable_key(&self) -> String {
        format!("{}{UNREADABLE_SUFFIX}", self.key)
    }
}

impl<S: KeyValueStorage> NoteRepository for BlobNoteRepository<S> {
    fn load_notes(&self) -> RepoResult<Vec<Note>> {
        let Some(blob) = self.storage.get_item(&self.key)? else {
            return Ok(Vec::new());
        };
        decode_notes(&blob)
    }

    fn commit_notes(&self, notes: &[Note]) -> RepoResult<()> {
        let blob = encode_notes(notes)?;
        self.storage.set_item(&self.key, &blob)?;
        Ok(())
    }

    fn preserve_unreadable(&self) -> RepoResult<()> {
        let Some(blob) = self.storage.get_item(&self.key)? else {
            return Ok(());
        };
        if decode_notes(&blob).is_ok() {
            return Ok(());
        }
        self.storage.set_item(&self.unreadable_key(), &blob)?;
        Ok(())
    }
}

/// Encodes the collection as a JSON array. Plaintext is never included.
pub fn encode_notes(notes: &[Note]) -> RepoResult<String> {
    serde_json::to_string(notes).map_err(RepoError::Serialize)
}

/// Decodes a JSON array blob. `null` and blank blobs decode as empty.
pub fn decode_notes(blob: &str) -> RepoResult<Vec<Note>> {
    let trimmed = blob.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let mut notes: Vec<Note> =
        serde_json::from_str(trimmed).map_err(|err| RepoError::InvalidData(err.to_string()))?;
    for note in &mut notes {
        note.hide();
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{decode_notes, BlobNoteRepository, NoteRepository, RepoError, DEFAULT_NOTES_KEY};
    use crate::model::note::{Importance, Note, TagSet};
    use crate::storage::{KeyValueStorage, MemoryKeyValueStorage};

    #[test]
    fn missing_slot_loads_as_empty() {
        let repo = BlobNoteRepository::with_default_key(MemoryKeyValueStorage::new());
        assert!(repo.load_notes().unwrap().is_empty());
    }

    #[test]
    fn commit_writes_whole_collection_under_key() {
        let storage = MemoryKeyValueStorage::new();
        let repo = BlobNoteRepository::with_default_key(storage.clone());
        let first = Note::new("First", "env-1", TagSet::new(), Importance::Normal);
        let second = Note::new("Second", "env-2", TagSet::new(), Importance::Importante);

        repo.commit_notes(&[first.clone(), second.clone()]).unwrap();

        let blob = storage.get_item(DEFAULT_NOTES_KEY).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(repo.load_notes().unwrap(), vec![first, second]);
    }

    #[test]
    fn legacy_records_load_with_defaults_and_hidden_plaintext() {
        let blob = r#"[{
            "id": "6f1c1f7e-8f2a-4c1b-9a55-0c6f1d2b3a4e",
            "title": "Legacy",
            "content": "U2FsdGVkX1+legacy",
            "decryptedContent": "leaked plaintext"
        }]"#;

        let notes = decode_notes(blob).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].decrypted_content, "");
        assert!(notes[0].tags.is_empty());
        assert_eq!(notes[0].importance, Importance::Normal);
        assert!(notes[0].created_at <= notes[0].updated_at);
    }

    #[test]
    fn unparsable_blob_is_invalid_data() {
        let err = decode_notes("{not json").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
        assert_eq!(err.code(), "invalid_blob");
        assert!(decode_notes("null").unwrap().is_empty());
    }

    #[test]
    fn preserve_unreadable_copies_only_undecodable_blobs() {
        let storage = MemoryKeyValueStorage::new();
        let repo = BlobNoteRepository::new(storage.clone(), "vault");

        repo.commit_notes(&[]).unwrap();
        repo.preserve_unreadable().unwrap();
        assert_eq!(storage.get_item("vault.unreadable").unwrap(), None);

        storage.set_item("vault", "[{\"tags\": null}]").unwrap();
        repo.preserve_unreadable().unwrap();
        assert_eq!(
            storage.get_item("vault.unreadable").unwrap().as_deref(),
            Some("[{\"tags\": null}]")
        );
    }
}
