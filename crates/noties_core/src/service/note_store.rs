//! Note store use-case service.
//!
//! # Responsibility
//! - Own the authoritative in-memory note collection.
//! - Seal bodies before they enter the collection and open them on reveal.
//! - Mirror every mutation to the repository before exposing it.
//!
//! # Invariants
//! - The collection held here never carries plaintext; revealed bodies only
//!   exist on the copies returned by `reveal`.
//! - Note ids are unique within the collection.
//! - Mutations are built on a candidate collection, committed, then
//!   published. A failed commit leaves memory and storage as they were.
//! - `created_at` is written once; every mutation strictly advances
//!   `updated_at`.
//! - A collection that failed to load is never committed over the persisted
//!   blob. Unreadable blobs are preserved before their first overwrite.

use crate::cipher::{self, CipherError};
use crate::model::note::{Note, NoteId, NoteInput, TagSet};
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::service::locale::Locale;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Store-level error surfaced to UI callers.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Passphrase did not open the envelope, or the envelope is damaged.
    WrongKeyOrCorruptData,
    /// Seal/open requested with an empty passphrase.
    EmptyPassphrase,
    /// Operation referenced an id that is not in the collection.
    NotFound(NoteId),
    /// Tag input is blank.
    InvalidTag(String),
    /// Repository rejected the write; nothing was changed.
    PersistenceUnavailable(RepoError),
}

impl NoteStoreError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongKeyOrCorruptData => "wrong_key_or_corrupt_data",
            Self::EmptyPassphrase => "empty_passphrase",
            Self::NotFound(_) => "not_found",
            Self::InvalidTag(_) => "invalid_tag",
            Self::PersistenceUnavailable(_) => "persistence_unavailable",
        }
    }

    /// Message shown to the user in response to the failed action.
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::WrongKeyOrCorruptData, Locale::En) => "Incorrect secret key".to_string(),
            (Self::WrongKeyOrCorruptData, Locale::Es) => "Llave secreta incorrecta".to_string(),
            (Self::EmptyPassphrase, Locale::En) => "A secret key is required".to_string(),
            (Self::EmptyPassphrase, Locale::Es) => "Se requiere una llave secreta".to_string(),
            (Self::NotFound(_), Locale::En) => "This note no longer exists".to_string(),
            (Self::NotFound(_), Locale::Es) => "Esta nota ya no existe".to_string(),
            (Self::InvalidTag(_), Locale::En) => "Tags cannot be empty".to_string(),
            (Self::InvalidTag(_), Locale::Es) => "Las etiquetas no pueden estar vacías".to_string(),
            (Self::PersistenceUnavailable(_), Locale::En) => {
                "Your notes could not be saved to local storage".to_string()
            }
            (Self::PersistenceUnavailable(_), Locale::Es) => {
                "No se pudieron guardar las notas en el almacenamiento local".to_string()
            }
        }
    }
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongKeyOrCorruptData => write!(f, "wrong passphrase or corrupted note content"),
            Self::EmptyPassphrase => write!(f, "passphrase must not be empty"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::PersistenceUnavailable(err) => write!(f, "persistence unavailable: {err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CipherError> for NoteStoreError {
    fn from(value: CipherError) -> Self {
        match value {
            CipherError::EmptyPassphrase => Self::EmptyPassphrase,
            CipherError::WrongKeyOrCorruptData => Self::WrongKeyOrCorruptData,
        }
    }
}

/// Outcome of the most recent load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Loaded,
    /// Storage could not be read; the in-memory collection is a placeholder.
    Unavailable,
    /// The blob exists but does not decode.
    Unreadable,
}

/// Authoritative note collection mirrored to a repository.
pub struct NoteStore<R: NoteRepository> {
    repo: R,
    notes: Vec<Note>,
    load_state: LoadState,
}

impl<R: NoteRepository> NoteStore<R> {
    /// Creates a store and performs the startup load.
    pub fn open(repo: R) -> Self {
        let mut store = Self {
            repo,
            notes: Vec::new(),
            load_state: LoadState::Loaded,
        };
        store.load();
        store
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// Never fails: unavailable storage or an unreadable blob yields an empty
    /// collection. Every returned note is hidden, `updated_at` is raised to at
    /// least `created_at`, and later duplicates of an id are dropped.
    ///
    /// While storage is unavailable every mutation reports
    /// `PersistenceUnavailable` until a later `load` succeeds. An unreadable
    /// blob is copied aside by the repository before the first commit
    /// replaces it.
    pub fn load(&mut self) -> &[Note] {
        let started_at = Instant::now();
        let (mut notes, load_state) = match self.repo.load_notes() {
            Ok(notes) => (notes, LoadState::Loaded),
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=degraded duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                let state = match err {
                    RepoError::InvalidData(_) => LoadState::Unreadable,
                    _ => LoadState::Unavailable,
                };
                (Vec::new(), state)
            }
        };

        let loaded = notes.len();
        let mut seen = HashSet::with_capacity(loaded);
        notes.retain(|note| seen.insert(note.id));
        if notes.len() != loaded {
            warn!(
                "event=notes_load module=store status=repaired dropped_duplicates={}",
                loaded - notes.len()
            );
        }
        for note in &mut notes {
            note.hide();
            note.updated_at = note.updated_at.max(note.created_at);
        }

        info!(
            "event=notes_load module=store status=ok count={} duration_ms={}",
            notes.len(),
            started_at.elapsed().as_millis()
        );
        self.notes = notes;
        self.load_state = load_state;
        &self.notes
    }

    /// Current collection in insertion order. Always hidden.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Seals and stores a note.
    ///
    /// Without `input.id` a new note is appended with
    /// `created_at == updated_at`. With an id, title, content, tags and
    /// importance are replaced and `created_at` is kept.
    ///
    /// # Errors
    /// - `NotFound` when `input.id` is not in the collection.
    /// - `InvalidTag` for blank tags, `EmptyPassphrase` for an empty
    ///   passphrase.
    /// - `PersistenceUnavailable` when the commit fails; nothing changes.
    pub fn save(&mut self, input: NoteInput) -> NoteStoreResult<Note> {
        let started_at = Instant::now();
        let target = input.id;
        let mode = if target.is_some() { "update" } else { "create" };
        let result = self.save_inner(input);
        let note_id = result.as_ref().ok().map(|note| note.id).or(target);
        log_outcome("note_save", mode, started_at, note_id, &result);
        result
    }

    /// Deletes a note. Deleting an unknown id is a no-op.
    ///
    /// # Errors
    /// - `PersistenceUnavailable` when the commit fails; the note stays.
    pub fn remove(&mut self, id: NoteId) -> NoteStoreResult<()> {
        let started_at = Instant::now();
        let Some(index) = self.position(id) else {
            log_outcome("note_remove", "noop", started_at, Some(id), &Ok(()));
            return Ok(());
        };

        let mut next = self.notes.clone();
        next.remove(index);
        let result = self.publish(next);
        log_outcome("note_remove", "delete", started_at, Some(id), &result);
        result
    }

    /// Decrypts a note body into a transient copy.
    ///
    /// On success `updated_at` is refreshed and persisted; the returned copy
    /// carries `decrypted_content`, the stored record does not.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the collection.
    /// - `WrongKeyOrCorruptData` when the envelope does not open; the record
    ///   is left untouched.
    /// - `PersistenceUnavailable` when the timestamp refresh cannot be
    ///   committed; the plaintext is discarded.
    pub fn reveal(&mut self, id: NoteId, passphrase: &str) -> NoteStoreResult<Note> {
        let started_at = Instant::now();
        let result = self.reveal_inner(id, passphrase);
        log_outcome("note_reveal", "open", started_at, Some(id), &result);
        result
    }

    /// Adds one tag. Adding a tag that is already present changes nothing.
    pub fn add_tag(&mut self, id: NoteId, tag: &str) -> NoteStoreResult<Note> {
        let started_at = Instant::now();
        let result = self.retag(id, |tags| {
            tags.insert(tag).map_err(NoteStoreError::InvalidTag)
        });
        log_outcome("note_tag", "add", started_at, Some(id), &result);
        result
    }

    /// Removes one tag. Removing an absent tag changes nothing.
    pub fn remove_tag(&mut self, id: NoteId, tag: &str) -> NoteStoreResult<Note> {
        let started_at = Instant::now();
        let result = self.retag(id, |tags| Ok(tags.remove(tag)));
        log_outcome("note_tag", "remove", started_at, Some(id), &result);
        result
    }

    fn save_inner(&mut self, input: NoteInput) -> NoteStoreResult<Note> {
        let tags = TagSet::from_tags(&input.tags).map_err(NoteStoreError::InvalidTag)?;
        let index = match input.id {
            Some(id) => Some(self.position(id).ok_or(NoteStoreError::NotFound(id))?),
            None => None,
        };
        let envelope = cipher::seal(&input.plaintext_content, &input.passphrase)?;

        let mut next = self.notes.clone();
        let record = match index {
            None => {
                let note = Note::new(input.title, envelope, tags, input.importance);
                next.push(note.clone());
                note
            }
            Some(index) => {
                let note = &mut next[index];
                note.title = input.title;
                note.content = envelope;
                note.tags = tags;
                note.importance = input.importance;
                note.hide();
                note.touch();
                note.clone()
            }
        };

        self.publish(next)?;
        Ok(record)
    }

    fn reveal_inner(&mut self, id: NoteId, passphrase: &str) -> NoteStoreResult<Note> {
        let index = self.position(id).ok_or(NoteStoreError::NotFound(id))?;
        let plaintext = cipher::open(&self.notes[index].content, passphrase)?;

        let mut next = self.notes.clone();
        next[index].touch();
        let mut revealed = next[index].clone();
        self.publish(next)?;

        revealed.decrypted_content = plaintext;
        Ok(revealed)
    }

    fn retag<F>(&mut self, id: NoteId, change: F) -> NoteStoreResult<Note>
    where
        F: FnOnce(&mut TagSet) -> NoteStoreResult<bool>,
    {
        let index = self.position(id).ok_or(NoteStoreError::NotFound(id))?;
        let mut tags = self.notes[index].tags.clone();
        if !change(&mut tags)? {
            return Ok(self.notes[index].clone());
        }

        let mut next = self.notes.clone();
        next[index].tags = tags;
        next[index].touch();
        let updated = next[index].clone();
        self.publish(next)?;
        Ok(updated)
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    fn publish(&mut self, next: Vec<Note>) -> NoteStoreResult<()> {
        match self.load_state {
            LoadState::Loaded => {}
            LoadState::Unavailable => {
                return Err(NoteStoreError::PersistenceUnavailable(RepoError::NotLoaded));
            }
            LoadState::Unreadable => {
                self.repo
                    .preserve_unreadable()
                    .map_err(NoteStoreError::PersistenceUnavailable)?;
                self.load_state = LoadState::Loaded;
            }
        }
        self.repo
            .commit_notes(&next)
            .map_err(NoteStoreError::PersistenceUnavailable)?;
        self.notes = next;
        Ok(())
    }
}

fn log_outcome<T>(
    event: &str,
    mode: &str,
    started_at: Instant,
    note_id: Option<NoteId>,
    result: &NoteStoreResult<T>,
) {
    let note_id = note_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!(
            "event={event} module=store status=ok mode={mode} note_id={note_id} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=store status=error mode={mode} note_id={note_id} duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
}
