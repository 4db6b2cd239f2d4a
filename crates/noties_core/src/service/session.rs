//! Passphrase interaction flow.
//!
//! # Responsibility
//! - Model the "select note -> supply passphrase -> reveal/edit" flow as an
//!   explicit state value the UI passes through calls.
//! - Hold creator-side validation for the edit form (`NoteDraft`).
//!
//! # Invariants
//! - `submit` and `cancel` always end in `Interaction::Idle`.
//! - Passphrases are never stored in the interaction state or in drafts
//!   handed back for editing.

use crate::model::note::{Importance, Note, NoteId, NoteInput};
use crate::repo::note_repo::NoteRepository;
use crate::service::locale::Locale;
use crate::service::note_store::{NoteStore, NoteStoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Minimum title length, counted in characters after trimming.
pub const MIN_TITLE_CHARS: usize = 3;

pub type SessionResult<T> = Result<T, SessionError>;

/// Why the passphrase is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPurpose {
    /// Show the plaintext on the note card.
    View,
    /// Open the edit form pre-filled with the plaintext.
    Edit,
}

/// Short-lived UI interaction state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interaction {
    #[default]
    Idle,
    AwaitingPassphrase {
        note_id: NoteId,
        purpose: RevealPurpose,
    },
}

/// Result of a successful passphrase submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Transient copy with `decrypted_content` populated.
    Revealed(Note),
    /// Edit form contents; the passphrase must be entered again to save.
    EditReady(NoteDraft),
}

#[derive(Debug)]
pub enum SessionError {
    /// `submit` was called while no note was waiting for a passphrase.
    NoPendingRequest,
    Store(NoteStoreError),
}

impl SessionError {
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::NoPendingRequest, Locale::En) => {
                "No note is waiting for a secret key".to_string()
            }
            (Self::NoPendingRequest, Locale::Es) => {
                "Ninguna nota está esperando una llave secreta".to_string()
            }
            (Self::Store(err), locale) => err.user_message(locale),
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPendingRequest => write!(f, "no passphrase request is pending"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoPendingRequest => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<NoteStoreError> for SessionError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

impl Interaction {
    /// Starts waiting for a passphrase for `note_id`. A pending request is
    /// replaced.
    pub fn request_passphrase(self, note_id: NoteId, purpose: RevealPurpose) -> Self {
        debug!("event=passphrase_request module=session note_id={note_id} purpose={purpose:?}");
        Self::AwaitingPassphrase { note_id, purpose }
    }

    /// Abandons any pending request.
    pub fn cancel(self) -> Self {
        Self::Idle
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Note currently waiting for a passphrase, if any.
    pub fn pending_note(&self) -> Option<NoteId> {
        match self {
            Self::Idle => None,
            Self::AwaitingPassphrase { note_id, .. } => Some(*note_id),
        }
    }

    /// Consumes the pending request with `passphrase`.
    ///
    /// The returned state is always `Idle`; a failed attempt must be
    /// re-requested, matching the dialog closing after each submit.
    pub fn submit<R: NoteRepository>(
        self,
        store: &mut NoteStore<R>,
        passphrase: &str,
    ) -> (Self, SessionResult<SessionOutcome>) {
        let Self::AwaitingPassphrase { note_id, purpose } = self else {
            return (Self::Idle, Err(SessionError::NoPendingRequest));
        };

        let outcome = store
            .reveal(note_id, passphrase)
            .map_err(SessionError::from)
            .map(|revealed| match purpose {
                RevealPurpose::View => SessionOutcome::Revealed(revealed),
                RevealPurpose::Edit => SessionOutcome::EditReady(NoteDraft::from_revealed(revealed)),
            });
        (Self::Idle, outcome)
    }
}

/// Creator-side validation failure for the note form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    TitleTooShort { min_chars: usize },
    EmptyPassphrase,
    EmptyTag,
}

impl DraftError {
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::TitleTooShort { min_chars }, Locale::En) => {
                format!("The title must have at least {min_chars} characters")
            }
            (Self::TitleTooShort { min_chars }, Locale::Es) => {
                format!("El título debe tener al menos {min_chars} caracteres")
            }
            (Self::EmptyPassphrase, Locale::En) => "A secret key is required".to_string(),
            (Self::EmptyPassphrase, Locale::Es) => "Se requiere una llave secreta".to_string(),
            (Self::EmptyTag, Locale::En) => "Tags cannot be empty".to_string(),
            (Self::EmptyTag, Locale::Es) => "Las etiquetas no pueden estar vacías".to_string(),
        }
    }
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooShort { min_chars } => {
                write!(f, "title must have at least {min_chars} characters")
            }
            Self::EmptyPassphrase => write!(f, "passphrase must not be empty"),
            Self::EmptyTag => write!(f, "tags must not be blank"),
        }
    }
}

impl Error for DraftError {}

/// Edit-form contents before they become a `NoteInput`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub id: Option<NoteId>,
    pub title: String,
    pub content: String,
    pub passphrase: String,
    pub tags: Vec<String>,
    pub importance: Importance,
}

impl NoteDraft {
    /// Empty form for a new note.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the form from a revealed note. The passphrase stays empty.
    pub fn from_revealed(note: Note) -> Self {
        Self {
            id: Some(note.id),
            title: note.title,
            content: note.decrypted_content,
            passphrase: String::new(),
            tags: note.tags.into(),
            importance: note.importance,
        }
    }

    /// Applies the form rules: title length, passphrase and tag presence.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().chars().count() < MIN_TITLE_CHARS {
            return Err(DraftError::TitleTooShort {
                min_chars: MIN_TITLE_CHARS,
            });
        }
        if self.passphrase.is_empty() {
            return Err(DraftError::EmptyPassphrase);
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(DraftError::EmptyTag);
        }
        Ok(())
    }

    /// Validates and converts the draft into a store save request.
    pub fn into_input(self) -> Result<NoteInput, DraftError> {
        self.validate()?;
        Ok(NoteInput {
            id: self.id,
            title: self.title.trim().to_string(),
            plaintext_content: self.content,
            passphrase: self.passphrase,
            tags: self.tags,
            importance: self.importance,
        })
    }
}

impl Debug for NoteDraft {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteDraft")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("content", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("tags", &self.tags)
            .field("importance", &self.importance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{DraftError, Interaction, NoteDraft, RevealPurpose};
    use crate::service::locale::Locale;
    use uuid::Uuid;

    fn draft(title: &str, passphrase: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: "body".to_string(),
            passphrase: passphrase.to_string(),
            ..NoteDraft::new()
        }
    }

    #[test]
    fn title_shorter_than_three_chars_is_rejected() {
        let err = draft(" ab ", "k1").validate().unwrap_err();
        assert_eq!(err, DraftError::TitleTooShort { min_chars: 3 });
        assert_eq!(
            err.user_message(Locale::Es),
            "El título debe tener al menos 3 caracteres"
        );
        assert!(draft("ñño", "k1").validate().is_ok());
    }

    #[test]
    fn draft_requires_passphrase_and_non_blank_tags() {
        assert_eq!(draft("Shopping", "").validate(), Err(DraftError::EmptyPassphrase));

        let mut tagged = draft("Shopping", "k1");
        tagged.tags = vec!["home".to_string(), " ".to_string()];
        assert_eq!(tagged.validate(), Err(DraftError::EmptyTag));
    }

    #[test]
    fn into_input_trims_title_and_keeps_id() {
        let id = Uuid::new_v4();
        let mut form = draft("  Shopping  ", "k1");
        form.id = Some(id);
        let input = form.into_input().unwrap();
        assert_eq!(input.title, "Shopping");
        assert_eq!(input.id, Some(id));
        assert_eq!(input.plaintext_content, "body");
    }

    #[test]
    fn request_then_cancel_returns_to_idle() {
        let id = Uuid::new_v4();
        let state = Interaction::default().request_passphrase(id, RevealPurpose::Edit);
        assert_eq!(state.pending_note(), Some(id));
        assert!(state.cancel().is_idle());
    }
}
