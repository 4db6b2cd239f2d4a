//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record persisted in the local storage blob.
//! - Normalize and deduplicate tag labels.
//! - Provide the clock rules for `created_at` / `updated_at`.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `content` is always an envelope produced by `cipher::seal`.
//! - `decrypted_content` is never serialized.
//! - `created_at <= updated_at`, and every refresh strictly advances
//!   `updated_at`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier for every note.
pub type NoteId = Uuid;

/// Importance flag shown next to a note.
///
/// Serialized with the labels used by the original storage format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Normal,
    Importante,
}

/// Ordered, duplicate-free set of normalized tag labels.
///
/// Insertion order is preserved. Deserialization normalizes persisted values
/// and silently drops blanks and duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw labels.
    ///
    /// # Errors
    /// - Returns the offending raw value when a label is blank.
    pub fn from_tags<I, S>(tags: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref())?;
        }
        Ok(set)
    }

    /// Inserts one label. Returns `Ok(true)` when the set changed.
    ///
    /// # Errors
    /// - Returns the raw value when it is blank after trimming.
    pub fn insert(&mut self, tag: &str) -> Result<bool, String> {
        let normalized = normalize_tag(tag).ok_or_else(|| tag.to_string())?;
        if self.0.contains(&normalized) {
            return Ok(false);
        }
        self.0.push(normalized);
        Ok(true)
    }

    /// Removes one label (matched after normalization). Returns whether it
    /// was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let Some(normalized) = normalize_tag(tag) else {
            return false;
        };
        let before = self.0.len();
        self.0.retain(|value| *value != normalized);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TagSet {
    fn from(value: Vec<String>) -> Self {
        let mut set = Self::new();
        for tag in &value {
            let _ = set.insert(tag);
        }
        set
    }
}

impl From<TagSet> for Vec<String> {
    fn from(value: TagSet) -> Self {
        value.0
    }
}

/// Canonical note record.
///
/// Field names follow the camelCase layout of the persisted JSON array.
/// Records written before tags/importance/timestamps existed still load, with
/// those fields defaulted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable identity, generated on first save.
    pub id: NoteId,
    /// Short display title. Length rules are enforced by the creator.
    pub title: String,
    /// Ciphertext envelope of the last saved body.
    pub content: String,
    /// Plaintext body, populated only on copies returned by a reveal.
    #[serde(default, skip_serializing)]
    pub decrypted_content: String,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub importance: Importance,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    /// Creates a new note with a generated id and `created_at == updated_at`.
    pub fn new(
        title: impl Into<String>,
        envelope: impl Into<String>,
        tags: TagSet,
        importance: Importance,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: envelope.into(),
            decrypted_content: String::new(),
            tags,
            importance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether plaintext is currently attached to this value.
    pub fn is_revealed(&self) -> bool {
        !self.decrypted_content.is_empty()
    }

    /// Drops any attached plaintext.
    pub fn hide(&mut self) {
        self.decrypted_content.clear();
    }

    /// Advances `updated_at`, keeping it strictly increasing and never below
    /// `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = next_update_timestamp(self.created_at.max(self.updated_at));
    }
}

// Plaintext stays out of debug output; logs and panics format notes with `{:?}`.
impl Debug for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("content_len", &self.content.len())
            .field("revealed", &self.is_revealed())
            .field("tags", &self.tags)
            .field("importance", &self.importance)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Save request accepted by the note store.
///
/// `id == None` creates a note; `Some(id)` replaces an existing one.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NoteInput {
    pub id: Option<NoteId>,
    pub title: String,
    pub plaintext_content: String,
    pub passphrase: String,
    pub tags: Vec<String>,
    pub importance: Importance,
}

impl NoteInput {
    /// Creates an input for a brand new note.
    pub fn new(
        title: impl Into<String>,
        plaintext_content: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            plaintext_content: plaintext_content.into(),
            passphrase: passphrase.into(),
            tags: Vec::new(),
            importance: Importance::Normal,
        }
    }

    /// Targets an existing note instead of creating one.
    pub fn for_note(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }
}

impl Debug for NoteInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteInput")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("plaintext_content", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("tags", &self.tags)
            .field("importance", &self.importance)
            .finish()
    }
}

/// Normalizes one tag label: trimmed, inner whitespace collapsed, lowercase.
///
/// Returns `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(tag.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.to_lowercase())
    }
}

/// Current wall-clock time in unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Returns a timestamp strictly greater than `previous`, preferring the
/// wall clock when it is already ahead.
pub fn next_update_timestamp(previous: i64) -> i64 {
    now_epoch_ms().max(previous.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::{next_update_timestamp, normalize_tag, Importance, Note, NoteInput, TagSet};

    #[test]
    fn normalize_tag_trims_collapses_and_lowercases() {
        assert_eq!(normalize_tag("  Work   Items "), Some("work items".to_string()));
        assert_eq!(normalize_tag(" \t "), None);
    }

    #[test]
    fn tag_set_keeps_insertion_order_and_rejects_duplicates() {
        let mut tags = TagSet::from_tags(["Work", "home"]).unwrap();
        assert!(!tags.insert("WORK").unwrap());
        assert!(tags.insert("urgent").unwrap());
        assert_eq!(tags.as_slice(), ["work", "home", "urgent"]);
    }

    #[test]
    fn tag_set_rejects_blank_labels() {
        let err = TagSet::from_tags(["ok", "   "]).unwrap_err();
        assert_eq!(err, "   ");
    }

    #[test]
    fn tag_set_deserialization_drops_blanks_and_duplicates() {
        let tags: TagSet = serde_json::from_str(r#"["A", "a", " ", "b"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["a", "b"]);
    }

    #[test]
    fn importance_uses_original_labels() {
        assert_eq!(
            serde_json::to_string(&Importance::Importante).unwrap(),
            "\"importante\""
        );
        let parsed: Importance = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(parsed, Importance::Normal);
    }

    #[test]
    fn serialized_note_never_carries_plaintext() {
        let mut note = Note::new("Shopping", "U2FsdGVkX1-envelope", TagSet::new(), Importance::Normal);
        note.decrypted_content = "milk eggs bread".to_string();

        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("decryptedContent"));
        assert!(!json.contains("milk"));
        assert!(json.contains("createdAt"));
    }

    #[test]
    fn touch_strictly_advances_updated_at() {
        let mut note = Note::new("Shopping", "envelope", TagSet::new(), Importance::Normal);
        let before = note.updated_at;
        note.touch();
        assert!(note.updated_at > before);
        assert!(note.created_at <= note.updated_at);
        assert!(next_update_timestamp(i64::MAX - 1) == i64::MAX);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let input = NoteInput::new("Shopping", "milk eggs bread", "k1");
        let rendered = format!("{input:?}");
        assert!(!rendered.contains("milk"));
        assert!(!rendered.contains("k1"));
    }
}
