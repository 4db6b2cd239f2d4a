//! Domain model for encrypted notes.
//!
//! # Responsibility
//! - Define the persisted note record and its value types.
//! - Keep tag normalization and timestamp rules next to the data they guard.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Note bodies are held as ciphertext; plaintext only lives in the
//!   transient `decrypted_content` field.

pub mod note;
