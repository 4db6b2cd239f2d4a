//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the whole-collection persistence contract for notes.
//! - Isolate blob encoding details from store orchestration.
//!
//! # Invariants
//! - The full collection is the unit of persistence; there are no partial
//!   writes.
//! - Persisted blobs never contain revealed plaintext.

pub mod note_repo;
