//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate cipher and repository calls into note use-cases.
//! - Keep UI layers decoupled from storage and envelope details.

pub mod locale;
pub mod note_store;
pub mod session;
