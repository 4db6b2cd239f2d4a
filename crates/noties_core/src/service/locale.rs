//! User-facing message locales.
//!
//! Error types render their own text; this module only names the supported
//! languages.

/// Language used for user-facing failure messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    /// Spanish, the language of the original interface.
    Es,
}
