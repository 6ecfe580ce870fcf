//! Default message lookup for generated problem text.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Debug;

/// Looks up a message by key.
///
/// Implementations fall back to returning the key itself when nothing is found.
pub trait MessageSource: Send + Sync + Debug {
    /// The message for `key`, or `key` itself.
    fn message<'a>(&'a self, key: &'a str) -> Cow<'a, str>;
}

/// In-memory message table with English defaults.
///
/// | Key                  | Default                                   |
/// |----------------------|-------------------------------------------|
/// | `validation.title`   | `Validation Failed`                       |
/// | `validation.detail`  | `One or more validation errors occurred.` |
///
/// ```
/// use verdict::{MessageSource, Messages};
///
/// let messages = Messages::english().with("validation.title", "Ungültige Eingabe");
/// assert_eq!(messages.message("validation.title"), "Ungültige Eingabe");
/// assert_eq!(messages.message("validation.detail"), "One or more validation errors occurred.");
/// assert_eq!(messages.message("unknown.key"), "unknown.key");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Messages {
    entries: HashMap<String, String>,
}

impl Messages {
    /// Key of the default title of validation problems.
    pub const VALIDATION_TITLE: &'static str = "validation.title";
    /// Key of the default detail of validation problems.
    pub const VALIDATION_DETAIL: &'static str = "validation.detail";

    /// A table with no entries; every lookup returns the key.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in English defaults.
    #[must_use]
    pub fn english() -> Self {
        Self::empty()
            .with(Self::VALIDATION_TITLE, "Validation Failed")
            .with(Self::VALIDATION_DETAIL, "One or more validation errors occurred.")
    }

    /// Add or replace an entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.entries.insert(key.into(), message.into());
        self
    }
}

impl MessageSource for Messages {
    fn message<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        self.entries
            .get(key)
            .map_or(Cow::Borrowed(key), |m| Cow::Borrowed(m.as_str()))
    }
}
