//! `ValueMatcher` — Tests over a single metadata value
//!
//! Metadata values are arbitrary JSON. String matchers compare against the value's text
//! form (see [`value_text`]); [`FnMatcher`] sees the raw value.
//!
//! # Available Matchers
//!
//! - [`ExactMatcher`] — Ordinal string equality
//! - [`PrefixMatcher`] — String prefix match
//! - [`SuffixMatcher`] — String suffix match
//! - [`ContainsMatcher`] — String contains match
//! - [`RegexMatcher`] — Linear-time regular expression
//! - [`FnMatcher`] — Closure over the raw value

use crate::{ConfigError, MAX_PATTERN_LENGTH, MAX_REGEX_PATTERN_LENGTH};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::{self, Debug};

/// Text form of a metadata value.
///
/// Strings are returned as-is, `null` has no text form, everything else is rendered as
/// compact JSON (`42`, `true`, `["a","b"]`).
///
/// ```
/// use serde_json::json;
/// use verdict::value_text;
///
/// assert_eq!(value_text(&json!("E42")).as_deref(), Some("E42"));
/// assert_eq!(value_text(&json!(42)).as_deref(), Some("42"));
/// assert_eq!(value_text(&json!(null)), None);
/// ```
#[must_use]
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Matches a single metadata value.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; they live inside shared rule sets.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use verdict::{ExactMatcher, ValueMatcher};
///
/// let matcher = ExactMatcher::new("E42");
/// assert!(matcher.matches(&json!("E42")));
/// assert!(!matcher.matches(&json!("e42")));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ValueMatcher`",
    label = "this type cannot match metadata values",
    note = "use a built-in matcher (ExactMatcher, RegexMatcher, FnMatcher, ...) or implement `matches(&self, &serde_json::Value) -> bool`"
)]
pub trait ValueMatcher: Send + Sync + Debug {
    /// Check if the given value matches.
    fn matches(&self, value: &Value) -> bool;
}

#[diagnostic::do_not_recommend]
impl ValueMatcher for Box<dyn ValueMatcher> {
    fn matches(&self, value: &Value) -> bool {
        (**self).matches(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// String Matchers
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordinal string equality on the value's text form.
///
/// ```
/// use serde_json::json;
/// use verdict::{ExactMatcher, ValueMatcher};
///
/// let matcher = ExactMatcher::new("404");
/// assert!(matcher.matches(&json!(404)));
/// assert!(matcher.matches(&json!("404")));
/// assert!(!matcher.matches(&json!(null)));
/// ```
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    expected: String,
}

impl ExactMatcher {
    /// Create a new exact matcher with the given expected value.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Returns the expected value.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

impl ValueMatcher for ExactMatcher {
    fn matches(&self, value: &Value) -> bool {
        value_text(value).is_some_and(|s| s == self.expected)
    }
}

/// Prefix match on the value's text form.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the prefix being matched.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ValueMatcher for PrefixMatcher {
    fn matches(&self, value: &Value) -> bool {
        value_text(value).is_some_and(|s| s.starts_with(&self.prefix))
    }
}

/// Suffix match on the value's text form.
#[derive(Debug, Clone)]
pub struct SuffixMatcher {
    suffix: String,
}

impl SuffixMatcher {
    /// Create a new suffix matcher.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Returns the suffix being matched.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl ValueMatcher for SuffixMatcher {
    fn matches(&self, value: &Value) -> bool {
        value_text(value).is_some_and(|s| s.ends_with(&self.suffix))
    }
}

/// Substring match on the value's text form.
#[derive(Debug, Clone)]
pub struct ContainsMatcher {
    substring: String,
}

impl ContainsMatcher {
    /// Create a new contains matcher.
    pub fn new(substring: impl Into<String>) -> Self {
        Self {
            substring: substring.into(),
        }
    }

    /// Returns the substring being searched for.
    #[must_use]
    pub fn substring(&self) -> &str {
        &self.substring
    }
}

impl ValueMatcher for ContainsMatcher {
    fn matches(&self, value: &Value) -> bool {
        value_text(value).is_some_and(|s| s.contains(&self.substring))
    }
}

/// Regular expression match on the value's text form.
///
/// Uses the `regex` crate, which guarantees linear-time matching.
///
/// ```
/// use serde_json::json;
/// use verdict::{RegexMatcher, ValueMatcher};
///
/// let matcher = RegexMatcher::new(r"^E\d+$").unwrap();
/// assert!(matcher.matches(&json!("E42")));
/// assert!(!matcher.matches(&json!("W42")));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: regex::Regex,
}

impl RegexMatcher {
    /// Compile a regex matcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PatternTooLong`] if the pattern exceeds
    /// [`MAX_REGEX_PATTERN_LENGTH`], or [`ConfigError::InvalidPattern`] if it does not compile.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        check_pattern_length(pattern, MAX_REGEX_PATTERN_LENGTH)?;
        regex::Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl ValueMatcher for RegexMatcher {
    fn matches(&self, value: &Value) -> bool {
        value_text(value).is_some_and(|s| self.regex.is_match(&s))
    }
}

pub(crate) fn check_pattern_length(pattern: &str, max: usize) -> Result<(), ConfigError> {
    if pattern.len() > max {
        return Err(ConfigError::PatternTooLong {
            len: pattern.len(),
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_literal_length(pattern: &str) -> Result<(), ConfigError> {
    check_pattern_length(pattern, MAX_PATTERN_LENGTH)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FnMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Closure over the raw metadata value, `null` included.
///
/// ```
/// use serde_json::json;
/// use verdict::{FnMatcher, ValueMatcher};
///
/// let retryable = FnMatcher::new(|v| v.as_u64().is_some_and(|secs| secs < 60));
/// assert!(retryable.matches(&json!(30)));
/// assert!(!retryable.matches(&json!(600)));
/// ```
pub struct FnMatcher {
    test: Box<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl FnMatcher {
    /// Wrap a predicate over the raw value.
    pub fn new(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            test: Box::new(test),
        }
    }
}

impl ValueMatcher for FnMatcher {
    fn matches(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl Debug for FnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMatcher(<fn>)")
    }
}
