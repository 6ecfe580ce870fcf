//! `StringMatchSpec` — Config-level metadata value match
//!
//! This type represents what the user wrote (e.g., "prefix match on `user.`").
//! It compiles to a runtime [`ValueMatcher`] via [`to_matcher()`](StringMatchSpec::to_matcher).
//!
//! # Naming: Spec vs Matcher
//!
//! - [`StringMatchSpec`] = config-level specification (serializable, inspectable)
//! - [`ValueMatcher`] = runtime engine (what evaluates at match time)

use crate::value_match::check_literal_length;
use crate::{
    ConfigError, ContainsMatcher, ExactMatcher, PrefixMatcher, RegexMatcher, SuffixMatcher,
    ValueMatcher,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A string match specification from user configuration.
///
/// Serialized externally tagged: `{ exact: "E42" }`, `{ regex: "^E\\d+$" }`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use verdict::StringMatchSpec;
///
/// let spec = StringMatchSpec::Prefix("user.".into());
/// let matcher = spec.to_matcher().unwrap();
/// assert!(matcher.matches(&json!("user.email")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatchSpec {
    /// Exact string equality.
    Exact(String),
    /// String starts with prefix.
    Prefix(String),
    /// String ends with suffix.
    Suffix(String),
    /// String contains substring.
    Contains(String),
    /// Regular expression match (Rust `regex` crate syntax, linear time).
    Regex(String),
}

impl StringMatchSpec {
    /// Compile this spec into a runtime [`ValueMatcher`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PatternTooLong`] for oversized patterns and
    /// [`ConfigError::InvalidPattern`] if the regex is invalid.
    pub fn to_matcher(&self) -> Result<Box<dyn ValueMatcher>, ConfigError> {
        match self {
            Self::Exact(v) => {
                check_literal_length(v)?;
                Ok(Box::new(ExactMatcher::new(v.as_str())))
            }
            Self::Prefix(v) => {
                check_literal_length(v)?;
                Ok(Box::new(PrefixMatcher::new(v.as_str())))
            }
            Self::Suffix(v) => {
                check_literal_length(v)?;
                Ok(Box::new(SuffixMatcher::new(v.as_str())))
            }
            Self::Contains(v) => {
                check_literal_length(v)?;
                Ok(Box::new(ContainsMatcher::new(v.as_str())))
            }
            Self::Regex(v) => Ok(Box::new(RegexMatcher::new(v)?)),
        }
    }
}

impl fmt::Display for StringMatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "Exact(\"{v}\")"),
            Self::Prefix(v) => write!(f, "Prefix(\"{v}\")"),
            Self::Suffix(v) => write!(f, "Suffix(\"{v}\")"),
            Self::Contains(v) => write!(f, "Contains(\"{v}\")"),
            Self::Regex(v) => write!(f, "Regex(\"{v}\")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PATTERN_LENGTH;
    use serde_json::json;

    #[test]
    fn exact_compiles() {
        let m = StringMatchSpec::Exact("E42".into()).to_matcher().unwrap();
        assert!(m.matches(&json!("E42")));
        assert!(!m.matches(&json!("E43")));
    }

    #[test]
    fn suffix_compiles() {
        let m = StringMatchSpec::Suffix(".id".into()).to_matcher().unwrap();
        assert!(m.matches(&json!("order.id")));
        assert!(!m.matches(&json!("order.name")));
    }

    #[test]
    fn regex_compiles() {
        let m = StringMatchSpec::Regex(r"^user-\d+$".into()).to_matcher().unwrap();
        assert!(m.matches(&json!("user-123")));
        assert!(!m.matches(&json!("user-abc")));
    }

    #[test]
    fn invalid_regex_returns_error() {
        let err = StringMatchSpec::Regex("[bad".into()).to_matcher().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn literal_too_long_returns_error() {
        let long = "x".repeat(MAX_PATTERN_LENGTH + 1);
        let err = StringMatchSpec::Contains(long).to_matcher().unwrap_err();
        assert!(matches!(err, ConfigError::PatternTooLong { .. }));
    }

    #[test]
    fn deserializes_snake_case_tag() {
        let spec: StringMatchSpec = serde_json::from_value(json!({"prefix": "user."})).unwrap();
        assert_eq!(spec, StringMatchSpec::Prefix("user.".into()));
    }

    #[test]
    fn display() {
        assert_eq!(
            StringMatchSpec::Exact("E42".into()).to_string(),
            r#"Exact("E42")"#
        );
        assert_eq!(
            StringMatchSpec::Regex("^E".into()).to_string(),
            r#"Regex("^E")"#
        );
    }
}
