//! Configuration types for loading rule sets from data.
//!
//! These types deserialize from JSON or YAML (through `serde_json::Value`) and are
//! compiled into runtime types by [`ReasonRegistry::load_rule_set`](crate::ReasonRegistry::load_rule_set).
//!
//! | Config Type | Runtime Type | Loader |
//! |-------------|-------------|--------|
//! | `RuleSetConfig` | `RuleSet` | `ReasonRegistry::load_rule_set()` |
//! | `RuleConfig` | `Rule` | (via rule set) |
//! | `ConditionConfig` | `Condition` | (via rule) |
//! | `ProblemConfig` | `ProblemSpec` | (via rule) |
//! | `HeaderConfig` | `HeaderDescriptor` | (via rule) |
//!
//! # Example
//!
//! ```yaml
//! rules:
//!   - name: not-found
//!     when:
//!       type: error
//!       kind: not_found
//!     headers:
//!       - name: X-Resource
//!         value: { from: metadata, key: resource }
//!     problem:
//!       status: 404
//!       detail: { from: message }
//!   - when: { type: failure }
//!     problem: {}
//! ```

use crate::StringMatchSpec;
use serde::Deserialize;
use serde_json::Value;

/// An ordered rule list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Content type of serialized success values. Defaults to JSON.
    #[serde(default)]
    pub success_content_type: Option<String>,
}

/// One rule: a condition, headers and exactly one of `problem` / `respond`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Optional rule name, shown in traces and errors.
    #[serde(default)]
    pub name: Option<String>,

    /// When the rule applies.
    pub when: ConditionConfig,

    /// Headers added when the rule matches.
    #[serde(default)]
    pub headers: Vec<HeaderConfig>,

    /// Respond with problem details.
    #[serde(default)]
    pub problem: Option<ProblemConfig>,

    /// Respond with a bare status.
    #[serde(default)]
    pub respond: Option<RespondConfig>,
}

/// Condition configuration, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ConditionConfig {
    /// The outcome succeeded.
    #[serde(rename = "success")]
    Success,

    /// The outcome failed.
    #[serde(rename = "failure")]
    Failure,

    /// The outcome failed with a reason of `kind` (any kind if absent), optionally
    /// carrying matching metadata.
    #[serde(rename = "error")]
    Error {
        /// Registered reason kind name.
        #[serde(default)]
        kind: Option<String>,
        /// Metadata the reason must carry.
        #[serde(default)]
        metadata: Option<MetadataMatchConfig>,
    },

    /// All conditions must match.
    #[serde(rename = "and")]
    And {
        /// Child conditions.
        conditions: Vec<ConditionConfig>,
    },

    /// Any condition must match.
    #[serde(rename = "or")]
    Or {
        /// Child conditions.
        conditions: Vec<ConditionConfig>,
    },

    /// The condition must not match.
    #[serde(rename = "not")]
    Not {
        /// Negated condition.
        condition: Box<ConditionConfig>,
    },
}

/// A metadata key, and optionally a test on its value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataMatchConfig {
    /// Metadata key that must be present.
    pub key: String,

    /// Test on the value's text form.
    #[serde(default)]
    pub value: Option<StringMatchSpec>,
}

/// Problem details response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemConfig {
    /// HTTP status. Defaults to 500 (400 for validation problems).
    #[serde(default)]
    pub status: Option<u16>,

    /// Problem type URI. Derived from the status when absent.
    #[serde(default, rename = "type")]
    pub problem_type: Option<String>,

    /// Title text.
    #[serde(default)]
    pub title: Option<TextConfig>,

    /// Detail text.
    #[serde(default)]
    pub detail: Option<TextConfig>,

    /// Extension members, in output order.
    #[serde(default)]
    pub extensions: Vec<ExtensionConfig>,

    /// Turns this into a validation problem.
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
}

/// Bare status response. Carries the success value as JSON when there is one.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespondConfig {
    /// HTTP status.
    pub status: u16,
}

/// A response header.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    /// Header name, kept verbatim.
    pub name: String,

    /// Header value.
    pub value: TextConfig,
}

/// A problem extension member.
///
/// Exactly one of `value` (a literal) and `from` (read from the outcome) must be set.
/// A `from` source that finds nothing yields `null`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Member name.
    pub name: String,

    /// Literal member value.
    #[serde(default)]
    pub value: Option<Value>,

    /// Member value read from the outcome. Metadata is copied as-is, not stringified.
    #[serde(default)]
    pub from: Option<TextSourceConfig>,
}

/// Text: a literal or a value read from the outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextConfig {
    /// Fixed text.
    Literal(String),

    /// Text read from the first qualifying reason.
    Source(TextSourceConfig),
}

/// Reads text from the first reason that is of `kind` (any kind if absent) and, when
/// `key` is set, carries metadata `key`.
///
/// Finding nothing omits the header or text member.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextSourceConfig {
    /// What to read.
    pub from: FromSource,

    /// Metadata key. Required for `from: metadata`.
    #[serde(default)]
    pub key: Option<String>,

    /// Registered reason kind name.
    #[serde(default)]
    pub kind: Option<String>,
}

/// What a [`TextSourceConfig`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FromSource {
    /// The reason's message.
    Message,

    /// A metadata value; strings as-is, other values as JSON text.
    Metadata,
}

/// Where validation field errors come from.
///
/// `typed` in config reads the first `ValidationError`; `{ metadata: key }` reads a
/// field-to-messages map from the first reason carrying `key`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationConfig {
    /// Field errors of the first `ValidationError`.
    Typed,

    /// Field errors stored in metadata under this key.
    Metadata(String),
}
