//! verdict - Rule engine that turns domain outcomes into HTTP responses
//!
//! Domain code returns an [`Outcome`]: success with an optional value, or failure with one
//! or more [`Reason`]s. It never builds status codes, headers or bodies. A [`RuleSet`],
//! configured once at startup, translates every outcome into an [`HttpResponse`].
//!
//! # Architecture
//!
//! - [`Reason`] / [`Outcome`] — The input: typed reasons carrying a message and metadata
//! - [`MappingContext`] — Read-only view over one outcome, queried by rules
//! - [`Condition`] — Whether a rule applies (success, failure, error kind, metadata, custom)
//! - [`Rule`] — Condition + headers + response contract (mapper, problem details, default success)
//! - [`RuleSet`] — Ordered rules with first-match-wins semantics and an implicit trailing
//!   default-success rule
//! - [`ResultMapper`] — Entry point: `Outcome` in, `HttpResponse` out
//!
//! # Key Invariants
//!
//! 1. **First-match-wins**: rules are evaluated in registration order. A later rule is never
//!    consulted once an earlier rule matched, however specific it is.
//!
//! 2. **Success is total**: the default-success rule always sits last. `Outcome::ok()` maps to
//!    `204 No Content`, `Outcome::ok_with(v)` to `200 OK` with `v` serialized as the body.
//!
//! 3. **Configuration fails at startup**: every builder error surfaces from
//!    [`RuleSetBuilder::build`] as a [`ConfigError`]. Evaluation only fails on rule-authoring
//!    bugs ([`MappingError`]).
//!
//! 4. **Rules are pure**: a rule sees nothing but its [`MappingContext`]. A built `RuleSet` is
//!    immutable and can be shared across threads behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use verdict::prelude::*;
//!
//! let rules = RuleSet::builder()
//!     .rule(
//!         RuleBuilder::when_error_with_metadata::<Error>("missing")
//!             .named("not-found")
//!             .problem(ProblemBuilder::new(StatusCode::NOT_FOUND)),
//!     )
//!     .rule(RuleBuilder::when_failure().problem(ProblemBuilder::default()))
//!     .build()
//!     .unwrap();
//!
//! let mapper = ResultMapper::new(Arc::new(rules));
//!
//! let missing = Outcome::fail(Error::new("user 7 does not exist").with_metadata("missing", "user"));
//! let response = mapper.map(&missing).unwrap();
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! assert_eq!(response.content_type(), Some("application/problem+json"));
//!
//! let empty = mapper.map(&Outcome::ok()).unwrap();
//! assert_eq!(empty.status(), StatusCode::NO_CONTENT);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod builder;
mod condition;
mod context;
mod header;
mod mapper;
mod messages;
mod outcome;
mod problem;
mod reason;
mod response;
mod rule;
mod rule_set;
mod string_match;
mod trace;
mod value_match;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Input model
pub use outcome::Outcome;
pub use reason::{Error, FieldErrors, Metadata, Reason, ReasonKind, SuccessReason, ValidationError};

// Evaluation
pub use context::MappingContext;
pub use mapper::{HttpResultMapper, ResultMapper};
pub use rule::{ExtensionFactory, MapFn, Rule, RuleAction, TextFactory};
pub use rule_set::RuleSet;

// Conditions
pub use condition::{Condition, ContextPredicate, MetadataMatch, ReasonMatch, ReasonPredicate};
pub use string_match::StringMatchSpec;
pub use value_match::{
    value_text, ContainsMatcher, ExactMatcher, FnMatcher, PrefixMatcher, RegexMatcher,
    SuffixMatcher, ValueMatcher,
};

// Response construction
pub use builder::{ProblemBuilder, RuleBuilder, RuleSetBuilder};
pub use header::{HeaderDescriptor, HeaderFactory};
pub use messages::{MessageSource, Messages};
pub use problem::{
    default_title, default_type_uri, ProblemDetails, ProblemSpec, ABOUT_BLANK,
    PROBLEM_CONTENT_TYPE,
};
pub use response::{allows_body, HttpResponse, JSON_CONTENT_TYPE};

// Trace types
pub use trace::{ConditionTrace, EvalStep, EvalTrace};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{
    ConditionConfig, ExtensionConfig, FromSource, HeaderConfig, MetadataMatchConfig,
    ProblemConfig, RespondConfig, RuleConfig, RuleSetConfig, TextConfig, TextSourceConfig,
    ValidationConfig,
};
#[cfg(feature = "registry")]
pub use registry::{register_core_kinds, ReasonRegistry, ReasonRegistryBuilder};

// Re-exported so callers do not need a direct `http` dependency for status codes.
pub use http::StatusCode;

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use verdict::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        ConfigError,
        Condition,
        Error,
        FieldErrors,
        HttpResponse,
        HttpResultMapper,
        MappingContext,
        MappingError,
        Metadata,
        Outcome,
        // Builders
        ProblemBuilder,
        ProblemDetails,
        Reason,
        ReasonKind,
        ResultMapper,
        RuleBuilder,
        RuleSet,
        RuleSetBuilder,
        StatusCode,
        SuccessReason,
        ValidationError,
        // Value matchers
        ValueMatcher,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of user rules in a single [`RuleSet`].
pub const MAX_RULES: usize = 256;

/// Maximum nesting depth of a [`Condition`] built from `All` / `Any` / `Not`.
///
/// Checked when the rule set is built, never during evaluation.
pub const MAX_CONDITION_DEPTH: usize = 32;

/// Maximum length for non-regex metadata match patterns.
pub const MAX_PATTERN_LENGTH: usize = 8192;

/// Maximum length for regex metadata match patterns.
///
/// Shorter than [`MAX_PATTERN_LENGTH`] because regex compilation cost grows faster than
/// literal matching.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule construction and validation.
///
/// All of these are programming mistakes in rule setup. They are reported by
/// [`RuleSetBuilder::build`] (or the registry loader) at startup and must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A rule-local error, labelled with the rule's name or position.
    #[error("rule {rule}: {source}")]
    InRule {
        /// `"name"` if the rule is named, otherwise `#index`.
        rule: String,
        /// The underlying error.
        source: Box<ConfigError>,
    },

    /// A rule was added without a response contract.
    #[error("no response configured; call `map`, `respond` or `problem`")]
    MissingResponse,

    /// A rule was given more than one response contract.
    #[error("response configured twice; `map`, `respond` and `problem` are exclusive")]
    ConflictingResponse,

    /// A header name, metadata key, extension name or rule name is empty.
    #[error("{what} must not be empty")]
    EmptyName {
        /// What was empty (e.g. `"header name"`).
        what: &'static str,
    },

    /// A header name is not a valid HTTP field name.
    #[error("invalid header name \"{name}\"")]
    InvalidHeaderName {
        /// The rejected name.
        name: String,
    },

    /// Two extension members in one problem share a name.
    #[error("duplicate extension member \"{name}\"")]
    DuplicateExtension {
        /// The repeated name.
        name: String,
    },

    /// An extension member collides with a standard or reserved problem member.
    #[error("extension member \"{name}\" is reserved")]
    ReservedExtension {
        /// The reserved name.
        name: String,
    },

    /// A status code outside `100..=999`.
    #[error("invalid status code {status}")]
    InvalidStatus {
        /// The rejected code.
        status: u16,
    },

    /// A metadata match pattern is invalid.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },

    /// A metadata match pattern exceeds the maximum allowed length.
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Condition nesting exceeds [`MAX_CONDITION_DEPTH`].
    #[error("condition nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Actual depth of the condition tree.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// More than [`MAX_RULES`] rules.
    #[error("rule set has {count} rules, but maximum allowed is {max}")]
    TooManyRules {
        /// Actual count of rules.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A reason kind name was not found in the registry.
    #[error("unknown reason kind \"{name}\"{}", format_available(.available))]
    UnknownKind {
        /// The unregistered kind name.
        name: String,
        /// Kind names that ARE registered.
        available: Vec<String>,
    },

    /// Configuration deserialization or construction failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
}

impl ConfigError {
    /// Attach a rule label to this error.
    #[must_use]
    pub fn in_rule(self, rule: impl Into<String>) -> Self {
        Self::InRule {
            rule: rule.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping rule labels.
    #[must_use]
    pub fn root(&self) -> &ConfigError {
        match self {
            Self::InRule { source, .. } => source.root(),
            other => other,
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "; no kinds are registered".to_owned()
    } else {
        format!("; registered: {}", available.join(", "))
    }
}

/// Errors raised while mapping one outcome.
///
/// A correctly configured rule set never produces these. They flag a rule whose
/// condition matched but whose response factories assumed something the outcome does
/// not carry, or a rule set with no rule for the outcome at hand.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Every rule evaluated to false.
    #[error("no rule matched the {outcome} outcome; the rule set is misconfigured")]
    NoMatchingRule {
        /// `"success"` or `"failed"`.
        outcome: &'static str,
    },

    /// `first_reason::<T>()` found nothing.
    #[error("no reason of kind {kind} in the outcome")]
    ReasonNotFound {
        /// Short type name of the requested kind.
        kind: &'static str,
    },

    /// `first_reason_with_metadata::<T>(key)` found nothing.
    #[error("no reason of kind {kind} carries metadata \"{key}\"")]
    ReasonWithMetadataNotFound {
        /// Short type name of the requested kind.
        kind: &'static str,
        /// The metadata key.
        key: String,
    },

    /// Validation metadata is not a field-to-messages map.
    #[error("metadata \"{key}\" is not a map of field names to messages")]
    InvalidValidationMetadata {
        /// The metadata key.
        key: String,
    },

    /// A value or body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
