//! verdict-test: Test domain for conformance testing
//!
//! Provides a small set of domain error kinds and a data description of outcomes, so
//! rule sets can be exercised from YAML fixtures and the command line. This is the
//! reference extension that demonstrates how to add error kinds to verdict.
//!
//! # Example
//!
//! ```
//! use verdict_test::prelude::*;
//!
//! let outcome = OutcomeSpec::failure(vec![
//!     ReasonSpec::new("not_found", "order 7 does not exist").with_metadata("resource", "order"),
//! ]);
//!
//! let rules = RuleSet::builder()
//!     .rule(RuleBuilder::when_error::<NotFoundError>().problem(ProblemBuilder::new(StatusCode::NOT_FOUND)))
//!     .build()
//!     .unwrap();
//!
//! let response = outcome.map_with(&rules).unwrap().unwrap();
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! ```

use serde_json::Value;
use std::any::Any;
use verdict::{
    Error, EvalTrace, FieldErrors, HttpResponse, MappingContext, MappingError, Metadata, Outcome,
    Reason, RuleSet, ValidationError,
};

#[cfg(feature = "fixtures")]
pub mod fixture;

// ═══════════════════════════════════════════════════════════════════════════════
// Error kinds
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! error_kind {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Specialises [`verdict::Error`].
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            error: Error,
        }

        impl $name {
            /// Create the error with the given message.
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    error: Error::new(message),
                }
            }

            /// Add a metadata entry.
            #[must_use]
            pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
                self.error = self.error.with_metadata(key, value);
                self
            }
        }

        impl Reason for $name {
            fn message(&self) -> &str {
                self.error.message()
            }

            fn metadata(&self) -> &Metadata {
                self.error.metadata()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn base(&self) -> Option<&dyn Reason> {
                Some(&self.error)
            }
        }
    };
}

error_kind!(
    /// A requested resource does not exist.
    NotFoundError
);

error_kind!(
    /// The request conflicts with the current state of a resource.
    ConflictError
);

error_kind!(
    /// The caller is not authenticated.
    UnauthorizedError
);

/// Kind names understood by [`ReasonSpec`] (sorted).
pub const KINDS: &[&str] = &["conflict", "error", "not_found", "unauthorized", "validation"];

// ═══════════════════════════════════════════════════════════════════════════════
// Outcome descriptions
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from turning a description into an outcome.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// A reason kind name is not one of [`KINDS`].
    #[error("unknown reason kind \"{kind}\"; expected one of: {}", KINDS.join(", "))]
    UnknownKind {
        /// The rejected name.
        kind: String,
    },

    /// The outcome could not be wrapped in a context.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// One reason, described by kind name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize))]
pub struct ReasonSpec {
    /// Kind name, see [`KINDS`].
    pub kind: String,

    /// Message.
    #[cfg_attr(feature = "fixtures", serde(default))]
    pub message: String,

    /// Metadata entries.
    #[cfg_attr(feature = "fixtures", serde(default))]
    pub metadata: Metadata,

    /// Field errors. Only `validation` reasons carry them.
    #[cfg_attr(feature = "fixtures", serde(default))]
    pub fields: FieldErrors,
}

impl ReasonSpec {
    /// A reason of `kind` with `message`.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a field error.
    #[must_use]
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.fields.entry(field.into()).or_default().push(message.into());
        self
    }

    /// Build the concrete reason.
    ///
    /// # Errors
    ///
    /// [`TestError::UnknownKind`] if `kind` is not one of [`KINDS`].
    pub fn build(&self) -> Result<Box<dyn Reason>, TestError> {
        let message = self.message.as_str();
        let reason: Box<dyn Reason> = match self.kind.as_str() {
            "error" => Box::new(with_metadata(Error::new(message), &self.metadata, Error::with_metadata)),
            "not_found" => Box::new(with_metadata(
                NotFoundError::new(message),
                &self.metadata,
                NotFoundError::with_metadata,
            )),
            "conflict" => Box::new(with_metadata(
                ConflictError::new(message),
                &self.metadata,
                ConflictError::with_metadata,
            )),
            "unauthorized" => Box::new(with_metadata(
                UnauthorizedError::new(message),
                &self.metadata,
                UnauthorizedError::with_metadata,
            )),
            "validation" => {
                let mut error = ValidationError::new(message);
                for (field, messages) in &self.fields {
                    for m in messages {
                        error = error.with_field_error(field.as_str(), m.as_str());
                    }
                }
                Box::new(with_metadata(error, &self.metadata, ValidationError::with_metadata))
            }
            other => {
                return Err(TestError::UnknownKind {
                    kind: other.to_owned(),
                })
            }
        };
        Ok(reason)
    }
}

fn with_metadata<R>(reason: R, metadata: &Metadata, add: fn(R, String, Value) -> R) -> R {
    metadata
        .iter()
        .fold(reason, |reason, (key, value)| add(reason, key.clone(), value.clone()))
}

/// An outcome, described as data.
///
/// Failed when `errors` is non-empty (and `value` is ignored), otherwise a success with
/// the optional `value`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize))]
pub struct OutcomeSpec {
    /// Success value.
    #[cfg_attr(feature = "fixtures", serde(default))]
    pub value: Option<Value>,

    /// Failure reasons, in order.
    #[cfg_attr(feature = "fixtures", serde(default))]
    pub errors: Vec<ReasonSpec>,
}

impl OutcomeSpec {
    /// A success without a value.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// A success carrying `value`.
    #[must_use]
    pub fn ok_with(value: Value) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    /// A failure with the given reasons.
    #[must_use]
    pub fn failure(errors: Vec<ReasonSpec>) -> Self {
        Self {
            value: None,
            errors,
        }
    }

    /// Build the outcome and hand its context to `f`.
    ///
    /// # Errors
    ///
    /// [`TestError::UnknownKind`] for an unknown reason kind, [`TestError::Mapping`] if the
    /// value cannot be serialized.
    pub fn with_context<R>(&self, f: impl FnOnce(&MappingContext<'_>) -> R) -> Result<R, TestError> {
        let mut reasons = self
            .errors
            .iter()
            .map(ReasonSpec::build)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();

        match (reasons.next(), &self.value) {
            (Some(first), _) => {
                let outcome: Outcome = reasons.fold(Outcome::failure_boxed(first), Outcome::with_reason_boxed);
                Ok(f(&MappingContext::new(&outcome)?))
            }
            (None, Some(value)) => {
                let outcome = Outcome::ok_with(value.clone());
                Ok(f(&MappingContext::new(&outcome)?))
            }
            (None, None) => {
                let outcome = Outcome::ok();
                Ok(f(&MappingContext::new(&outcome)?))
            }
        }
    }

    /// Map this outcome with `rules`.
    ///
    /// The outer result reports problems with the description, the inner one the
    /// mapping result.
    ///
    /// # Errors
    ///
    /// See [`with_context`](Self::with_context).
    pub fn map_with(&self, rules: &RuleSet) -> Result<Result<HttpResponse, MappingError>, TestError> {
        self.with_context(|ctx| rules.execute(ctx))
    }

    /// Map this outcome with `rules`, recording a trace.
    ///
    /// # Errors
    ///
    /// See [`with_context`](Self::with_context).
    pub fn trace_with(&self, rules: &RuleSet) -> Result<EvalTrace, TestError> {
        self.with_context(|ctx| rules.execute_with_trace(ctx))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ConflictError, NotFoundError, OutcomeSpec, ReasonSpec, TestError, UnauthorizedError,
        KINDS,
    };
    pub use verdict::prelude::*;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry support (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

/// Register all verdict-test kinds with the given builder.
///
/// Registers the core kinds (`error`, `validation`) and the test-domain kinds:
/// - `not_found` → [`NotFoundError`]
/// - `conflict` → [`ConflictError`]
/// - `unauthorized` → [`UnauthorizedError`]
#[cfg(feature = "registry")]
#[must_use]
pub fn register(builder: verdict::ReasonRegistryBuilder) -> verdict::ReasonRegistryBuilder {
    verdict::register_core_kinds(builder)
        .kind::<NotFoundError>("not_found")
        .kind::<ConflictError>("conflict")
        .kind::<UnauthorizedError>("unauthorized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdict::{ProblemBuilder, RuleBuilder, StatusCode};

    #[test]
    fn test_kinds_specialise_error() {
        let reason: Box<dyn Reason> = Box::new(ConflictError::new("stale").with_metadata("version", 3));
        assert!(reason.is::<ConflictError>());
        assert!(reason.is::<Error>());
        assert!(!reason.is::<NotFoundError>());
        assert!(reason.is_error());
        assert_eq!(reason.metadata()["version"], json!(3));
    }

    #[test]
    fn test_reason_spec_builds_every_kind() {
        for kind in KINDS {
            let reason = ReasonSpec::new(*kind, "m").build().unwrap();
            assert_eq!(reason.message(), "m");
            assert!(reason.is::<Error>());
        }
    }

    #[test]
    fn test_reason_spec_validation_fields() {
        let reason = ReasonSpec::new("validation", "bad")
            .with_field_error("email", "required")
            .with_field_error("email", "invalid")
            .with_metadata("source", "form")
            .build()
            .unwrap();
        let validation = reason.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(validation.errors()["email"], vec!["required", "invalid"]);
        assert_eq!(reason.metadata()["source"], json!("form"));
    }

    #[test]
    fn test_unknown_kind() {
        let err = ReasonSpec::new("teapot", "x").build().unwrap_err();
        assert!(matches!(&err, TestError::UnknownKind { kind } if kind == "teapot"));
        assert!(err.to_string().contains("not_found"));
    }

    #[test]
    fn test_outcome_spec_shapes() {
        let rules = RuleSet::builder()
            .rule(RuleBuilder::when_error::<UnauthorizedError>().problem(ProblemBuilder::new(StatusCode::UNAUTHORIZED)))
            .build()
            .unwrap();

        let empty = OutcomeSpec::ok().map_with(&rules).unwrap().unwrap();
        assert_eq!(empty.status(), StatusCode::NO_CONTENT);

        let valued = OutcomeSpec::ok_with(json!({"id": 1})).map_with(&rules).unwrap().unwrap();
        assert_eq!(valued.status(), StatusCode::OK);

        let denied = OutcomeSpec::failure(vec![ReasonSpec::new("unauthorized", "no token")])
            .map_with(&rules)
            .unwrap()
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let unmatched = OutcomeSpec::failure(vec![ReasonSpec::new("conflict", "x")])
            .map_with(&rules)
            .unwrap();
        assert!(matches!(unmatched, Err(MappingError::NoMatchingRule { .. })));
    }

    #[test]
    fn test_trace_with() {
        let rules = RuleSet::builder().build().unwrap();
        let trace = OutcomeSpec::ok().trace_with(&rules).unwrap();
        assert!(trace.used_default);
    }

    #[cfg(feature = "registry")]
    #[test]
    fn test_register() {
        let registry = register(verdict::ReasonRegistryBuilder::new()).build();
        assert_eq!(registry.names(), KINDS.to_vec());
    }
}
