//! `Reason` — Messages and metadata attached to an outcome
//!
//! A reason is a message plus a metadata bag. Errors are reasons used for failure dispatch:
//! rules match them by their concrete Rust type.
//!
//! # Subtypes by composition
//!
//! A specialised error embeds its base error and returns it from [`Reason::base`].
//! [`downcast_ref`](trait.Reason.html#method.downcast_ref) walks that chain, so a rule
//! for [`Error`] also matches every error built on top of it.
//!
//! ```
//! use std::any::Any;
//! use verdict::{Error, Metadata, Reason};
//!
//! #[derive(Debug)]
//! struct NotFound {
//!     error: Error,
//! }
//!
//! impl Reason for NotFound {
//!     fn message(&self) -> &str { self.error.message() }
//!     fn metadata(&self) -> &Metadata { self.error.metadata() }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn base(&self) -> Option<&dyn Reason> { Some(&self.error) }
//! }
//!
//! let reason: Box<dyn Reason> = Box::new(NotFound { error: Error::new("gone") });
//! assert!(reason.is::<NotFound>());
//! assert!(reason.is::<Error>());
//! assert!(reason.is_error());
//! ```

use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};

/// Metadata bag attached to a reason. Keys are unique and iterate in sorted order.
pub type Metadata = BTreeMap<String, Value>;

/// Field name to validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A message plus metadata attached to an [`Outcome`](crate::Outcome).
///
/// Reasons are created by domain code and never change once attached.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so that outcomes can cross threads and rule sets
/// can be evaluated concurrently.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Reason`",
    label = "this type cannot be attached to an Outcome",
    note = "embed a `verdict::Error` and return it from `base()` to make a new error kind"
)]
pub trait Reason: Any + Send + Sync + Debug + 'static {
    /// Human-readable message.
    fn message(&self) -> &str;

    /// Metadata bag.
    fn metadata(&self) -> &Metadata;

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The reason this one specialises, if any.
    fn base(&self) -> Option<&dyn Reason> {
        None
    }

    /// Whether this reason is an error.
    ///
    /// Defaults to asking the base reason, so specialised errors are errors.
    fn is_error(&self) -> bool {
        self.base().is_some_and(|base| base.is_error())
    }
}

impl dyn Reason {
    /// Downcast to `T`, walking the [`base`](Reason::base) chain.
    #[must_use]
    pub fn downcast_ref<T: Reason>(&self) -> Option<&T> {
        let mut current: Option<&dyn Reason> = Some(self);
        while let Some(reason) = current {
            if let Some(found) = reason.as_any().downcast_ref::<T>() {
                return Some(found);
            }
            current = reason.base();
        }
        None
    }

    /// Returns `true` if this reason is a `T` or specialises one.
    #[must_use]
    pub fn is<T: Reason>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ReasonKind
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-erased reason type identity.
///
/// Lets the registry and config loader refer to reason types by value.
#[derive(Clone, Copy)]
pub struct ReasonKind {
    name: &'static str,
    test: fn(&dyn Reason) -> bool,
}

impl ReasonKind {
    /// The kind for reason type `T` (matches `T` and anything specialising it).
    #[must_use]
    pub fn of<T: Reason>() -> Self {
        Self {
            name: short_type_name::<T>(),
            test: is_kind::<T>,
        }
    }

    /// Short type name, e.g. `"ValidationError"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if `reason` is of this kind.
    #[must_use]
    pub fn matches(&self, reason: &dyn Reason) -> bool {
        (self.test)(reason)
    }
}

impl Debug for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReasonKind").field(&self.name).finish()
    }
}

fn is_kind<T: Reason>(reason: &dyn Reason) -> bool {
    reason.is::<T>()
}

/// Last path segment of `T`'s type name.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Built-in reasons
// ═══════════════════════════════════════════════════════════════════════════════

/// The base error.
///
/// Use directly for untyped failures, or embed it in a specialised error type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Error {
    message: String,
    metadata: Metadata,
}

impl Error {
    /// Create an error with the given message and no metadata.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry (replaces an existing entry with the same key).
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Reason for Error {
    fn message(&self) -> &str {
        &self.message
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_error(&self) -> bool {
        true
    }
}

/// A non-error reason, e.g. a note attached to a successful outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessReason {
    message: String,
    metadata: Metadata,
}

impl SuccessReason {
    /// Create a success reason with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Reason for SuccessReason {
    fn message(&self) -> &str {
        &self.message
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A validation failure with per-field messages.
///
/// Specialises [`Error`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    error: Error,
    errors: FieldErrors,
}

impl ValidationError {
    /// Create a validation error with no field errors yet.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Error::new(message),
            errors: FieldErrors::new(),
        }
    }

    /// Append a message for `field`.
    #[must_use]
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.entry(field.into()).or_default().push(message.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.error = self.error.with_metadata(key, value);
        self
    }

    /// Field errors collected so far.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }
}

impl Reason for ValidationError {
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
