//! `MappingContext` — Read-only view over one outcome
//!
//! Conditions and response factories only ever see a context. It wraps exactly one
//! outcome for one evaluation pass and offers lookups over its reasons and metadata.

use crate::reason::short_type_name;
use crate::{MappingError, Outcome, Reason, ReasonKind};
use serde::Serialize;
use serde_json::Value;

/// Read-only view over one [`Outcome`].
///
/// The success value is serialized to JSON when the context is created, so rules are
/// independent of the outcome's value type.
///
/// # Example
///
/// ```
/// use verdict::{Error, MappingContext, Outcome, Reason};
///
/// let outcome = Outcome::fail(Error::new("locked").with_metadata("retry-after", 30));
/// let ctx = MappingContext::new(&outcome).unwrap();
///
/// assert!(ctx.is_failed());
/// assert!(ctx.has_metadata("retry-after"));
/// assert_eq!(ctx.first_reason::<Error>().unwrap().message(), "locked");
/// ```
#[derive(Debug)]
pub struct MappingContext<'a> {
    success: bool,
    reasons: &'a [Box<dyn Reason>],
    value: Option<Value>,
}

impl<'a> MappingContext<'a> {
    /// Wrap an outcome, serializing its success value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Serialization`] if the value cannot be represented as JSON.
    pub fn new<T: Serialize>(outcome: &'a Outcome<T>) -> Result<Self, MappingError> {
        let value = outcome.value().map(serde_json::to_value).transpose()?;
        Ok(Self {
            success: outcome.is_success(),
            reasons: outcome.reasons(),
            value,
        })
    }

    /// Returns `true` for successful outcomes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns `true` for failed outcomes.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.success
    }

    /// All reasons, in attachment order.
    pub fn reasons(&self) -> impl Iterator<Item = &'a dyn Reason> + 'a {
        self.reasons.iter().map(|r| &**r)
    }

    /// Reasons that are errors, in attachment order.
    pub fn errors(&self) -> impl Iterator<Item = &'a dyn Reason> + 'a {
        self.reasons().filter(|r| r.is_error())
    }

    /// The first reason that is a `T` (or specialises one).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ReasonNotFound`] if no reason is a `T`.
    pub fn first_reason<T: Reason>(&self) -> Result<&'a T, MappingError> {
        self.reasons()
            .find_map(|r| r.downcast_ref::<T>())
            .ok_or(MappingError::ReasonNotFound {
                kind: short_type_name::<T>(),
            })
    }

    /// The first `T` whose metadata contains `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ReasonWithMetadataNotFound`] if there is none.
    pub fn first_reason_with_metadata<T: Reason>(&self, key: &str) -> Result<&'a T, MappingError> {
        self.reasons()
            .filter(|r| r.metadata().contains_key(key))
            .find_map(|r| r.downcast_ref::<T>())
            .ok_or_else(|| MappingError::ReasonWithMetadataNotFound {
                kind: short_type_name::<T>(),
                key: key.to_owned(),
            })
    }

    /// The first reason of an erased kind.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ReasonNotFound`] if no reason is of that kind.
    pub fn first_reason_of(&self, kind: &ReasonKind) -> Result<&'a dyn Reason, MappingError> {
        self.reasons()
            .find(|r| kind.matches(*r))
            .ok_or(MappingError::ReasonNotFound { kind: kind.name() })
    }

    /// Every value stored under `key`, across all reasons, in attachment order.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Vec<&'a Value> {
        self.reasons().filter_map(|r| r.metadata().get(key)).collect()
    }

    /// Returns `true` if any reason carries `key`.
    #[must_use]
    pub fn has_metadata(&self, key: &str) -> bool {
        self.reasons().any(|r| r.metadata().contains_key(key))
    }

    /// The serialized success value, if the outcome carried one.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns `true` if the outcome carried a success value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}
