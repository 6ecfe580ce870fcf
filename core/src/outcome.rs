//! `Outcome` — Domain-level result handed to the mapper
//!
//! Either a success carrying an optional value, or a failure carrying one or more reasons.

use crate::Reason;
use std::fmt;

enum State<T> {
    Success(Option<T>),
    Failure,
}

/// Outcome of a domain operation.
///
/// # INV: Failure is never empty
///
/// A failed outcome is only constructible from a first error, so it always carries at
/// least one reason. Reasons may also be attached to successes; the built-in rules ignore
/// them.
///
/// # Example
///
/// ```
/// use verdict::{Error, Outcome};
///
/// let created = Outcome::ok_with(42);
/// assert!(created.is_success());
/// assert_eq!(created.value(), Some(&42));
///
/// let failed = Outcome::fail(Error::new("boom"));
/// assert!(failed.is_failed());
/// assert_eq!(failed.reasons().len(), 1);
/// ```
pub struct Outcome<T = ()> {
    state: State<T>,
    reasons: Vec<Box<dyn Reason>>,
}

impl Outcome {
    /// A success without a value.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            state: State::Success(None),
            reasons: Vec::new(),
        }
    }

    /// A failure caused by `error`.
    #[must_use]
    pub fn fail(error: impl Reason) -> Self {
        Self::failure(error)
    }
}

impl<T> Outcome<T> {
    /// A success carrying `value`.
    #[must_use]
    pub fn ok_with(value: T) -> Self {
        Self {
            state: State::Success(Some(value)),
            reasons: Vec::new(),
        }
    }

    /// A typed failure caused by `error`.
    ///
    /// Use [`Outcome::fail`] when there is no value type.
    #[must_use]
    pub fn failure(error: impl Reason) -> Self {
        Self {
            state: State::Failure,
            reasons: vec![Box::new(error)],
        }
    }

    /// [`failure`](Self::failure) for an already boxed reason, e.g. one built by kind name.
    #[must_use]
    pub fn failure_boxed(error: Box<dyn Reason>) -> Self {
        Self {
            state: State::Failure,
            reasons: vec![error],
        }
    }

    /// Append a reason (an additional error on failures, a note on successes).
    #[must_use]
    pub fn with_reason(self, reason: impl Reason) -> Self {
        self.with_reason_boxed(Box::new(reason))
    }

    /// [`with_reason`](Self::with_reason) for an already boxed reason.
    #[must_use]
    pub fn with_reason_boxed(mut self, reason: Box<dyn Reason>) -> Self {
        self.reasons.push(reason);
        self
    }

    /// Returns `true` for successes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.state, State::Success(_))
    }

    /// Returns `true` for failures.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.is_success()
    }

    /// The success value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            State::Success(value) => value.as_ref(),
            State::Failure => None,
        }
    }

    /// All reasons in the order they were attached.
    #[must_use]
    pub fn reasons(&self) -> &[Box<dyn Reason>] {
        &self.reasons
    }
}

impl<T, E: Reason> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok_with(value),
            Err(error) => Self::failure(error),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Success(value) => f
                .debug_struct("Success")
                .field("value", value)
                .field("reasons", &self.reasons)
                .finish(),
            State::Failure => f
                .debug_struct("Failure")
                .field("reasons", &self.reasons)
                .finish(),
        }
    }
}
