//! Entry point: `Outcome` in, `HttpResponse` out.

use crate::{HttpResponse, MappingContext, MappingError, Outcome, RuleSet};
use serde::Serialize;
use std::sync::Arc;

/// Maps outcomes to responses.
///
/// Implementors provide [`map_context`](Self::map_context); [`map`](Self::map) wraps an
/// outcome in a [`MappingContext`] first. The trait stays object-safe, so
/// `Arc<dyn HttpResultMapper>` works as an injected dependency.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `HttpResultMapper`",
    note = "wrap a `RuleSet` in `verdict::ResultMapper`"
)]
pub trait HttpResultMapper: Send + Sync {
    /// Map an already-built context.
    ///
    /// # Errors
    ///
    /// See [`RuleSet::execute`].
    fn map_context(&self, ctx: &MappingContext<'_>) -> Result<HttpResponse, MappingError>;

    /// Map an outcome.
    ///
    /// # Errors
    ///
    /// [`MappingError::Serialization`] if the success value cannot be serialized, otherwise
    /// see [`RuleSet::execute`].
    fn map<T: Serialize>(&self, outcome: &Outcome<T>) -> Result<HttpResponse, MappingError>
    where
        Self: Sized,
    {
        self.map_context(&MappingContext::new(outcome)?)
    }
}

/// The standard mapper: evaluates a shared [`RuleSet`].
///
/// Cloning is cheap; clones share the rule set.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use verdict::prelude::*;
///
/// let mapper = ResultMapper::new(Arc::new(RuleSet::builder().build().unwrap()));
/// let response = mapper.map(&Outcome::ok_with(vec!["a", "b"])).unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// ```
#[derive(Debug, Clone)]
pub struct ResultMapper {
    rules: Arc<RuleSet>,
}

impl ResultMapper {
    /// Wrap a rule set.
    #[must_use]
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// The rule set in use.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl HttpResultMapper for ResultMapper {
    fn map_context(&self, ctx: &MappingContext<'_>) -> Result<HttpResponse, MappingError> {
        self.rules.execute(ctx)
    }
}
