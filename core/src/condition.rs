//! Condition — Whether a rule applies
//!
//! Leaf conditions test the outcome state, its reasons, or call a custom closure.
//! They compose with All/Any/Not.

use crate::{ConditionTrace, MappingContext, Reason, ReasonKind, ValueMatcher};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Closure over a whole context.
pub type ContextPredicate = Arc<dyn Fn(&MappingContext<'_>) -> bool + Send + Sync>;

/// Closure over one reason.
pub type ReasonPredicate = Arc<dyn Fn(&dyn Reason) -> bool + Send + Sync>;

/// Requirement on a reason's metadata: a key, optionally with a value test.
#[derive(Clone)]
pub struct MetadataMatch {
    key: String,
    value: Option<Arc<dyn ValueMatcher>>,
}

impl MetadataMatch {
    /// Require `key` to be present, whatever its value.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Require `key` to be present with a value accepted by `matcher`.
    pub fn value(key: impl Into<String>, matcher: impl ValueMatcher + 'static) -> Self {
        Self {
            key: key.into(),
            value: Some(Arc::new(matcher)),
        }
    }

    /// The metadata key.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key
    }

    /// Check one reason.
    #[must_use]
    pub fn matches(&self, reason: &dyn Reason) -> bool {
        match reason.metadata().get(&self.key) {
            None => false,
            Some(value) => self.value.as_ref().is_none_or(|m| m.matches(value)),
        }
    }
}

impl Debug for MetadataMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MetadataMatch");
        s.field("key", &self.key);
        if let Some(value) = &self.value {
            s.field("value", value);
        }
        s.finish()
    }
}

/// Requirement on a single reason.
///
/// Every part that is set must hold for the same reason.
#[derive(Clone, Default)]
pub struct ReasonMatch {
    kind: Option<ReasonKind>,
    metadata: Option<MetadataMatch>,
    filter: Option<ReasonPredicate>,
}

impl ReasonMatch {
    /// Match any reason.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match reasons of kind `T` (including kinds that specialise `T`).
    #[must_use]
    pub fn of<T: Reason>() -> Self {
        Self::kind(ReasonKind::of::<T>())
    }

    /// Match reasons of an erased kind.
    #[must_use]
    pub fn kind(kind: ReasonKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Additionally require metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataMatch) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Additionally require a closure over the reason.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&dyn Reason) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// The required kind, if any.
    #[must_use]
    pub fn reason_kind(&self) -> Option<&ReasonKind> {
        self.kind.as_ref()
    }

    /// The metadata requirement, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&MetadataMatch> {
        self.metadata.as_ref()
    }

    /// Check one reason.
    #[must_use]
    pub fn matches(&self, reason: &dyn Reason) -> bool {
        self.kind.as_ref().is_none_or(|k| k.matches(reason))
            && self.metadata.as_ref().is_none_or(|m| m.matches(reason))
            && self.filter.as_ref().is_none_or(|f| f(reason))
    }
}

impl Debug for ReasonMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ReasonMatch");
        if let Some(kind) = &self.kind {
            s.field("kind", &kind.name());
        }
        if let Some(metadata) = &self.metadata {
            s.field("metadata", metadata);
        }
        if self.filter.is_some() {
            s.field("filter", &"<fn>");
        }
        s.finish()
    }
}

/// Whether a rule applies to a context.
///
/// # INV: Reason conditions imply failure
///
/// [`Condition::Reason`] only holds for failed outcomes, even though successes may carry
/// reasons too.
///
/// # Example
///
/// ```
/// use verdict::{Condition, Error, MappingContext, MetadataMatch, Outcome, ReasonMatch};
///
/// let condition = Condition::All(vec![
///     Condition::Reason(ReasonMatch::of::<Error>()),
///     Condition::Not(Box::new(Condition::Reason(
///         ReasonMatch::any().with_metadata(MetadataMatch::key("internal")),
///     ))),
/// ]);
///
/// let outcome = Outcome::fail(Error::new("boom"));
/// assert!(condition.evaluate(&MappingContext::new(&outcome).unwrap()));
/// ```
#[derive(Clone)]
pub enum Condition {
    /// The outcome is a success.
    Success,

    /// The outcome is a failure.
    Failure,

    /// The outcome is a failure and at least one reason satisfies the match.
    Reason(ReasonMatch),

    /// Arbitrary closure over the context.
    Custom(ContextPredicate),

    /// Every condition must hold. Empty is `true`.
    All(Vec<Condition>),

    /// Some condition must hold. Empty is `false`.
    Any(Vec<Condition>),

    /// Inverts the inner condition.
    Not(Box<Condition>),
}

impl Condition {
    /// Wrap a closure as a [`Condition::Custom`].
    pub fn custom(f: impl Fn(&MappingContext<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate this condition against the given context.
    ///
    /// Recursive; nesting depth is bounded by [`MAX_CONDITION_DEPTH`](crate::MAX_CONDITION_DEPTH)
    /// when the rule set is built.
    pub fn evaluate(&self, ctx: &MappingContext<'_>) -> bool {
        match self {
            Self::Success => ctx.is_success(),
            Self::Failure => ctx.is_failed(),
            Self::Reason(m) => ctx.is_failed() && ctx.reasons().any(|r| m.matches(r)),
            Self::Custom(f) => f(ctx),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Not(c) => !c.evaluate(ctx),
        }
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Unlike [`evaluate()`](Self::evaluate), this does NOT short-circuit All/Any.
    #[must_use]
    pub fn evaluate_with_trace(&self, ctx: &MappingContext<'_>) -> ConditionTrace {
        match self {
            Self::All(conditions) => {
                let children: Vec<ConditionTrace> =
                    conditions.iter().map(|c| c.evaluate_with_trace(ctx)).collect();
                let matched = children.iter().all(ConditionTrace::matched);
                ConditionTrace::All { matched, children }
            }
            Self::Any(conditions) => {
                let children: Vec<ConditionTrace> =
                    conditions.iter().map(|c| c.evaluate_with_trace(ctx)).collect();
                let matched = children.iter().any(ConditionTrace::matched);
                ConditionTrace::Any { matched, children }
            }
            Self::Not(c) => {
                let inner = c.evaluate_with_trace(ctx);
                ConditionTrace::Not {
                    matched: !inner.matched(),
                    inner: Box::new(inner),
                }
            }
            leaf => ConditionTrace::Leaf {
                matched: leaf.evaluate(ctx),
                condition: format!("{leaf:?}"),
            },
        }
    }

    /// Depth of this condition tree. Leaves have depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::All(cs) | Self::Any(cs) => 1 + cs.iter().map(Condition::depth).max().unwrap_or(0),
            Self::Not(c) => 1 + c.depth(),
            _ => 1,
        }
    }
}

impl Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failure => f.write_str("Failure"),
            Self::Reason(m) => f.debug_tuple("Reason").field(m).finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
            Self::All(cs) => f.debug_tuple("All").field(cs).finish(),
            Self::Any(cs) => f.debug_tuple("Any").field(cs).finish(),
            Self::Not(c) => f.debug_tuple("Not").field(c).finish(),
        }
    }
}
