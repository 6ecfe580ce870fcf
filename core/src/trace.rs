//! Evaluation trace types for debugging rule selection.
//!
//! Trace types mirror the runtime types ([`Condition`](crate::Condition),
//! [`RuleSet`](crate::RuleSet)) but capture evaluation results instead of inputs.
//! Use `execute_with_trace()` to see why a particular rule answered.
//!
//! # Two Levels of Trace
//!
//! - [`ConditionTrace`] — Per-condition: which sub-expressions matched?
//! - [`EvalTrace`] — Per-rule-set: which rules were tried, which one answered?
//!
//! # Example
//!
//! ```
//! use verdict::{Error, MappingContext, Outcome, ProblemBuilder, RuleBuilder, RuleSet};
//!
//! let rules = RuleSet::builder()
//!     .rule(RuleBuilder::when_failure().named("any-failure").problem(ProblemBuilder::default()))
//!     .build()
//!     .unwrap();
//!
//! let outcome = Outcome::fail(Error::new("boom"));
//! let trace = rules.execute_with_trace(&MappingContext::new(&outcome).unwrap());
//! assert_eq!(trace.matched_rule(), Some(0));
//! assert_eq!(trace.steps[0].name.as_deref(), Some("any-failure"));
//! ```

use crate::{HttpResponse, MappingError};
use std::fmt;

/// Trace of a condition evaluation.
///
/// Mirrors [`Condition`](crate::Condition) structure but captures results.
///
/// In All/Any, ALL children are evaluated (no short-circuit) for maximum
/// debugging value. The `matched` result is still correct.
pub enum ConditionTrace {
    /// A leaf condition (success, failure, reason match, custom).
    Leaf {
        /// Whether this condition matched.
        matched: bool,
        /// Debug description of the condition.
        condition: String,
    },
    /// ALL: every child must match.
    All {
        /// Whether all children matched.
        matched: bool,
        /// Trace of each child.
        children: Vec<ConditionTrace>,
    },
    /// ANY: some child must match.
    Any {
        /// Whether any child matched.
        matched: bool,
        /// Trace of each child.
        children: Vec<ConditionTrace>,
    },
    /// NOT: inverts inner result.
    Not {
        /// Whether the NOT condition matched (i.e., inner did NOT match).
        matched: bool,
        /// Trace of the inner condition.
        inner: Box<ConditionTrace>,
    },
}

impl ConditionTrace {
    /// Get the overall match result of this condition.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::Leaf { matched, .. }
            | Self::All { matched, .. }
            | Self::Any { matched, .. }
            | Self::Not { matched, .. } => *matched,
        }
    }
}

impl fmt::Debug for ConditionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { matched, condition } => f
                .debug_struct("Leaf")
                .field("matched", matched)
                .field("condition", condition)
                .finish(),
            Self::All { matched, children } => f
                .debug_struct("All")
                .field("matched", matched)
                .field("children", children)
                .finish(),
            Self::Any { matched, children } => f
                .debug_struct("Any")
                .field("matched", matched)
                .field("children", children)
                .finish(),
            Self::Not { matched, inner } => f
                .debug_struct("Not")
                .field("matched", matched)
                .field("inner", inner)
                .finish(),
        }
    }
}

/// Trace of a full [`RuleSet`](crate::RuleSet) execution.
///
/// # INV: `result` == `execute()` result
///
/// The `result` field always equals what [`RuleSet::execute()`](crate::RuleSet::execute)
/// returns for the same context.
pub struct EvalTrace {
    /// The final result (identical to what `execute()` returns).
    pub result: Result<HttpResponse, MappingError>,
    /// One entry per rule tried, in order. Stops after the first match.
    pub steps: Vec<EvalStep>,
    /// Whether the implicit default-success rule answered.
    pub used_default: bool,
}

impl EvalTrace {
    /// Index of the user rule that answered, if one did.
    #[must_use]
    pub fn matched_rule(&self) -> Option<usize> {
        if self.used_default {
            return None;
        }
        self.steps.iter().find(|s| s.matched).map(|s| s.index)
    }
}

impl fmt::Debug for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalTrace")
            .field("result", &self.result)
            .field("steps", &self.steps)
            .field("used_default", &self.used_default)
            .finish()
    }
}

/// One rule's evaluation in a trace.
#[derive(Debug)]
pub struct EvalStep {
    /// Position in the rule set (0-based). The default rule has index `len()`.
    pub index: usize,
    /// Rule name, if one was given.
    pub name: Option<String>,
    /// Did the rule's condition match?
    pub matched: bool,
    /// Full condition evaluation trace.
    pub condition: ConditionTrace,
}
