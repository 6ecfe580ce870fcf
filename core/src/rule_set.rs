//! `RuleSet` — Ordered rules with first-match-wins semantics
//!
//! The rule set is the evaluator. It holds the user rules in registration order plus
//! one implicit default-success rule that always sits last.

use crate::{
    EvalStep, EvalTrace, HttpResponse, MappingContext, MappingError, Rule, RuleSetBuilder,
};
use std::fmt;

/// Immutable, ordered rule list.
///
/// # INV: First-match-wins
///
/// Rules are evaluated in registration order. The first matching rule answers, even if
/// a later rule is more specific.
///
/// # INV: Success is total
///
/// The trailing default-success rule matches every success, so only failures can
/// exhaust the list.
///
/// # Example
///
/// ```
/// use verdict::prelude::*;
///
/// let rules = RuleSet::builder()
///     .rule(RuleBuilder::when_error::<Error>().respond(StatusCode::BAD_REQUEST))
///     .rule(RuleBuilder::when_error::<ValidationError>().respond(StatusCode::UNPROCESSABLE_ENTITY))
///     .build()
///     .unwrap();
///
/// // ValidationError is an Error, so the first rule wins.
/// let outcome = Outcome::fail(ValidationError::new("invalid"));
/// let response = rules.execute(&MappingContext::new(&outcome).unwrap()).unwrap();
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```
pub struct RuleSet {
    rules: Vec<Rule>,
    default_rule: Rule,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<Rule>, default_rule: Rule) -> Self {
        Self {
            rules,
            default_rule,
        }
    }

    /// Start configuring a rule set.
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Build the response for one context.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NoMatchingRule`] if no rule matches (only possible for
    /// failures), or the error of the matched rule's response construction.
    pub fn execute(&self, ctx: &MappingContext<'_>) -> Result<HttpResponse, MappingError> {
        for (index, rule) in self.all_rules().enumerate() {
            if rule.matches(ctx) {
                tracing::debug!(rule = index, name = rule.name(), action = rule.action_kind(), "rule matched");
                return rule.respond(ctx);
            }
        }
        Err(self.no_match(ctx))
    }

    /// Execute with full trace for debugging.
    ///
    /// Steps stop after the first match. `result` equals what [`execute`](Self::execute)
    /// returns.
    #[must_use]
    pub fn execute_with_trace(&self, ctx: &MappingContext<'_>) -> EvalTrace {
        let mut steps = Vec::new();
        for (index, rule) in self.all_rules().enumerate() {
            let condition = rule.matches_with_trace(ctx);
            let matched = condition.matched();
            steps.push(EvalStep {
                index,
                name: rule.name().map(str::to_owned),
                matched,
                condition,
            });
            if matched {
                return EvalTrace {
                    result: rule.respond(ctx),
                    steps,
                    used_default: index == self.rules.len(),
                };
            }
        }
        EvalTrace {
            result: Err(self.no_match(ctx)),
            steps,
            used_default: false,
        }
    }

    fn all_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().chain(std::iter::once(&self.default_rule))
    }

    fn no_match(&self, ctx: &MappingContext<'_>) -> MappingError {
        let outcome = if ctx.is_success() { "success" } else { "failed" };
        tracing::error!(rules = self.rules.len(), outcome, "no rule matched");
        MappingError::NoMatchingRule { outcome }
    }

    /// Number of user rules (the default-success rule is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no user rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// User rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The implicit trailing rule.
    #[must_use]
    pub fn default_rule(&self) -> &Rule {
        &self.default_rule
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .field("default_rule", &self.default_rule)
            .finish()
    }
}
