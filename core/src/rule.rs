//! `Rule` — Condition + headers + response contract
//!
//! A rule binds a [`Condition`] to what the response looks like when it matches.
//! The rule set evaluates rules in order and runs the first whose condition holds.

use crate::{
    Condition, ConditionTrace, HeaderDescriptor, HttpResponse, MappingContext, MappingError,
    ProblemSpec,
};
use http::StatusCode;
use serde_json::Value;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Free-form response construction.
pub type MapFn = Arc<dyn Fn(&MappingContext<'_>) -> Result<HttpResponse, MappingError> + Send + Sync>;

/// Produces an optional text member (title, detail). `None` leaves it unset.
pub type TextFactory =
    Arc<dyn Fn(&MappingContext<'_>) -> Result<Option<String>, MappingError> + Send + Sync>;

/// Produces an extension member value.
pub type ExtensionFactory =
    Arc<dyn Fn(&MappingContext<'_>) -> Result<Value, MappingError> + Send + Sync>;

/// What a matched rule produces.
#[derive(Clone)]
pub enum RuleAction {
    /// Arbitrary response from the context.
    Map(MapFn),

    /// A problem details response.
    Problem(ProblemSpec),

    /// `200` with the serialized success value, or `204` without one.
    DefaultSuccess {
        /// Content type of the serialized value.
        content_type: String,
    },
}

impl RuleAction {
    fn run(&self, ctx: &MappingContext<'_>) -> Result<HttpResponse, MappingError> {
        match self {
            Self::Map(map) => map(ctx),
            Self::Problem(spec) => HttpResponse::problem(&spec.resolve(ctx)?),
            Self::DefaultSuccess { content_type } => match ctx.value() {
                Some(value) => {
                    let body = serde_json::to_vec(value)?;
                    Ok(HttpResponse::new(StatusCode::OK).with_body(body, content_type.as_str()))
                }
                None => Ok(HttpResponse::no_content()),
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Problem(_) => "problem",
            Self::DefaultSuccess { .. } => "default-success",
        }
    }
}

impl Debug for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(_) => f.write_str("Map(<fn>)"),
            Self::Problem(spec) => f.debug_tuple("Problem").field(spec).finish(),
            Self::DefaultSuccess { content_type } => f
                .debug_struct("DefaultSuccess")
                .field("content_type", content_type)
                .finish(),
        }
    }
}

/// A single rule.
///
/// Built by [`RuleBuilder`](crate::RuleBuilder); immutable afterwards.
#[derive(Clone)]
pub struct Rule {
    name: Option<String>,
    condition: Condition,
    headers: Vec<HeaderDescriptor>,
    action: RuleAction,
}

impl Rule {
    pub(crate) fn new(
        name: Option<String>,
        condition: Condition,
        headers: Vec<HeaderDescriptor>,
        action: RuleAction,
    ) -> Self {
        Self {
            name,
            condition,
            headers,
            action,
        }
    }

    /// The implicit trailing rule of every rule set.
    pub(crate) fn default_success(content_type: impl Into<String>) -> Self {
        Self::new(
            Some("default-success".to_owned()),
            Condition::Success,
            Vec::new(),
            RuleAction::DefaultSuccess {
                content_type: content_type.into(),
            },
        )
    }

    /// The rule name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The rule's condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Header descriptors, in registration order.
    #[must_use]
    pub fn headers(&self) -> &[HeaderDescriptor] {
        &self.headers
    }

    /// The response contract.
    #[must_use]
    pub fn action(&self) -> &RuleAction {
        &self.action
    }

    /// Short label of the response contract (`map`, `problem`, `default-success`).
    #[must_use]
    pub fn action_kind(&self) -> &'static str {
        self.action.kind()
    }

    /// Returns `true` if this rule applies.
    pub fn matches(&self, ctx: &MappingContext<'_>) -> bool {
        self.condition.evaluate(ctx)
    }

    /// Evaluate the condition with a trace.
    #[must_use]
    pub fn matches_with_trace(&self, ctx: &MappingContext<'_>) -> ConditionTrace {
        self.condition.evaluate_with_trace(ctx)
    }

    /// Build the response for a context this rule matched.
    ///
    /// The action runs first; the rule's headers are appended after any headers the
    /// action produced, skipping headers whose factory yields `None`. Bodies are dropped
    /// for statuses that forbid them.
    ///
    /// # Errors
    ///
    /// Propagates [`MappingError`]s from the action.
    pub fn respond(&self, ctx: &MappingContext<'_>) -> Result<HttpResponse, MappingError> {
        let mut response = self.action.run(ctx)?;
        for header in &self.headers {
            if let Some(value) = header.resolve(ctx) {
                response.push_header(header.name().to_owned(), value);
            }
        }
        response.enforce_bodiless_status();
        Ok(response)
    }

}

/// `"name"` for named rules, `#index` otherwise.
pub(crate) fn rule_label(name: Option<&str>, index: usize) -> String {
    match name {
        Some(name) => format!("\"{name}\""),
        None => format!("#{index}"),
    }
}

impl Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .field("headers", &self.headers)
            .field("action", &self.action)
            .finish()
    }
}
