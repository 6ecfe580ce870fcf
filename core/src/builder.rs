//! Fluent rule configuration, used once at startup.
//!
//! Builders stage rules; [`RuleSetBuilder::build`] validates everything and freezes the
//! result into an immutable [`RuleSet`]. Mistakes are recorded as they happen and
//! reported by `build()`, so a chain never panics and never defers an error to request
//! time.

use crate::condition::{MetadataMatch, ReasonMatch};
use crate::problem::{ValidationSource, ERRORS_MEMBER, STANDARD_MEMBERS};
use crate::rule::rule_label;
use crate::value_match::check_literal_length;
use crate::{
    Condition, ConfigError, ExactMatcher, ExtensionFactory, FieldErrors, FnMatcher,
    HeaderDescriptor, HttpResponse, MapFn, MappingContext, MappingError, MessageSource, Messages,
    ProblemSpec, Reason, Rule, RuleAction, RuleSet, TextFactory, ValidationError, ValueMatcher,
    JSON_CONTENT_TYPE, MAX_CONDITION_DEPTH, MAX_RULES,
};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// RuleBuilder
// ═══════════════════════════════════════════════════════════════════════════════

enum PendingAction {
    Map(MapFn),
    Problem(ProblemBuilder),
}

/// Stages one rule: a condition, an optional name, headers and one response contract.
///
/// # Example
///
/// ```
/// use verdict::prelude::*;
///
/// let rule = RuleBuilder::when_error_with_metadata_value::<Error>("reason", "rate-limited")
///     .named("rate-limited")
///     .header_with("Retry-After", |ctx| {
///         ctx.metadata("retry-after").first().map(|v| v.to_string())
///     })
///     .problem(ProblemBuilder::new(StatusCode::TOO_MANY_REQUESTS))
///     .build()
///     .unwrap();
///
/// assert_eq!(rule.name(), Some("rate-limited"));
/// ```
pub struct RuleBuilder {
    name: Option<String>,
    condition: Condition,
    headers: Vec<HeaderDescriptor>,
    action: Option<PendingAction>,
    errors: Vec<ConfigError>,
}

impl RuleBuilder {
    /// Start a rule with an arbitrary condition.
    #[must_use]
    pub fn when_condition(condition: Condition) -> Self {
        Self {
            name: None,
            condition,
            headers: Vec::new(),
            action: None,
            errors: Vec::new(),
        }
    }

    /// Matches successful outcomes.
    #[must_use]
    pub fn when_success() -> Self {
        Self::when_condition(Condition::Success)
    }

    /// Matches failed outcomes.
    #[must_use]
    pub fn when_failure() -> Self {
        Self::when_condition(Condition::Failure)
    }

    /// Matches failures where some reason satisfies `pred`.
    pub fn when_failure_where(pred: impl Fn(&dyn Reason) -> bool + Send + Sync + 'static) -> Self {
        Self::when_condition(Condition::Reason(ReasonMatch::any().with_filter(pred)))
    }

    /// Matches failures carrying a `T` (or a specialisation of `T`).
    #[must_use]
    pub fn when_error<T: Reason>() -> Self {
        Self::when_condition(Condition::Reason(ReasonMatch::of::<T>()))
    }

    /// Matches failures carrying a `T` that satisfies `pred`.
    pub fn when_error_where<T: Reason>(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::when_condition(Condition::Reason(
            ReasonMatch::of::<T>().with_filter(move |r| r.downcast_ref::<T>().is_some_and(&pred)),
        ))
    }

    /// Matches failures carrying a `T` whose metadata contains `key`.
    pub fn when_error_with_metadata<T: Reason>(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut builder = Self::when_metadata::<T>(MetadataMatch::key(key.as_str()));
        builder.check_key(&key);
        builder
    }

    /// Matches failures carrying a `T` whose metadata `key` has text form `value`
    /// (ordinal comparison).
    pub fn when_error_with_metadata_value<T: Reason>(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let value = value.into();
        let literal = check_literal_length(&value);
        let mut builder = Self::when_error_with_metadata_matching::<T>(key, ExactMatcher::new(value));
        if let Err(e) = literal {
            builder.errors.push(e);
        }
        builder
    }

    /// Matches failures carrying a `T` whose metadata `key` satisfies `pred`.
    ///
    /// `pred` sees the raw value, `null` included.
    pub fn when_error_with_metadata_where<T: Reason>(
        key: impl Into<String>,
        pred: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::when_error_with_metadata_matching::<T>(key, FnMatcher::new(pred))
    }

    /// Matches failures carrying a `T` whose metadata `key` is accepted by `matcher`.
    pub fn when_error_with_metadata_matching<T: Reason>(
        key: impl Into<String>,
        matcher: impl ValueMatcher + 'static,
    ) -> Self {
        let key = key.into();
        let mut builder = Self::when_metadata::<T>(MetadataMatch::value(key.as_str(), matcher));
        builder.check_key(&key);
        builder
    }

    /// Matches when `pred` holds for the whole context.
    pub fn when(pred: impl Fn(&MappingContext<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self::when_condition(Condition::custom(pred))
    }

    fn when_metadata<T: Reason>(metadata: MetadataMatch) -> Self {
        Self::when_condition(Condition::Reason(ReasonMatch::of::<T>().with_metadata(metadata)))
    }

    fn check_key(&mut self, key: &str) {
        if key.is_empty() {
            self.errors.push(ConfigError::EmptyName {
                what: "metadata key",
            });
        }
    }

    /// Name the rule. Names show up in logs, traces and configuration errors.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.errors.push(ConfigError::EmptyName { what: "rule name" });
        }
        self.name = Some(name);
        self
    }

    /// Add a header with a fixed value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        match HeaderDescriptor::fixed(name, value) {
            Ok(header) => self.headers.push(header),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Add a header computed from the context. Returning `None` omits it.
    #[must_use]
    pub fn header_with(
        mut self,
        name: impl Into<String>,
        value: impl Fn(&MappingContext<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        match HeaderDescriptor::new(name, value) {
            Ok(header) => self.headers.push(header),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Add a prepared header descriptor.
    #[must_use]
    pub fn header_descriptor(mut self, header: HeaderDescriptor) -> Self {
        self.headers.push(header);
        self
    }

    /// Respond with an arbitrary response.
    #[must_use]
    pub fn map(
        self,
        map: impl Fn(&MappingContext<'_>) -> Result<HttpResponse, MappingError> + Send + Sync + 'static,
    ) -> Self {
        self.with_action(PendingAction::Map(Arc::new(map)))
    }

    /// Respond with `status`, carrying the success value as JSON if there is one.
    #[must_use]
    pub fn respond(self, status: StatusCode) -> Self {
        self.map(move |ctx| match ctx.value() {
            Some(value) => HttpResponse::json(status, value),
            None => Ok(HttpResponse::new(status)),
        })
    }

    /// Respond with problem details.
    #[must_use]
    pub fn problem(self, problem: ProblemBuilder) -> Self {
        self.with_action(PendingAction::Problem(problem))
    }

    fn with_action(mut self, action: PendingAction) -> Self {
        if self.action.is_some() {
            self.errors.push(ConfigError::ConflictingResponse);
        } else {
            self.action = Some(action);
        }
        self
    }

    /// Validate and freeze this rule, using the English default messages.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] recorded while staging, or
    /// [`ConfigError::MissingResponse`] / [`ConfigError::DepthExceeded`].
    pub fn build(self) -> Result<Rule, ConfigError> {
        self.build_with(&Messages::english())
    }

    pub(crate) fn build_with(self, messages: &dyn MessageSource) -> Result<Rule, ConfigError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let depth = self.condition.depth();
        if depth > MAX_CONDITION_DEPTH {
            return Err(ConfigError::DepthExceeded {
                depth,
                max: MAX_CONDITION_DEPTH,
            });
        }

        let action = match self.action {
            None => return Err(ConfigError::MissingResponse),
            Some(PendingAction::Map(map)) => RuleAction::Map(map),
            Some(PendingAction::Problem(problem)) => RuleAction::Problem(problem.build(messages)?),
        };

        Ok(Rule::new(self.name, self.condition, self.headers, action))
    }

    fn label(&self, index: usize) -> String {
        rule_label(self.name.as_deref(), index)
    }
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .field("headers", &self.headers.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ProblemBuilder
// ═══════════════════════════════════════════════════════════════════════════════

/// Stages a problem details response.
///
/// `ProblemBuilder::default()` is a 500 problem.
///
/// # Example
///
/// ```
/// use verdict::prelude::*;
///
/// let problem = ProblemBuilder::new(StatusCode::CONFLICT)
///     .title("Already exists")
///     .detail_with(|ctx| Ok(ctx.first_reason::<Error>()?.message().to_owned()))
///     .extension("retryable", false);
/// # let _ = problem;
/// ```
pub struct ProblemBuilder {
    status: StatusCode,
    problem_type: Option<String>,
    title: Option<TextFactory>,
    detail: Option<TextFactory>,
    extensions: Vec<(String, ExtensionFactory)>,
    validation: Option<ValidationSource>,
    errors: Vec<ConfigError>,
}

impl Default for ProblemBuilder {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl ProblemBuilder {
    /// A problem with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            problem_type: None,
            title: None,
            detail: None,
            extensions: Vec::new(),
            validation: None,
            errors: Vec::new(),
        }
    }

    /// Set the problem type URI. Without it the type is derived from the status.
    #[must_use]
    pub fn problem_type(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.is_empty() {
            self.errors.push(ConfigError::EmptyName {
                what: "problem type",
            });
        }
        self.problem_type = Some(uri);
        self
    }

    /// Set a fixed title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(fixed_text(title.into()));
        self
    }

    /// Compute the title from the context. Yielding `None` leaves it unset.
    #[must_use]
    pub fn title_with<F, R>(mut self, title: F) -> Self
    where
        F: Fn(&MappingContext<'_>) -> Result<R, MappingError> + Send + Sync + 'static,
        R: Into<Option<String>>,
    {
        self.title = Some(text_factory(title));
        self
    }

    /// Set a fixed detail.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(fixed_text(detail.into()));
        self
    }

    /// Compute the detail from the context. Yielding `None` omits it.
    #[must_use]
    pub fn detail_with<F, R>(mut self, detail: F) -> Self
    where
        F: Fn(&MappingContext<'_>) -> Result<R, MappingError> + Send + Sync + 'static,
        R: Into<Option<String>>,
    {
        self.detail = Some(text_factory(detail));
        self
    }

    /// Add a fixed extension member.
    #[must_use]
    pub fn extension(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                let factory: ExtensionFactory =
                    Arc::new(move |_: &MappingContext<'_>| -> Result<Value, MappingError> {
                        Ok(value.clone())
                    });
                self.extensions.push((name.into(), factory));
            }
            Err(e) => self.errors.push(ConfigError::InvalidConfig {
                reason: format!("extension value: {e}"),
            }),
        }
        self
    }

    /// Add an extension member computed from the context.
    #[must_use]
    pub fn extension_with<F, V>(mut self, name: impl Into<String>, value: F) -> Self
    where
        F: Fn(&MappingContext<'_>) -> Result<V, MappingError> + Send + Sync + 'static,
        V: Serialize,
    {
        let factory: ExtensionFactory =
            Arc::new(move |ctx: &MappingContext<'_>| -> Result<Value, MappingError> {
                Ok(serde_json::to_value(value(ctx)?)?)
            });
        self.extensions.push((name.into(), factory));
        self
    }

    /// Validation problem with field errors read from the first reason carrying `key`.
    ///
    /// The metadata value must be an object mapping field names to a message or a list
    /// of messages. Forces status 400.
    #[must_use]
    pub fn validation_from_metadata(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            self.errors.push(ConfigError::EmptyName {
                what: "metadata key",
            });
        }
        self.validation = Some(ValidationSource::Metadata(key));
        self
    }

    /// Validation problem with field errors extracted from the first `T`. Forces status 400.
    #[must_use]
    pub fn validation<T: Reason>(mut self, extract: impl Fn(&T) -> FieldErrors + Send + Sync + 'static) -> Self {
        self.validation = Some(ValidationSource::Typed(Arc::new(
            move |ctx: &MappingContext<'_>| -> Result<FieldErrors, MappingError> {
                Ok(extract(ctx.first_reason::<T>()?))
            },
        )));
        self
    }

    /// Validation problem with the field errors of the first [`ValidationError`].
    #[must_use]
    pub fn validation_errors(self) -> Self {
        self.validation::<ValidationError>(|e| e.errors().clone())
    }

    pub(crate) fn build(self, messages: &dyn MessageSource) -> Result<ProblemSpec, ConfigError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let validation = self.validation.is_some();
        let mut seen = HashSet::with_capacity(self.extensions.len());
        for (name, _) in &self.extensions {
            if name.is_empty() {
                return Err(ConfigError::EmptyName {
                    what: "extension name",
                });
            }
            if STANDARD_MEMBERS.contains(&name.as_str()) || (validation && name == ERRORS_MEMBER) {
                return Err(ConfigError::ReservedExtension { name: name.clone() });
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateExtension { name: name.clone() });
            }
        }

        let (status, title, detail) = if validation {
            (
                StatusCode::BAD_REQUEST,
                self.title
                    .or_else(|| Some(fixed_text(messages.message(Messages::VALIDATION_TITLE).into_owned()))),
                self.detail
                    .or_else(|| Some(fixed_text(messages.message(Messages::VALIDATION_DETAIL).into_owned()))),
            )
        } else {
            (self.status, self.title, self.detail)
        };

        Ok(ProblemSpec {
            status,
            problem_type: self.problem_type,
            title,
            detail,
            extensions: self.extensions,
            validation: self.validation,
        })
    }
}

impl fmt::Debug for ProblemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemBuilder")
            .field("status", &self.status.as_u16())
            .field("problem_type", &self.problem_type)
            .field("extensions", &self.extensions.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("validation", &self.validation.is_some())
            .finish_non_exhaustive()
    }
}

fn fixed_text(text: String) -> TextFactory {
    Arc::new(move |_: &MappingContext<'_>| -> Result<Option<String>, MappingError> {
        Ok(Some(text.clone()))
    })
}

fn text_factory<F, R>(f: F) -> TextFactory
where
    F: Fn(&MappingContext<'_>) -> Result<R, MappingError> + Send + Sync + 'static,
    R: Into<Option<String>>,
{
    Arc::new(move |ctx: &MappingContext<'_>| -> Result<Option<String>, MappingError> {
        f(ctx).map(Into::into)
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// RuleSetBuilder
// ═══════════════════════════════════════════════════════════════════════════════

/// Stages the ordered rule list.
///
/// Rules are kept in the order they are added; [`build`](Self::build) appends the
/// default-success rule.
pub struct RuleSetBuilder {
    rules: Vec<RuleBuilder>,
    success_content_type: String,
    messages: Arc<dyn MessageSource>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            success_content_type: JSON_CONTENT_TYPE.to_owned(),
            messages: Arc::new(Messages::english()),
        }
    }
}

impl RuleSetBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, rule: RuleBuilder) -> Self {
        self.rules.push(rule);
        self
    }

    /// Content type of success values serialized by the default-success rule.
    #[must_use]
    pub fn success_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.success_content_type = content_type.into();
        self
    }

    /// Message source for generated default texts.
    #[must_use]
    pub fn messages(mut self, messages: impl MessageSource + 'static) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// Validate every rule and freeze the set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyRules`], [`ConfigError::EmptyName`] for an empty
    /// success content type, or the first rule error wrapped in [`ConfigError::InRule`].
    pub fn build(self) -> Result<RuleSet, ConfigError> {
        if self.rules.len() > MAX_RULES {
            return Err(ConfigError::TooManyRules {
                count: self.rules.len(),
                max: MAX_RULES,
            });
        }
        if self.success_content_type.is_empty() {
            return Err(ConfigError::EmptyName {
                what: "success content type",
            });
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (index, builder) in self.rules.into_iter().enumerate() {
            let label = builder.label(index);
            let rule = builder
                .build_with(self.messages.as_ref())
                .map_err(|e| e.in_rule(label))?;
            rules.push(rule);
        }

        let rule_set = RuleSet::new(rules, Rule::default_success(self.success_content_type));
        tracing::debug!(rules = rule_set.len(), "rule set built");
        Ok(rule_set)
    }
}

impl fmt::Debug for RuleSetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSetBuilder")
            .field("rules", &self.rules)
            .field("success_content_type", &self.success_content_type)
            .field("messages", &self.messages)
            .finish()
    }
}
