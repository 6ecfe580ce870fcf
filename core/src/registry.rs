//! Reason-kind registry and config loading.
//!
//! Config files name reason kinds by string (`kind: not_found`). The registry maps those
//! names to [`ReasonKind`]s and compiles a [`RuleSetConfig`] into a [`RuleSet`].
//!
//! # Example
//!
//! ```
//! use verdict::{register_core_kinds, ReasonRegistryBuilder, RuleSetConfig};
//!
//! let registry = register_core_kinds(ReasonRegistryBuilder::new()).build();
//!
//! let config: RuleSetConfig = serde_json::from_value(serde_json::json!({
//!     "rules": [
//!         { "when": { "type": "error", "kind": "validation" }, "problem": { "validation": "typed" } },
//!         { "when": { "type": "failure" }, "problem": {} }
//!     ]
//! }))
//! .unwrap();
//!
//! let rules = registry.load_rule_set(config).unwrap();
//! assert_eq!(rules.len(), 2);
//! ```

use crate::condition::{MetadataMatch, ReasonMatch};
use crate::config::{
    ConditionConfig, ExtensionConfig, FromSource, HeaderConfig, MetadataMatchConfig,
    ProblemConfig, RuleConfig, RuleSetConfig, TextConfig, TextSourceConfig, ValidationConfig,
};
use crate::rule::rule_label;
use crate::{
    value_text, Condition, ConfigError, Error, MappingContext, MappingError, ProblemBuilder,
    Reason, ReasonKind, RuleBuilder, RuleSet, RuleSetBuilder, ValidationError, MAX_RULES,
};
use http::StatusCode;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for a [`ReasonRegistry`].
///
/// Register reason types under the names config files use, then call
/// [`build()`](Self::build). The registry is immutable afterwards.
#[derive(Debug, Default)]
pub struct ReasonRegistryBuilder {
    kinds: HashMap<String, ReasonKind>,
}

impl ReasonRegistryBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register reason type `T` under `name`. A later registration of the same name wins.
    #[must_use]
    pub fn kind<T: Reason>(mut self, name: &str) -> Self {
        self.kinds.insert(name.to_owned(), ReasonKind::of::<T>());
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> ReasonRegistry {
        ReasonRegistry { kinds: self.kinds }
    }
}

/// Register the built-in kinds: `error` ([`Error`]) and `validation` ([`ValidationError`]).
///
/// Domain crates call this first and add their own kinds on top.
///
/// # Example
///
/// ```ignore
/// pub fn register(builder: ReasonRegistryBuilder) -> ReasonRegistryBuilder {
///     verdict::register_core_kinds(builder).kind::<NotFoundError>("not_found")
/// }
/// ```
#[must_use]
pub fn register_core_kinds(builder: ReasonRegistryBuilder) -> ReasonRegistryBuilder {
    builder
        .kind::<Error>("error")
        .kind::<ValidationError>("validation")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable map from kind names to [`ReasonKind`]s.
pub struct ReasonRegistry {
    kinds: HashMap<String, ReasonKind>,
}

impl ReasonRegistry {
    /// Look up a kind by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ReasonKind> {
        self.kinds.get(name).copied()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kind names (sorted).
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Compile a config into a [`RuleSet`].
    ///
    /// Applies the same validation as [`RuleSetBuilder::build`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownKind`]: a kind name is not registered
    /// - [`ConfigError::InvalidStatus`]: a status is outside `100..=999`
    /// - [`ConfigError::InvalidConfig`]: a text source or extension is malformed
    /// - any error [`RuleSetBuilder::build`] reports
    ///
    /// Rule-local errors are wrapped in [`ConfigError::InRule`].
    pub fn load_rule_set(&self, config: RuleSetConfig) -> Result<RuleSet, ConfigError> {
        if config.rules.len() > MAX_RULES {
            return Err(ConfigError::TooManyRules {
                count: config.rules.len(),
                max: MAX_RULES,
            });
        }
        let mut builder = RuleSetBuilder::new();
        if let Some(content_type) = config.success_content_type {
            builder = builder.success_content_type(content_type);
        }
        for (index, rule) in config.rules.into_iter().enumerate() {
            let label = rule_label(rule.name.as_deref(), index);
            builder = builder.rule(self.load_rule(rule).map_err(|e| e.in_rule(label))?);
        }
        builder.build()
    }

    /// Compile a config from an untyped value, e.g. YAML parsed into `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidConfig`] if the value is not a valid rule set config, otherwise
    /// as [`load_rule_set`](Self::load_rule_set).
    pub fn load_rule_set_value(&self, value: Value) -> Result<RuleSet, ConfigError> {
        let config: RuleSetConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::InvalidConfig {
                reason: e.to_string(),
            })?;
        self.load_rule_set(config)
    }

    fn load_rule(&self, config: RuleConfig) -> Result<RuleBuilder, ConfigError> {
        let mut rule = RuleBuilder::when_condition(self.load_condition(config.when)?);
        if let Some(name) = config.name {
            rule = rule.named(name);
        }
        for header in config.headers {
            rule = self.load_header(rule, header)?;
        }
        if let Some(respond) = config.respond {
            rule = rule.respond(status(respond.status)?);
        }
        if let Some(problem) = config.problem {
            rule = rule.problem(self.load_problem(problem)?);
        }
        Ok(rule)
    }

    fn load_condition(&self, config: ConditionConfig) -> Result<Condition, ConfigError> {
        match config {
            ConditionConfig::Success => Ok(Condition::Success),
            ConditionConfig::Failure => Ok(Condition::Failure),
            ConditionConfig::Error { kind, metadata } => {
                let mut reason = match kind {
                    Some(name) => ReasonMatch::kind(self.resolve(&name)?),
                    None => ReasonMatch::any(),
                };
                if let Some(metadata) = metadata {
                    reason = reason.with_metadata(Self::load_metadata(metadata)?);
                }
                Ok(Condition::Reason(reason))
            }
            ConditionConfig::And { conditions } => Ok(Condition::All(self.load_conditions(conditions)?)),
            ConditionConfig::Or { conditions } => Ok(Condition::Any(self.load_conditions(conditions)?)),
            ConditionConfig::Not { condition } => {
                Ok(Condition::Not(Box::new(self.load_condition(*condition)?)))
            }
        }
    }

    fn load_conditions(&self, configs: Vec<ConditionConfig>) -> Result<Vec<Condition>, ConfigError> {
        configs
            .into_iter()
            .map(|c| self.load_condition(c))
            .collect()
    }

    fn load_metadata(config: MetadataMatchConfig) -> Result<MetadataMatch, ConfigError> {
        if config.key.is_empty() {
            return Err(ConfigError::EmptyName {
                what: "metadata key",
            });
        }
        match config.value {
            Some(spec) => Ok(MetadataMatch::value(config.key, spec.to_matcher()?)),
            None => Ok(MetadataMatch::key(config.key)),
        }
    }

    fn load_header(&self, rule: RuleBuilder, config: HeaderConfig) -> Result<RuleBuilder, ConfigError> {
        Ok(match config.value {
            TextConfig::Literal(value) => rule.header(config.name, value),
            TextConfig::Source(source) => {
                let source = self.load_source(source)?;
                rule.header_with(config.name, move |ctx| source.text(ctx))
            }
        })
    }

    fn load_problem(&self, config: ProblemConfig) -> Result<ProblemBuilder, ConfigError> {
        let mut problem = match config.status {
            Some(code) => ProblemBuilder::new(status(code)?),
            None => ProblemBuilder::default(),
        };
        if let Some(uri) = config.problem_type {
            problem = problem.problem_type(uri);
        }
        match config.title.map(|t| self.load_text(t)).transpose()? {
            Some(Text::Literal(title)) => problem = problem.title(title),
            Some(Text::Source(source)) => {
                problem = problem.title_with(move |ctx| Ok::<_, MappingError>(source.text(ctx)));
            }
            None => {}
        }
        match config.detail.map(|t| self.load_text(t)).transpose()? {
            Some(Text::Literal(detail)) => problem = problem.detail(detail),
            Some(Text::Source(source)) => {
                problem = problem.detail_with(move |ctx| Ok::<_, MappingError>(source.text(ctx)));
            }
            None => {}
        }
        for extension in config.extensions {
            problem = self.load_extension(problem, extension)?;
        }
        match config.validation {
            Some(ValidationConfig::Typed) => problem = problem.validation_errors(),
            Some(ValidationConfig::Metadata(key)) => problem = problem.validation_from_metadata(key),
            None => {}
        }
        Ok(problem)
    }

    fn load_extension(
        &self,
        problem: ProblemBuilder,
        config: ExtensionConfig,
    ) -> Result<ProblemBuilder, ConfigError> {
        match (config.value, config.from) {
            (Some(value), None) => Ok(problem.extension(config.name, value)),
            (None, Some(source)) => {
                let source = self.load_source(source)?;
                Ok(problem.extension_with(config.name, move |ctx| {
                    Ok::<_, MappingError>(source.value(ctx).unwrap_or(Value::Null))
                }))
            }
            _ => Err(ConfigError::InvalidConfig {
                reason: format!(
                    "extension \"{}\" needs exactly one of `value` and `from`",
                    config.name
                ),
            }),
        }
    }

    fn load_text(&self, config: TextConfig) -> Result<Text, ConfigError> {
        match config {
            TextConfig::Literal(text) => Ok(Text::Literal(text)),
            TextConfig::Source(source) => Ok(Text::Source(self.load_source(source)?)),
        }
    }

    fn load_source(&self, config: TextSourceConfig) -> Result<Source, ConfigError> {
        if config.from == FromSource::Metadata && config.key.is_none() {
            return Err(ConfigError::InvalidConfig {
                reason: "`from: metadata` requires `key`".to_owned(),
            });
        }
        if config.key.as_deref() == Some("") {
            return Err(ConfigError::EmptyName {
                what: "metadata key",
            });
        }
        let kind = config.kind.map(|name| self.resolve(&name)).transpose()?;
        Ok(Source {
            from: config.from,
            key: config.key,
            kind,
        })
    }

    fn resolve(&self, name: &str) -> Result<ReasonKind, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownKind {
            name: name.to_owned(),
            available: self.names().into_iter().map(str::to_owned).collect(),
        })
    }
}

impl fmt::Debug for ReasonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonRegistry")
            .field("kinds", &self.names())
            .finish()
    }
}

fn status(code: u16) -> Result<StatusCode, ConfigError> {
    StatusCode::from_u16(code).map_err(|_| ConfigError::InvalidStatus { status: code })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Text sources
// ═══════════════════════════════════════════════════════════════════════════════

enum Text {
    Literal(String),
    Source(Source),
}

/// Compiled [`TextSourceConfig`].
struct Source {
    from: FromSource,
    key: Option<String>,
    kind: Option<ReasonKind>,
}

impl Source {
    fn reason<'a>(&self, ctx: &MappingContext<'a>) -> Option<&'a dyn Reason> {
        ctx.reasons().find(|reason| {
            self.kind.is_none_or(|kind| kind.matches(*reason))
                && self
                    .key
                    .as_deref()
                    .is_none_or(|key| reason.metadata().contains_key(key))
        })
    }

    fn text(&self, ctx: &MappingContext<'_>) -> Option<String> {
        let reason = self.reason(ctx)?;
        match self.from {
            FromSource::Message => Some(reason.message().to_owned()),
            FromSource::Metadata => {
                let value = reason.metadata().get(self.key.as_deref()?)?;
                value_text(value).map(Cow::into_owned)
            }
        }
    }

    fn value(&self, ctx: &MappingContext<'_>) -> Option<Value> {
        let reason = self.reason(ctx)?;
        match self.from {
            FromSource::Message => Some(Value::String(reason.message().to_owned())),
            FromSource::Metadata => reason.metadata().get(self.key.as_deref()?).cloned(),
        }
    }
}
