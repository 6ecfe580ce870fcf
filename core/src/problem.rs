//! Problem details (RFC 7807) bodies and the per-rule recipe that builds them.
//!
//! # Defaulting chain
//!
//! 1. `status` is always set (500 unless configured).
//! 2. `type` is the configured URI, or derived from `status` via [`default_type_uri`].
//! 3. `title` is the configured text. If there is none and `type` was derived, it is
//!    derived from `status` via [`default_title`]. An explicit `type` never gets a derived
//!    title.
//! 4. `detail` is the configured text, or omitted.
//! 5. Extensions are evaluated in registration order and written as top-level members.

use crate::{ExtensionFactory, FieldErrors, MappingContext, MappingError, TextFactory};
use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Content type of problem details responses.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// The generic problem type for statuses without a dedicated URI.
pub const ABOUT_BLANK: &str = "about:blank";

/// Extension member holding field errors on validation problems.
pub(crate) const ERRORS_MEMBER: &str = "errors";

/// Member names that extensions may never use.
pub(crate) const STANDARD_MEMBERS: [&str; 4] = ["type", "title", "status", "detail"];

/// The problem type URI for `status`, or [`ABOUT_BLANK`].
///
/// ```
/// use verdict::{default_type_uri, StatusCode};
///
/// assert_eq!(
///     default_type_uri(StatusCode::NOT_FOUND),
///     "https://tools.ietf.org/html/rfc7231#section-6.5.4"
/// );
/// assert_eq!(default_type_uri(StatusCode::IM_A_TEAPOT), "about:blank");
/// ```
#[must_use]
pub fn default_type_uri(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "https://tools.ietf.org/html/rfc7231#section-6.5.1",
        401 => "https://tools.ietf.org/html/rfc7235#section-3.1",
        402 => "https://tools.ietf.org/html/rfc7231#section-6.5.2",
        403 => "https://tools.ietf.org/html/rfc7231#section-6.5.3",
        404 => "https://tools.ietf.org/html/rfc7231#section-6.5.4",
        405 => "https://tools.ietf.org/html/rfc7231#section-6.5.5",
        406 => "https://tools.ietf.org/html/rfc7231#section-6.5.6",
        407 => "https://tools.ietf.org/html/rfc7235#section-3.2",
        408 => "https://tools.ietf.org/html/rfc7231#section-6.5.7",
        409 => "https://tools.ietf.org/html/rfc7231#section-6.5.8",
        410 => "https://tools.ietf.org/html/rfc7231#section-6.5.9",
        411 => "https://tools.ietf.org/html/rfc7231#section-6.5.10",
        412 => "https://tools.ietf.org/html/rfc7232#section-4.2",
        413 => "https://tools.ietf.org/html/rfc7231#section-6.5.11",
        414 => "https://tools.ietf.org/html/rfc7231#section-6.5.12",
        415 => "https://tools.ietf.org/html/rfc7231#section-6.5.13",
        416 => "https://tools.ietf.org/html/rfc7233#section-4.4",
        417 => "https://tools.ietf.org/html/rfc7231#section-6.5.14",
        422 => "https://tools.ietf.org/html/rfc4918#section-11.2",
        423 => "https://tools.ietf.org/html/rfc4918#section-11.3",
        424 => "https://tools.ietf.org/html/rfc4918#section-11.4",
        426 => "https://tools.ietf.org/html/rfc7231#section-6.5.15",
        428 => "https://tools.ietf.org/html/rfc6585#section-3",
        429 => "https://tools.ietf.org/html/rfc6585#section-4",
        431 => "https://tools.ietf.org/html/rfc6585#section-5",
        500 => "https://tools.ietf.org/html/rfc7231#section-6.6.1",
        501 => "https://tools.ietf.org/html/rfc7231#section-6.6.2",
        502 => "https://tools.ietf.org/html/rfc7231#section-6.6.3",
        503 => "https://tools.ietf.org/html/rfc7231#section-6.6.4",
        504 => "https://tools.ietf.org/html/rfc7231#section-6.6.5",
        505 => "https://tools.ietf.org/html/rfc7231#section-6.6.6",
        507 => "https://tools.ietf.org/html/rfc4918#section-11.5",
        511 => "https://tools.ietf.org/html/rfc6585#section-6",
        _ => ABOUT_BLANK,
    }
}

/// The standard reason phrase for `status`, or `"Internal Server Error"`.
///
/// ```
/// use verdict::{default_title, StatusCode};
///
/// assert_eq!(default_title(StatusCode::NOT_FOUND), "Not Found");
/// assert_eq!(default_title(StatusCode::from_u16(599).unwrap()), "Internal Server Error");
/// ```
#[must_use]
pub fn default_title(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Internal Server Error")
}

// ═══════════════════════════════════════════════════════════════════════════════
// ProblemDetails
// ═══════════════════════════════════════════════════════════════════════════════

/// An RFC 7807 problem details body.
///
/// Extensions are flattened into the top-level object and keep their insertion order.
///
/// ```
/// use serde_json::json;
/// use verdict::ProblemDetails;
///
/// let mut problem = ProblemDetails::new(409);
/// problem.title = Some("Conflict".into());
/// problem.extensions.insert("resource".into(), json!("user"));
///
/// assert_eq!(
///     serde_json::to_value(&problem).unwrap(),
///     json!({"type": "about:blank", "title": "Conflict", "status": 409, "resource": "user"})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type", default = "about_blank")]
    pub problem_type: String,
    /// Short summary of the problem type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Extension members.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

fn about_blank() -> String {
    ABOUT_BLANK.to_owned()
}

impl ProblemDetails {
    /// A bare problem of type `about:blank`.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            problem_type: about_blank(),
            title: None,
            status,
            detail: None,
            extensions: IndexMap::new(),
        }
    }

    /// `status` as a [`StatusCode`] (500 if out of range).
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Field errors of a validation problem, if present and well-formed.
    #[must_use]
    pub fn errors(&self) -> Option<FieldErrors> {
        self.extensions
            .get(ERRORS_MEMBER)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ProblemSpec
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a validation problem gets its field errors from.
#[derive(Clone)]
pub(crate) enum ValidationSource {
    /// A field-to-messages map stored in the first reason carrying `key`.
    Metadata(String),
    /// Extraction from the first reason of some type.
    Typed(Arc<dyn Fn(&MappingContext<'_>) -> Result<FieldErrors, MappingError> + Send + Sync>),
}

impl ValidationSource {
    fn resolve(&self, ctx: &MappingContext<'_>) -> Result<FieldErrors, MappingError> {
        match self {
            Self::Metadata(key) => {
                let value = ctx.metadata(key).into_iter().next().ok_or_else(|| {
                    MappingError::ReasonWithMetadataNotFound {
                        kind: "Reason",
                        key: key.clone(),
                    }
                })?;
                field_errors_from_value(value).ok_or_else(|| {
                    MappingError::InvalidValidationMetadata { key: key.clone() }
                })
            }
            Self::Typed(extract) => extract(ctx),
        }
    }
}

/// Accepts `{field: [msg, ...]}` or `{field: msg}`.
fn field_errors_from_value(value: &Value) -> Option<FieldErrors> {
    let object = value.as_object()?;
    let mut errors = FieldErrors::new();
    for (field, messages) in object {
        let messages = match messages {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|m| m.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        errors.insert(field.clone(), messages);
    }
    Some(errors)
}

/// Validated recipe for a problem response, built by
/// [`ProblemBuilder`](crate::ProblemBuilder).
#[derive(Clone)]
pub struct ProblemSpec {
    pub(crate) status: StatusCode,
    pub(crate) problem_type: Option<String>,
    pub(crate) title: Option<TextFactory>,
    pub(crate) detail: Option<TextFactory>,
    pub(crate) extensions: Vec<(String, ExtensionFactory)>,
    pub(crate) validation: Option<ValidationSource>,
}

impl ProblemSpec {
    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The explicitly configured type URI, if any.
    #[must_use]
    pub fn problem_type(&self) -> Option<&str> {
        self.problem_type.as_deref()
    }

    /// Names of the configured extension members, in order.
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|(name, _)| name.as_str())
    }

    /// Returns `true` for validation problems.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.validation.is_some()
    }

    /// Build the problem body for one context.
    ///
    /// # Errors
    ///
    /// Propagates failures of the title, detail, extension or validation factories.
    pub fn resolve(&self, ctx: &MappingContext<'_>) -> Result<ProblemDetails, MappingError> {
        let derived = self.problem_type.is_none();
        let problem_type = self
            .problem_type
            .clone()
            .unwrap_or_else(|| default_type_uri(self.status).to_owned());

        let mut title = match &self.title {
            Some(factory) => factory(ctx)?,
            None => None,
        };
        if title.is_none() && derived {
            title = Some(default_title(self.status).to_owned());
        }

        let detail = match &self.detail {
            Some(factory) => factory(ctx)?,
            None => None,
        };

        let mut extensions = IndexMap::with_capacity(self.extensions.len() + 1);
        if let Some(source) = &self.validation {
            let errors = source.resolve(ctx)?;
            extensions.insert(ERRORS_MEMBER.to_owned(), serde_json::to_value(errors)?);
        }
        for (name, factory) in &self.extensions {
            extensions.insert(name.clone(), factory(ctx)?);
        }

        Ok(ProblemDetails {
            problem_type,
            title,
            status: self.status.as_u16(),
            detail,
            extensions,
        })
    }
}

impl fmt::Debug for ProblemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemSpec")
            .field("status", &self.status.as_u16())
            .field("problem_type", &self.problem_type)
            .field("extensions", &self.extension_names().collect::<Vec<_>>())
            .field("validation", &self.validation.is_some())
            .finish_non_exhaustive()
    }
}
