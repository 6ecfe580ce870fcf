//! `HttpResponse` — Transport-neutral response description
//!
//! The mapper's output: status, ordered headers, optional body and content type.
//! Turning this into bytes on a socket is the job of a sink (see `verdict-http`).

use crate::{MappingError, ProblemDetails, PROBLEM_CONTENT_TYPE};
use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

/// Content type of serialized success values.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A response description.
///
/// Headers form an ordered multimap: names are kept verbatim, a name may repeat, and
/// lookups are ASCII case-insensitive.
///
/// # Example
///
/// ```
/// use verdict::{HttpResponse, StatusCode};
///
/// let response = HttpResponse::new(StatusCode::ACCEPTED)
///     .with_header("Location", "/jobs/7")
///     .with_body("queued", "text/plain");
///
/// assert_eq!(response.header("location"), Some("/jobs/7"));
/// assert_eq!(response.body().map(|b| &b[..]), Some(&b"queued"[..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    content_type: Option<String>,
}

impl HttpResponse {
    /// An empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    /// `204 No Content`.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// `value` serialized as `application/json`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Serialization`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, MappingError> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status).with_body(body, JSON_CONTENT_TYPE))
    }

    /// A problem details body as `application/problem+json`, using the problem's status.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Serialization`] if an extension cannot be serialized.
    pub fn problem(problem: &ProblemDetails) -> Result<Self, MappingError> {
        let body = serde_json::to_vec(problem)?;
        Ok(Self::new(problem.status_code()).with_body(body, PROBLEM_CONTENT_TYPE))
    }

    /// Set the body and its content type.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Append a header. Existing headers with the same name are kept.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn push_header(&mut self, name: String, value: String) {
        self.headers.push((name, value));
    }

    /// The status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// All headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of header `name` (case-insensitive), in insertion order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body's content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Decompose into `(status, headers, body, content_type)`.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, Option<Bytes>, Option<String>) {
        (self.status, self.headers, self.body, self.content_type)
    }

    /// Drop the body of statuses that must not carry one.
    pub(crate) fn enforce_bodiless_status(&mut self) {
        if !allows_body(self.status) && (self.body.is_some() || self.content_type.is_some()) {
            tracing::warn!(status = %self.status, "dropping body of bodiless status");
            self.body = None;
            self.content_type = None;
        }
    }
}

/// Returns `false` for 1xx, `204 No Content` and `304 Not Modified`.
#[must_use]
pub fn allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}
