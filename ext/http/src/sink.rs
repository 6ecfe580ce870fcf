//! `ResponseSink` — Writes an engine response to a transport type

use crate::BoundaryError;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http_body_util::Full;
use verdict::HttpResponse;

/// Turns a framework-neutral [`HttpResponse`] into a transport response.
///
/// One implementation per web stack. The engine never depends on any of them.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot write verdict responses",
    note = "use `verdict_http::HyperSink` for `http::Response<Full<Bytes>>`"
)]
pub trait ResponseSink {
    /// The transport response type.
    type Output;

    /// Error raised when the response cannot be represented.
    type Error;

    /// Write one response.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn write(&self, response: HttpResponse) -> Result<Self::Output, Self::Error>;
}

/// Writes `http::Response<Full<Bytes>>`, the body type hyper services return.
///
/// # INV: Header order
///
/// Headers are appended in the order the rule produced them. Repeated names become
/// multiple values of one field; names are case-insensitive from here on.
///
/// # INV: Content type
///
/// The response's content type is emitted as `Content-Type` unless a header already set it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperSink;

impl ResponseSink for HyperSink {
    type Output = http::Response<Full<Bytes>>;
    type Error = BoundaryError;

    fn write(&self, response: HttpResponse) -> Result<Self::Output, Self::Error> {
        let (status, headers, body, content_type) = response.into_parts();

        let mut map = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| BoundaryError::InvalidHeaderName { name: name.clone() })?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| BoundaryError::InvalidHeaderValue { name })?;
            map.append(header_name, header_value);
        }
        if let Some(content_type) = content_type {
            if !map.contains_key(CONTENT_TYPE) {
                let value = HeaderValue::from_str(&content_type).map_err(|_| {
                    BoundaryError::InvalidHeaderValue {
                        name: CONTENT_TYPE.as_str().to_owned(),
                    }
                })?;
                map.insert(CONTENT_TYPE, value);
            }
        }

        let mut out = http::Response::builder()
            .status(status)
            .body(Full::new(body.unwrap_or_default()))?;
        *out.headers_mut() = map;
        Ok(out)
    }
}

/// Shorthand for [`HyperSink::write`].
///
/// # Errors
///
/// [`BoundaryError::InvalidHeaderName`] / [`BoundaryError::InvalidHeaderValue`] if a header
/// cannot be represented by the `http` crate.
pub fn into_http_response(response: HttpResponse) -> Result<http::Response<Full<Bytes>>, BoundaryError> {
    HyperSink.write(response)
}
