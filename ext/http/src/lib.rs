//! verdict-http: `http::Response` boundary for verdict
//!
//! The engine produces a framework-neutral [`HttpResponse`]. This crate writes it out as an
//! `http::Response<Full<Bytes>>`, the type hyper, axum and tower services accept.
//!
//! # Architecture
//!
//! ```text
//! Outcome<T>
//!         ↓ HttpResultMapper::map()
//! verdict HttpResponse
//!         ↓ ResponseSink::write()
//! http::Response<Full<Bytes>>
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use verdict_http::prelude::*;
//!
//! let rules = RuleSet::builder()
//!     .rule(RuleBuilder::when_failure().problem(ProblemBuilder::new(StatusCode::BAD_GATEWAY)))
//!     .build()
//!     .unwrap();
//! let mapper = ResultMapper::new(Arc::new(rules));
//!
//! let response = Outcome::fail(Error::new("upstream down"))
//!     .to_http_response(&mapper)
//!     .unwrap();
//! assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
//! assert_eq!(response.headers()["content-type"], "application/problem+json");
//! ```

mod outcome_ext;
mod sink;

pub use outcome_ext::OutcomeExt;
pub use sink::{into_http_response, HyperSink, ResponseSink};

use verdict::MappingError;

/// Errors raised while writing a response at the transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// Mapping the outcome failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A header name is not valid at the transport.
    #[error("invalid header name \"{name}\"")]
    InvalidHeaderName {
        /// The rejected name.
        name: String,
    },

    /// A header value is not valid at the transport.
    #[error("invalid value for header \"{name}\"")]
    InvalidHeaderValue {
        /// The header the value belongs to.
        name: String,
    },

    /// Assembling the response failed.
    #[error(transparent)]
    Http(#[from] http::Error),
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{into_http_response, BoundaryError, HyperSink, OutcomeExt, ResponseSink};
    pub use verdict::prelude::*;
}
