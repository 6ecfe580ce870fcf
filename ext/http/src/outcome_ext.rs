//! `OutcomeExt` — Map and write in one call

use crate::{BoundaryError, HyperSink, ResponseSink};
use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use verdict::{HttpResultMapper, Outcome};

/// Extension trait for turning an [`Outcome`] straight into an `http::Response`.
pub trait OutcomeExt {
    /// Map through `mapper` and write with [`HyperSink`].
    ///
    /// # Errors
    ///
    /// [`BoundaryError::Mapping`] if mapping fails, otherwise see [`HyperSink`].
    fn to_http_response<M: HttpResultMapper>(
        &self,
        mapper: &M,
    ) -> Result<http::Response<Full<Bytes>>, BoundaryError>;
}

impl<T: Serialize> OutcomeExt for Outcome<T> {
    fn to_http_response<M: HttpResultMapper>(
        &self,
        mapper: &M,
    ) -> Result<http::Response<Full<Bytes>>, BoundaryError> {
        HyperSink.write(mapper.map(self)?)
    }
}
