//! `HeaderDescriptor` — A header a rule adds to its response

use crate::{ConfigError, MappingContext};
use http::HeaderName;
use std::fmt;
use std::sync::Arc;

/// Produces a header value from the context. `None` omits the header.
pub type HeaderFactory = Arc<dyn Fn(&MappingContext<'_>) -> Option<String> + Send + Sync>;

/// A header name plus a value factory.
///
/// The name is kept verbatim as configured; it must be a valid HTTP field name.
///
/// # Example
///
/// ```
/// use verdict::{Error, HeaderDescriptor, MappingContext, Outcome};
///
/// let retry = HeaderDescriptor::new("Retry-After", |ctx| {
///     ctx.metadata("retry-after").first().map(|v| v.to_string())
/// })
/// .unwrap();
///
/// let outcome = Outcome::fail(Error::new("busy").with_metadata("retry-after", 30));
/// let ctx = MappingContext::new(&outcome).unwrap();
/// assert_eq!(retry.resolve(&ctx).as_deref(), Some("30"));
///
/// let calm = Outcome::fail(Error::new("busy"));
/// assert_eq!(retry.resolve(&MappingContext::new(&calm).unwrap()), None);
/// ```
#[derive(Clone)]
pub struct HeaderDescriptor {
    name: String,
    factory: HeaderFactory,
}

impl HeaderDescriptor {
    /// Create a descriptor with a computed value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyName`] or [`ConfigError::InvalidHeaderName`].
    pub fn new(
        name: impl Into<String>,
        factory: impl Fn(&MappingContext<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        Self::from_factory(name, Arc::new(factory))
    }

    /// Create a descriptor with a fixed value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyName`] or [`ConfigError::InvalidHeaderName`].
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        Self::new(name, move |_| Some(value.clone()))
    }

    pub(crate) fn from_factory(
        name: impl Into<String>,
        factory: HeaderFactory,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_header_name(&name)?;
        Ok(Self { name, factory })
    }

    /// The header name as configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the value factory.
    #[must_use]
    pub fn resolve(&self, ctx: &MappingContext<'_>) -> Option<String> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for HeaderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub(crate) fn validate_header_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName {
            what: "header name",
        });
    }
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName {
        name: name.to_owned(),
    })?;
    Ok(())
}
