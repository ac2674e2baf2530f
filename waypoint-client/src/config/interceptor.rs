//! Stock interceptors.
//!
//! # Example
//!
//! ```ignore
//! use waypoint_client::{Client, HeaderInterceptor, LoggingInterceptor};
//!
//! let client = Client::builder("http://localhost:3000")
//!     .transport(my_transport)
//!     .with_interceptor(HeaderInterceptor::new("x-trace", "1"))
//!     .with_interceptor(LoggingInterceptor::new())
//!     .build()?;
//! ```

use futures::future::BoxFuture;
use waypoint_core::{BoxError, HeaderField, Request, Response, Uri};

use crate::interceptor::{Interceptor, Next};

// ============================================================================
// Header Interceptor
// ============================================================================

/// A simple interceptor that sets a header on all requests.
///
/// An existing header with the same name (in any case) is replaced.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::HeaderInterceptor;
///
/// let auth = HeaderInterceptor::new("authorization", "Bearer token123");
/// let client = Client::builder("http://localhost:3000")
///     .transport(my_transport)
///     .with_interceptor(auth)
///     .build()?;
/// ```
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    field: HeaderField,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    pub fn new(name: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self::from_field(HeaderField::new(name, value))
    }

    /// Create a new header interceptor from an existing field.
    pub fn from_field(field: HeaderField) -> Self {
        Self { field }
    }

    /// The header this interceptor sets.
    pub fn field(&self) -> &HeaderField {
        &self.field
    }
}

impl Interceptor for HeaderInterceptor {
    fn intercept(
        &self,
        mut request: Request,
        base_url: Uri,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, BoxError>> {
        request.set_header(self.field.name(), self.field.value());
        Box::pin(async move { Ok(next.run(request, base_url).await?) })
    }

    fn name(&self) -> &str {
        "HeaderInterceptor"
    }
}

// ============================================================================
// Logging Interceptor
// ============================================================================

/// Logs every request and its outcome through `tracing`.
///
/// The request and response are rendered with their `Display`
/// implementations, so header values in the redaction policy never reach the
/// logs. Errors from the rest of the pipeline are passed on unchanged.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingInterceptor;

#[cfg(feature = "tracing")]
impl LoggingInterceptor {
    /// Create a new logging interceptor.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "tracing")]
impl Interceptor for LoggingInterceptor {
    fn intercept(
        &self,
        request: Request,
        base_url: Uri,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, BoxError>> {
        Box::pin(async move {
            tracing::info!(
                method = %request.method,
                path = %request.path,
                base_url = %base_url,
                "sending request"
            );
            tracing::debug!(request = %request, "request details");

            let started = std::time::Instant::now();
            match next.run(request, base_url).await {
                Ok(response) => {
                    tracing::info!(
                        status = response.status_code,
                        elapsed = ?started.elapsed(),
                        "received response"
                    );
                    tracing::debug!(response = %response, "response details");
                    Ok(response)
                }
                Err(error) => {
                    tracing::warn!(error = %error, elapsed = ?started.elapsed(), "request failed");
                    Err(BoxError::from(error))
                }
            }
        })
    }

    fn name(&self) -> &str {
        "LoggingInterceptor"
    }
}
