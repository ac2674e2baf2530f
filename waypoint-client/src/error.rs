//! The error returned at the pipeline boundary.
//!
//! This module provides [`ClientError`], the only error type
//! [`Client::send`](crate::Client::send) returns.

use std::error::Error as StdError;
use std::fmt;

use waypoint_core::{BoxError, Request, Response, RuntimeError, Uri, render_error};

/// A pipeline failure together with whatever context was available.
///
/// A field that is `None` means that stage was never reached: no response
/// was produced before the failure, for instance. After
/// [`Client::send`](crate::Client::send) the request and base URL are always
/// present; the request is the one the caller passed in, not a copy an
/// interceptor may have rewritten.
///
/// Callers discriminate the root cause through [`underlying`](Self::underlying)
/// or [`runtime_error`](Self::runtime_error).
///
/// # Example
///
/// ```ignore
/// match client.send(request).await {
///     Ok(response) => println!("{response}"),
///     Err(err) if err.is_transport_failure() => eprintln!("network: {err}"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
#[derive(Debug)]
pub struct ClientError {
    request: Option<Request>,
    base_url: Option<Uri>,
    response: Option<Response>,
    underlying: BoxError,
    /// The `send` call that raised this error, if the pipeline built it.
    call_id: Option<u64>,
}

impl ClientError {
    /// Create a client error from its parts.
    pub fn new(
        request: Option<Request>,
        base_url: Option<Uri>,
        response: Option<Response>,
        underlying: impl Into<BoxError>,
    ) -> Self {
        Self {
            request,
            base_url,
            response,
            underlying: underlying.into(),
            call_id: None,
        }
    }

    pub(crate) fn for_call(mut self, call_id: u64) -> Self {
        self.call_id = Some(call_id);
        self
    }

    pub(crate) fn call_id(&self) -> Option<u64> {
        self.call_id
    }

    /// Attach `response` unless a response is already recorded.
    pub(crate) fn fill_response(&mut self, response: Option<Response>) {
        if self.response.is_none() {
            self.response = response;
        }
    }

    /// The request the failing call was made with.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// The base URL the failing call was made against.
    pub fn base_url(&self) -> Option<&Uri> {
        self.base_url.as_ref()
    }

    /// The response obtained before the failure, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// The error that caused the failure.
    pub fn underlying(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.underlying.as_ref()
    }

    /// The underlying error as a [`RuntimeError`], when it is one.
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        self.underlying.downcast_ref()
    }

    /// Consume the error, returning the underlying cause.
    pub fn into_underlying(self) -> BoxError {
        self.underlying
    }

    /// Returns whether the transport failed to produce a response.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.runtime_error(), Some(RuntimeError::TransportFailed(_)))
    }

    /// Returns whether an interceptor raised the failure.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self.runtime_error(), Some(RuntimeError::HandlerFailed { .. }))
    }
}

fn write_or_nil<T: fmt::Display>(f: &mut fmt::Formatter<'_>, value: Option<&T>) -> fmt::Result {
    match value {
        Some(value) => write!(f, "{value}"),
        None => f.write_str("<nil>"),
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Client error - request: ")?;
        write_or_nil(f, self.request.as_ref())?;
        f.write_str(", baseURL: ")?;
        write_or_nil(f, self.base_url.as_ref())?;
        f.write_str(", response: ")?;
        write_or_nil(f, self.response.as_ref())?;
        write!(f, ", underlying error: {}", render_error(self.underlying()))
    }
}

impl StdError for ClientError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let underlying: &(dyn StdError + 'static) = self.underlying();
        Some(underlying)
    }
}
