//! The transport capability.
//!
//! A [`Transport`] performs the actual network exchange. The pipeline treats
//! it as opaque: it hands over a [`Request`] and the base URL and expects a
//! [`Response`] or an error back. Concrete implementations (backed by hyper,
//! reqwest, a test double...) live outside this crate.
//!
//! # Example
//!
//! ```ignore
//! use waypoint_client::{BoxError, BoxFuture, Request, Response, Transport, Uri};
//!
//! struct Fixed;
//!
//! impl Transport for Fixed {
//!     fn send(&self, _request: Request, _base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>> {
//!         Box::pin(async { Ok(Response::new(200).with_body("ok")) })
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use waypoint_core::{BoxError, Request, Response, Uri};

/// Sends a request and produces its response.
///
/// Implementations may fail with any error; the pipeline wraps it as a
/// transport failure before anything else sees it. Dropping the returned
/// future cancels the exchange.
pub trait Transport: Send + Sync {
    /// Send `request` relative to `base_url`.
    ///
    /// [`Request::url`] composes the absolute location.
    fn send(&self, request: Request, base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request, base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>> {
        (**self).send(request, base_url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request, base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>> {
        (**self).send(request, base_url)
    }
}

/// A transport backed by a closure.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{FnTransport, Response};
///
/// let transport = FnTransport::new(|request, _base_url| {
///     Box::pin(async move { Ok(Response::new(200).with_body(request.path)) })
/// });
/// ```
pub struct FnTransport<F> {
    func: F,
}

impl<F> FnTransport<F>
where
    F: Fn(Request, Uri) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync,
{
    /// Create a new closure-backed transport.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(Request, Uri) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync,
{
    fn send(&self, request: Request, base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>> {
        (self.func)(request, base_url)
    }
}
