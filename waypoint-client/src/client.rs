//! The pipeline runner.
//!
//! This module provides the main [`Client`] type, which sends each request
//! through the configured interceptors to the transport.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use waypoint_core::{BoxError, Request, Response, RuntimeError, Uri};

use crate::ClientError;
use crate::builder::ClientBuilder;
use crate::interceptor::{Interceptor, InterceptorChain, NextFn};
use crate::transport::Transport;

/// Source of the ids that tie a [`ClientError`] to the call that raised it.
static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(0);

/// What a single `send` was called with, kept for error reports.
#[derive(Debug)]
pub(crate) struct CallContext {
    id: u64,
    request: Request,
    base_url: Uri,
}

impl CallContext {
    fn new(request: Request, base_url: Uri) -> Self {
        Self {
            id: NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed),
            request,
            base_url,
        }
    }

    fn wrap(&self, response: Option<Response>, reason: RuntimeError) -> ClientError {
        ClientError::new(
            Some(self.request.clone()),
            Some(self.base_url.clone()),
            response,
            reason,
        )
        .for_call(self.id)
    }

    /// Any transport error, including a `ClientError` from another client,
    /// is a transport failure of this call.
    pub(crate) fn transport_error(&self, error: BoxError) -> ClientError {
        #[cfg(feature = "tracing")]
        tracing::debug!(error = %error, path = %self.request.path, "transport failed");
        self.wrap(None, RuntimeError::TransportFailed(error))
    }

    pub(crate) fn handler_error(
        &self,
        handler: &str,
        error: BoxError,
        response: Option<Response>,
    ) -> ClientError {
        #[cfg(feature = "tracing")]
        tracing::debug!(handler, error = %error, path = %self.request.path, "interceptor failed");

        // Raised further down this same call: the context is already right
        let source: BoxError = match error.downcast::<ClientError>() {
            Ok(mut client_error) if client_error.call_id() == Some(self.id) => {
                client_error.fill_response(response);
                return *client_error;
            }
            Ok(foreign) => foreign,
            Err(error) => error,
        };
        self.wrap(
            response,
            RuntimeError::HandlerFailed {
                handler: handler.to_owned(),
                source,
            },
        )
    }
}

/// An HTTP client that runs every request through an interceptor pipeline.
///
/// The client owns a base URL, one [`Transport`] and an ordered list of
/// [`Interceptor`]s, all fixed at construction. It keeps no per-call state,
/// so one instance (or its clones) can serve any number of concurrent
/// [`send`](Self::send) calls.
///
/// Use [`Client::builder`] or [`Client::new`] to create an instance.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{Client, HeaderInterceptor, HttpMethod, Request};
///
/// let client = Client::builder("http://localhost:3000")
///     .transport(my_transport)
///     .with_interceptor(HeaderInterceptor::new("x-trace", "1"))
///     .build()?;
///
/// let response = client.send(Request::new("/pets", HttpMethod::Get)).await?;
/// println!("status: {}", response.status_code);
/// ```
///
/// # Cancellation
///
/// Dropping the future returned by `send` drops every interceptor future
/// and the transport future beneath it. Nothing in the pipeline intercepts
/// or delays that.
#[derive(Clone)]
pub struct Client {
    base_url: Uri,
    transport: Arc<dyn Transport>,
    interceptors: InterceptorChain,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// This is a convenience method equivalent to `ClientBuilder::new(base_url)`.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Create a client from an already parsed base URL.
    ///
    /// `interceptors` run in the given order on the way out.
    pub fn new<T>(base_url: Uri, transport: T, interceptors: Vec<Arc<dyn Interceptor>>) -> Self
    where
        T: Transport + 'static,
    {
        Self::from_parts(base_url, Arc::new(transport), interceptors.into())
    }

    pub(crate) fn from_parts(
        base_url: Uri,
        transport: Arc<dyn Transport>,
        interceptors: InterceptorChain,
    ) -> Self {
        Self {
            base_url,
            transport,
            interceptors,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Uri {
        &self.base_url
    }

    /// Get the interceptor chain.
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Send `request` through the interceptors and the transport.
    ///
    /// On success the response produced by the composed chain is returned
    /// unmodified. The client performs no retries, timeouts or validation of
    /// its own.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] carrying `request`, the base URL and, when
    /// one was obtained before the failure, the response, if:
    /// - The transport fails ([`RuntimeError::TransportFailed`])
    /// - An interceptor fails ([`RuntimeError::HandlerFailed`])
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "http.client.send",
            http.method = %request.method,
            http.path = %request.path,
            otel.kind = "client",
        );

        let response = self.dispatch(request);
        #[cfg(feature = "tracing")]
        let response = tracing::Instrument::instrument(response, span);
        response.await
    }

    async fn dispatch(&self, request: Request) -> Result<Response, ClientError> {
        let context = Arc::new(CallContext::new(request.clone(), self.base_url.clone()));
        let chain = self
            .interceptors
            .wrap(self.terminal(Arc::clone(&context)), &context);
        chain(request, self.base_url.clone()).await
    }

    /// The innermost stage: hand the request to the transport.
    fn terminal(&self, context: Arc<CallContext>) -> NextFn {
        let transport = Arc::clone(&self.transport);
        Arc::new(move |request, base_url| {
            let transport = Arc::clone(&transport);
            let context = Arc::clone(&context);
            Box::pin(async move {
                transport
                    .send(request, base_url)
                    .await
                    .map_err(|error| context.transport_error(error))
            })
        })
    }
}
