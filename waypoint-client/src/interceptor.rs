//! Interceptors for the client pipeline.
//!
//! Interceptors add cross-cutting logic around every request, such as:
//! - Adding authentication headers
//! - Logging and metrics
//! - Retry logic
//! - Caching and short-circuiting
//!
//! An interceptor receives the request, the base URL and a [`Next`]
//! continuation standing for the rest of the pipeline. It may call `next`
//! once and return its result, post-process that result, call it several
//! times, or not call it at all and answer by itself.
//!
//! # Ordering
//!
//! For interceptors `[a, b]` the request flows `a -> b -> transport` and the
//! response flows back `transport -> b -> a`: the first interceptor sees the
//! request first and the response last.
//!
//! # Example
//!
//! ```ignore
//! use waypoint_client::{Client, FnInterceptor, HeaderInterceptor};
//!
//! let auth = HeaderInterceptor::new("authorization", "Bearer token123");
//!
//! let timing = FnInterceptor::new(|request, base_url, next| {
//!     Box::pin(async move {
//!         let started = std::time::Instant::now();
//!         let response = next.run(request, base_url).await?;
//!         println!("took {:?}", started.elapsed());
//!         Ok(response)
//!     })
//! });
//!
//! let client = Client::builder("http://localhost:3000")
//!     .transport(my_transport)
//!     .with_interceptor(auth)
//!     .with_interceptor(timing)
//!     .build()?;
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use waypoint_core::{BoxError, Request, Response, Uri};

use crate::ClientError;
use crate::client::CallContext;

/// The signature of one stage of the pipeline.
///
/// Each stage wraps the one after it; the innermost calls the transport.
pub type NextFn =
    Arc<dyn Fn(Request, Uri) -> BoxFuture<'static, Result<Response, ClientError>> + Send + Sync>;

/// The "next" function in the interceptor chain.
///
/// Call [`run`](Self::run) to proceed to the next interceptor or to the
/// transport. It may be called any number of times. Errors it returns are
/// already [`ClientError`]s carrying full context; propagating them with `?`
/// keeps that context intact.
#[derive(Clone)]
pub struct Next {
    inner: NextFn,
    last_response: Arc<Mutex<Option<Response>>>,
}

impl Next {
    pub(crate) fn new(inner: NextFn) -> Self {
        Self {
            inner,
            last_response: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a continuation from a closure.
    ///
    /// Useful for exercising an interceptor on its own, without a client.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(Request, Uri) -> BoxFuture<'static, Result<Response, ClientError>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Arc::new(func))
    }

    /// Continue the pipeline with `request`.
    ///
    /// Each successful response is cloned into a per-call slot so a later
    /// failure of the calling interceptor can report it. The clone copies
    /// the header list; the body is a reference-counted [`Bytes`] and is not
    /// copied. This happens once per layer, so with `n` interceptors a
    /// successful call pays `n` header-list clones.
    ///
    /// [`Bytes`]: waypoint_core::Bytes
    pub async fn run(&self, request: Request, base_url: Uri) -> Result<Response, ClientError> {
        let result = (self.inner)(request, base_url).await;
        if let Ok(response) = &result {
            *self.slot() = Some(response.clone());
        }
        result
    }

    /// The most recent response this continuation produced, if any.
    pub(crate) fn take_last_response(&self) -> Option<Response> {
        self.slot().take()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Response>> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// A unit of logic wrapped around the rest of the pipeline.
///
/// Errors returned from [`intercept`](Self::intercept) are reported to the
/// caller as handler failures naming [`name`](Self::name), unless they are
/// already a [`ClientError`] (for instance one propagated from `next`), which
/// passes through unchanged.
///
/// Implementations must not swallow cancellation: when the returned future
/// is dropped, any in-flight `next` future is dropped with it.
pub trait Interceptor: Send + Sync {
    /// Handle `request`, usually by calling `next`.
    fn intercept(
        &self,
        request: Request,
        base_url: Uri,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, BoxError>>;

    /// A name identifying this interceptor in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// An ordered list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl InterceptorChain {
    /// Create a new empty interceptor chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interceptor to the end of the chain.
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Get the number of interceptors in the chain.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// The interceptors' names, outermost first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.interceptors.iter().map(|interceptor| interceptor.name())
    }

    /// Wrap `terminal` with every interceptor in the chain.
    ///
    /// Interceptors are applied in reverse order so that the first
    /// interceptor added is the first to process the request.
    pub(crate) fn wrap(&self, terminal: NextFn, context: &Arc<CallContext>) -> NextFn {
        let mut wrapped = terminal;
        for interceptor in self.interceptors.iter().rev() {
            wrapped = layer(Arc::clone(interceptor), wrapped, Arc::clone(context));
        }
        wrapped
    }
}

impl From<Vec<Arc<dyn Interceptor>>> for InterceptorChain {
    fn from(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { interceptors }
    }
}

/// Bind `interceptor` around `inner`.
fn layer(interceptor: Arc<dyn Interceptor>, inner: NextFn, context: Arc<CallContext>) -> NextFn {
    Arc::new(move |request, base_url| {
        let interceptor = Arc::clone(&interceptor);
        let context = Arc::clone(&context);
        let next = Next::new(Arc::clone(&inner));
        Box::pin(async move {
            match interceptor.intercept(request, base_url, next.clone()).await {
                Ok(response) => Ok(response),
                Err(error) => {
                    Err(context.handler_error(interceptor.name(), error, next.take_last_response()))
                }
            }
        })
    })
}

/// An interceptor backed by a closure.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::FnInterceptor;
///
/// let logging = FnInterceptor::new(|request, base_url, next| {
///     Box::pin(async move {
///         println!("Calling: {}", request.path);
///         let result = next.run(request, base_url).await;
///         println!("Call completed");
///         Ok(result?)
///     })
/// })
/// .named("logging");
/// ```
pub struct FnInterceptor<F> {
    name: String,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(Request, Uri, Next) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync,
{
    /// Create a new closure-backed interceptor.
    pub fn new(func: F) -> Self {
        Self {
            name: "FnInterceptor".to_owned(),
            func,
        }
    }

    /// Set the name reported when this interceptor fails.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(Request, Uri, Next) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync,
{
    fn intercept(
        &self,
        request: Request,
        base_url: Uri,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, BoxError>> {
        (self.func)(request, base_url, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
