//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`Client`].

use std::fmt;
use std::sync::Arc;

use waypoint_core::{RuntimeError, parse_base_url};

use crate::client::Client;
use crate::interceptor::{Interceptor, InterceptorChain};
use crate::transport::Transport;

/// Builder for creating a [`Client`].
///
/// The base URL is validated and the transport required in
/// [`build`](Self::build); everything else is optional.
///
/// # Example
///
/// ```ignore
/// use waypoint_client::{ClientBuilder, HeaderInterceptor, LoggingInterceptor};
///
/// let client = ClientBuilder::new("http://localhost:3000")
///     .transport(my_transport)
///     .with_interceptor(HeaderInterceptor::new("authorization", "Bearer token"))
///     .with_interceptor(LoggingInterceptor::new())
///     .build()?;
/// ```
pub struct ClientBuilder {
    /// Base URL for the service (e.g., "http://localhost:3000").
    base_url: String,
    /// Transport performing the network exchange.
    transport: Option<Arc<dyn Transport>>,
    /// Interceptors, outermost first.
    interceptors: InterceptorChain,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.is_some())
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// The base URL should include the scheme and host, e.g.
    /// "http://localhost:3000", optionally followed by a path prefix.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            interceptors: InterceptorChain::new(),
        }
    }

    /// Set the transport.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set an already shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Add an interceptor to the end of the chain.
    ///
    /// Interceptors see requests in the order they are added and responses
    /// in the reverse order.
    pub fn with_interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Add an already shared interceptor to the end of the chain.
    pub fn with_shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientBuildError`] if the base URL does not parse or no
    /// transport was set.
    pub fn build(self) -> Result<Client, ClientBuildError> {
        let base_url = parse_base_url(&self.base_url)?;
        let transport = self.transport.ok_or(ClientBuildError::MissingTransport)?;
        Ok(Client::from_parts(base_url, transport, self.interceptors))
    }
}

/// Error that can occur when building a [`Client`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// The base URL could not be parsed.
    #[error(transparent)]
    InvalidBaseUrl(#[from] RuntimeError),

    /// No transport was configured.
    #[error("no transport configured")]
    MissingTransport,
}
