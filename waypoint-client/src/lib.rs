//! Interceptor pipeline for HTTP clients.
//!
//! This crate runs abstract HTTP requests through an ordered list of
//! interceptors and then a pluggable transport. The actual network exchange
//! is left to a [`Transport`] implementation, so the same pipeline works over
//! hyper, reqwest or an in-memory test double.
//!
//! ## Features
//!
//! - Interceptors that wrap the rest of the pipeline: they can rewrite the
//!   request, post-process the response, retry, or short-circuit
//! - Every failure reported as one [`ClientError`] carrying the request, the
//!   base URL and any response obtained before the failure
//! - Header values redacted from all diagnostics (see [`redaction`])
//! - `tracing` spans and the [`LoggingInterceptor`] (feature `tracing`)
//!
//! ## Example
//!
//! ```ignore
//! use waypoint_client::{Client, FnTransport, HeaderInterceptor, HttpMethod, Request, Response};
//!
//! let transport = FnTransport::new(|request, base_url| {
//!     Box::pin(async move { Ok(Response::new(200).with_body("ok")) })
//! });
//!
//! let client = Client::builder("http://localhost:3000")
//!     .transport(transport)
//!     .with_interceptor(HeaderInterceptor::new("x-trace", "1"))
//!     .build()?;
//!
//! let response = client.send(Request::new("/pets", HttpMethod::Get)).await?;
//! assert_eq!(response.body, "ok");
//! ```
//!
//! ## Ordering
//!
//! For interceptors `[a, b]` the request flows `a -> b -> transport` and the
//! response flows back `transport -> b -> a`.
//!
//! ## Cancellation
//!
//! Dropping the future returned by [`Client::send`] cancels the call. Every
//! interceptor future and the transport future are dropped with it.

mod builder;
mod client;
pub mod config;
mod error;
pub mod interceptor;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::Client;
pub use error::ClientError;

pub use config::HeaderInterceptor;
#[cfg(feature = "tracing")]
pub use config::LoggingInterceptor;
pub use interceptor::{FnInterceptor, Interceptor, InterceptorChain, Next, NextFn};
pub use transport::{FnTransport, Transport};

// Re-export the message model and error taxonomy
pub use waypoint_core::{
    BoxError, Bytes, HeaderField, HttpMethod, InvalidRequestUrl, PrettyError, QueryItem,
    RedactionPolicy, Request, Response, RuntimeError, Uri, redaction,
};

// Re-export futures type used in trait signatures
pub use futures::future::BoxFuture;
