//! Stock interceptors for the client pipeline.
//!
//! - [`HeaderInterceptor`]: Sets a header on every outgoing request
//! - [`LoggingInterceptor`]: Logs requests and their outcome (feature `tracing`)

mod interceptor;

pub use interceptor::HeaderInterceptor;
#[cfg(feature = "tracing")]
pub use interceptor::LoggingInterceptor;
