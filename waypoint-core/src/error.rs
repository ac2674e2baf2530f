//! The internal error taxonomy.
//!
//! [`RuntimeError`] names *why* something failed before the pipeline wraps it
//! into a client-facing error. The variants are diagnostic only: nothing in
//! the pipeline branches on which one occurred.

use std::error::Error as StdError;

/// A boxed, thread-safe error of any type.
///
/// Transports and interceptors fail with this; the pipeline never needs to
/// know their concrete error types.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure reasons raised by the pipeline and its converter helpers.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A base URL string could not be parsed.
    #[error("Invalid base URL string: '{0}'")]
    InvalidBaseUrl(String),

    /// A string could not be converted into the expected type.
    #[error("Failed to decode a value of type '{type_name}'")]
    FailedToDecodeStringConvertibleValue { type_name: String },

    #[error("Missing required header field named: {0}")]
    MissingRequiredHeaderField(String),

    #[error("Missing required path parameter named: {0}")]
    MissingRequiredPathParameter(String),

    #[error("Missing required query parameter named: {0}")]
    MissingRequiredQueryParameter(String),

    #[error("Missing required request body")]
    MissingRequiredRequestBody,

    #[error("Unexpected Content-Type header: {0}")]
    UnexpectedContentTypeHeader(String),

    #[error("Unexpected Accept header: {0}")]
    UnexpectedAcceptHeader(String),

    /// The transport failed to produce a response.
    #[error("Transport failed with error: {0}")]
    TransportFailed(#[source] BoxError),

    /// User-supplied interceptor logic failed.
    #[error("Handler \"{handler}\" failed with error: {source}")]
    HandlerFailed {
        handler: String,
        #[source]
        source: BoxError,
    },
}

impl RuntimeError {
    /// Wrap a transport error.
    pub fn transport_failed(error: impl Into<BoxError>) -> Self {
        RuntimeError::TransportFailed(error.into())
    }

    /// Wrap an error raised by the handler named `handler`.
    pub fn handler_failed(handler: impl Into<String>, error: impl Into<BoxError>) -> Self {
        RuntimeError::HandlerFailed {
            handler: handler.into(),
            source: error.into(),
        }
    }
}

/// Errors that know how to render a fuller diagnostic than their `Display`.
pub trait PrettyError: StdError {
    /// A human-readable description including any nested causes.
    fn pretty_description(&self) -> String;
}

impl PrettyError for RuntimeError {
    fn pretty_description(&self) -> String {
        let mut out = self.to_string();
        // The direct source is already part of `Display` for the wrapping variants
        let mut cause = self.source().and_then(|err| err.source());
        while let Some(err) = cause {
            out.push_str(", caused by: ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}

/// Render an arbitrary error for diagnostics.
///
/// Errors implementing [`PrettyError`] that this crate knows about render
/// through it; everything else falls back to `Display`.
pub fn render_error(error: &(dyn StdError + 'static)) -> String {
    match error.downcast_ref::<RuntimeError>() {
        Some(runtime) => runtime.pretty_description(),
        None => error.to_string(),
    }
}
