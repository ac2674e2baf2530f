//! Core types for the waypoint HTTP client pipeline.
//!
//! This crate provides the transport-neutral values shared by the pipeline
//! runner (`waypoint-client`) and by transport and interceptor implementors.
//!
//! ## Modules
//!
//! - [`header`]: Header fields with case-insensitive names
//! - [`redaction`]: Display-only masking of sensitive header values
//! - [`message`]: Request and response values
//! - [`method`]: The closed set of HTTP methods
//! - [`error`]: The internal error taxonomy
//! - [`converter`]: Helpers that validate messages and produce taxonomy errors

pub mod converter;
pub mod error;
pub mod header;
pub mod message;
pub mod method;
pub mod redaction;

pub use converter::{parse_base_url, render_path};
pub use error::{BoxError, PrettyError, RuntimeError, render_error};
pub use header::HeaderField;
pub use message::{InvalidRequestUrl, MAX_BODY_DESCRIPTION_LEN, QueryItem, Request, Response};
pub use method::HttpMethod;
pub use redaction::RedactionPolicy;

// Re-export types that appear in public signatures
pub use bytes::Bytes;
pub use http::Uri;
