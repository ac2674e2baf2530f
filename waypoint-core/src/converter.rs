//! Validation helpers for code that turns domain calls into messages.
//!
//! The pipeline itself never validates requests or responses. These helpers
//! are for the surrounding application (typically generated code) and report
//! failures through the matching [`RuntimeError`] variant.

use std::any::type_name;
use std::str::FromStr;

use bytes::Bytes;
use http::Uri;

use crate::error::RuntimeError;
use crate::message::{QueryItem, Request, Response};

/// Parse a base URL string.
///
/// Relative references such as `/api` are accepted; empty strings and
/// anything `http::Uri` rejects are not.
///
/// ```
/// use waypoint_core::{RuntimeError, parse_base_url};
///
/// assert!(parse_base_url("https://api.example.com/v1").is_ok());
/// assert!(matches!(parse_base_url("http://exa mple.com"), Err(RuntimeError::InvalidBaseUrl(_))));
/// ```
pub fn parse_base_url(raw: &str) -> Result<Uri, RuntimeError> {
    if raw.trim().is_empty() {
        return Err(RuntimeError::InvalidBaseUrl(raw.to_owned()));
    }
    raw.parse()
        .map_err(|_| RuntimeError::InvalidBaseUrl(raw.to_owned()))
}

/// Substitute `{name}` placeholders in a path template.
///
/// Every placeholder must have a parameter; parameters without a placeholder
/// are ignored. An unterminated `{` is copied verbatim.
///
/// ```
/// use waypoint_core::render_path;
///
/// let path = render_path("/pets/{petId}/toys/{toyId}", &[("petId", "7"), ("toyId", "3")]).unwrap();
/// assert_eq!(path, "/pets/7/toys/3");
/// ```
pub fn render_path(template: &str, params: &[(&str, &str)]) -> Result<String, RuntimeError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let name = &after[..close];
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| RuntimeError::MissingRequiredPathParameter(name.to_owned()))?;
        out.push_str(value);
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// The media type of a `Content-Type`/`Accept` entry, without parameters.
fn essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn accepts(range: &str, content_type: &str) -> bool {
    if range == "*/*" || range == content_type {
        return true;
    }
    match (range.strip_suffix("/*"), content_type.split_once('/')) {
        (Some(range_type), Some((content_type, _))) => range_type == content_type,
        _ => false,
    }
}

impl Request {
    /// The value of the header `name`, or an error if it is absent.
    pub fn require_header(&self, name: &str) -> Result<&str, RuntimeError> {
        self.header(name)
            .ok_or_else(|| RuntimeError::MissingRequiredHeaderField(name.to_lowercase()))
    }

    /// The first query item named `name`, or an error if there is none.
    pub fn require_query(&self, name: &str) -> Result<&QueryItem, RuntimeError> {
        self.query
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| RuntimeError::MissingRequiredQueryParameter(name.to_owned()))
    }

    /// The body, or an error if the request has none.
    pub fn require_body(&self) -> Result<&Bytes, RuntimeError> {
        self.body
            .as_ref()
            .ok_or(RuntimeError::MissingRequiredRequestBody)
    }

    /// Check that the request's `Accept` header, if any, admits `content_type`.
    ///
    /// A request without `Accept` accepts everything. Ranges such as `*/*`
    /// and `text/*` are honored; quality parameters are ignored.
    pub fn validate_accept(&self, content_type: &str) -> Result<(), RuntimeError> {
        let content_type = essence(content_type);
        let mut present = false;
        for value in self.headers("accept") {
            present = true;
            if value
                .split(',')
                .map(essence)
                .any(|range| accepts(&range, &content_type))
            {
                return Ok(());
            }
        }
        if present {
            let values: Vec<&str> = self.headers("accept").collect();
            return Err(RuntimeError::UnexpectedAcceptHeader(values.join(", ")));
        }
        Ok(())
    }
}

impl Response {
    /// The value of the header `name`, or an error if it is absent.
    pub fn require_header(&self, name: &str) -> Result<&str, RuntimeError> {
        self.header(name)
            .ok_or_else(|| RuntimeError::MissingRequiredHeaderField(name.to_lowercase()))
    }

    /// Parse the header `name` as `T`, returning `None` if it is absent.
    pub fn header_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, RuntimeError> {
        self.header(name)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| RuntimeError::FailedToDecodeStringConvertibleValue {
                        type_name: type_name::<T>().to_owned(),
                    })
            })
            .transpose()
    }

    /// Parse the header `name` as `T`, failing if it is absent.
    pub fn require_header_as<T: FromStr>(&self, name: &str) -> Result<T, RuntimeError> {
        self.header_as(name)?
            .ok_or_else(|| RuntimeError::MissingRequiredHeaderField(name.to_lowercase()))
    }

    /// Check that `Content-Type` names `expected`, ignoring parameters and case.
    pub fn expect_content_type(&self, expected: &str) -> Result<(), RuntimeError> {
        let actual = self.header("content-type").unwrap_or_default();
        if essence(actual) == essence(expected) {
            Ok(())
        } else {
            Err(RuntimeError::UnexpectedContentTypeHeader(actual.to_owned()))
        }
    }
}
