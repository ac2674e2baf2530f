//! Request and response values.
//!
//! [`Request`] and [`Response`] are plain immutable values: they compare and
//! hash structurally and carry no connection state. They are created per call
//! and handed through the interceptor chain by value.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use http::Uri;
use http::uri::InvalidUri;

use crate::header::{HeaderField, describe_fields};
use crate::method::HttpMethod;

/// Number of body bytes rendered by `Display` before truncation.
pub const MAX_BODY_DESCRIPTION_LEN: usize = 256;

/// Lossy, truncated rendering of a body for log lines.
fn describe_body(body: &[u8]) -> Cow<'_, str> {
    let end = body.len().min(MAX_BODY_DESCRIPTION_LEN);
    String::from_utf8_lossy(&body[..end])
}

/// A query item. Items without a value render as a bare name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A query item with no value, e.g. `?verbose`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

impl fmt::Display for QueryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}

/// An abstract HTTP request.
///
/// `path` is relative to the base URL the client is configured with. No
/// validation or percent-encoding is applied to `path` or `query`.
///
/// # Example
///
/// ```
/// use waypoint_core::{HttpMethod, QueryItem, Request};
///
/// let request = Request::new("/pets", HttpMethod::Get)
///     .with_query(QueryItem::new("limit", "10"))
///     .with_header("Accept", "application/json");
///
/// assert_eq!(request.header("accept"), Some("application/json"));
/// assert_eq!(request.query_string().as_deref(), Some("limit=10"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Request {
    pub path: String,
    pub query: Vec<QueryItem>,
    pub method: HttpMethod,
    pub header_fields: Vec<HeaderField>,
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request with no query, headers or body.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            method,
            header_fields: Vec::new(),
            body: None,
        }
    }

    /// Append a query item.
    pub fn with_query(mut self, item: QueryItem) -> Self {
        self.query.push(item);
        self
    }

    /// Append a header field.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.header_fields.push(HeaderField::new(name, value));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The value of the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        first_header(&self.header_fields, name)
    }

    /// All values of headers named `name`, in order.
    pub fn headers<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.header_fields
            .iter()
            .filter(move |field| field.is_named(name))
            .map(HeaderField::value)
    }

    /// Replace every header named `name` with a single field.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let field = HeaderField::new(name, value);
        self.header_fields.retain(|existing| existing.name() != field.name());
        self.header_fields.push(field);
    }

    /// The query items joined as `a=1&b`, or `None` when there are none.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let items: Vec<String> = self.query.iter().map(ToString::to_string).collect();
        Some(items.join("&"))
    }

    /// Compose the absolute location of this request against `base_url`.
    ///
    /// A trailing `/` on the base URL does not produce a doubled slash.
    ///
    /// ```
    /// use waypoint_core::{HttpMethod, QueryItem, Request, Uri};
    ///
    /// let base: Uri = "https://api.example.com/v1/".parse().unwrap();
    /// let request = Request::new("/pets", HttpMethod::Get)
    ///     .with_query(QueryItem::new("limit", "10"));
    ///
    /// let url = request.url(&base).unwrap();
    /// assert_eq!(url.to_string(), "https://api.example.com/v1/pets?limit=10");
    /// ```
    ///
    /// # Errors
    ///
    /// The base URL is already parsed, so a failure always comes from the
    /// path or query, for instance an unencoded space.
    pub fn url(&self, base_url: &Uri) -> Result<Uri, InvalidRequestUrl> {
        let base = base_url.to_string();
        let mut url = String::with_capacity(base.len() + self.path.len() + 1);
        url.push_str(base.trim_end_matches('/'));
        if !self.path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&self.path);
        if let Some(query) = self.query_string() {
            url.push('?');
            url.push_str(&query);
        }
        url.parse::<Uri>().map_err(|source| InvalidRequestUrl {
            path: self.path.clone(),
            url,
            source,
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "path: {}, query: {}, method: {}, header fields: {}, body (prefix): {}",
            self.path,
            self.query_string().as_deref().unwrap_or("<nil>"),
            self.method,
            describe_fields(&self.header_fields),
            self.body
                .as_deref()
                .map_or(Cow::Borrowed("<nil>"), describe_body),
        )
    }
}

/// A request whose path or query does not form a valid URL.
///
/// Returned by [`Request::url`].
#[derive(Debug, thiserror::Error)]
#[error("Invalid request URL '{url}' composed from path '{path}'")]
pub struct InvalidRequestUrl {
    path: String,
    url: String,
    #[source]
    source: InvalidUri,
}

impl InvalidRequestUrl {
    /// The request path that was composed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full URL string that failed to parse.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// An abstract HTTP response.
///
/// The body is never absent; an empty body means the response had none.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Response {
    pub status_code: u16,
    pub header_fields: Vec<HeaderField>,
    pub body: Bytes,
}

impl Response {
    /// Create a response with no headers and an empty body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            header_fields: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header field.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.header_fields.push(HeaderField::new(name, value));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The value of the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        first_header(&self.header_fields, name)
    }

    /// Replace every header named `name` with a single field.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let field = HeaderField::new(name, value);
        self.header_fields.retain(|existing| existing.name() != field.name());
        self.header_fields.push(field);
    }

    /// Returns whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: {}, header fields: {}, body (prefix): {}",
            self.status_code,
            describe_fields(&self.header_fields),
            describe_body(&self.body),
        )
    }
}

fn first_header<'a>(fields: &'a [HeaderField], name: &str) -> Option<&'a str> {
    let name = name.to_lowercase();
    fields
        .iter()
        .find(|field| field.name() == name)
        .map(HeaderField::value)
}
