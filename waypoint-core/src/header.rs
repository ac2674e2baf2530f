//! Header fields with case-insensitive names.

use std::fmt;

use crate::redaction::{self, REDACTED_PLACEHOLDER, RedactionPolicy};

/// A single HTTP header field.
///
/// The name is lowercased on construction and that is the only place names
/// are normalized: two fields built from `"Content-Type"` and `"content-type"`
/// are equal and hash the same. Original casing is not preserved.
///
/// Rendering with `Display` or `Debug` consults the process-wide
/// [`RedactionPolicy`] at render time, so a field built before the policy
/// changed renders according to the policy in force when it is printed.
///
/// # Example
///
/// ```
/// use waypoint_core::HeaderField;
///
/// let field = HeaderField::new("Content-Type", "application/json");
/// assert_eq!(field.name(), "content-type");
/// assert_eq!(field.to_string(), "content-type: application/json");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HeaderField {
    name: String,
    value: String,
}

impl HeaderField {
    /// Create a header field, lowercasing `name`.
    pub fn new(name: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            value: value.into(),
        }
    }

    /// The normalized (lowercase) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unredacted value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns whether this field is named `name`, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name.to_lowercase()
    }

    /// Consume the field, returning `(name, value)`.
    pub fn into_parts(self) -> (String, String) {
        (self.name, self.value)
    }

    /// Render with an explicit policy instead of the process-wide one.
    ///
    /// ```
    /// use waypoint_core::{HeaderField, RedactionPolicy};
    ///
    /// let field = HeaderField::new("X-Api-Key", "k-123");
    /// let policy = RedactionPolicy::new(["x-api-key"]);
    /// assert_eq!(field.display_with(&policy).to_string(), "x-api-key: <redacted>");
    /// ```
    pub fn display_with<'a>(&'a self, policy: &'a RedactionPolicy) -> DisplayWith<'a> {
        DisplayWith {
            field: self,
            policy,
        }
    }

    fn rendered_value(&self, redacted: bool) -> &str {
        if redacted {
            REDACTED_PLACEHOLDER
        } else {
            &self.value
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = redaction::is_redacted(&self.name);
        write!(f, "{}: {}", self.name, self.rendered_value(redacted))
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = redaction::is_redacted(&self.name);
        f.debug_struct("HeaderField")
            .field("name", &self.name)
            .field("value", &self.rendered_value(redacted))
            .finish()
    }
}

/// Rendering of a [`HeaderField`] against a caller-supplied policy.
///
/// Returned by [`HeaderField::display_with`].
#[derive(Clone, Copy)]
pub struct DisplayWith<'a> {
    field: &'a HeaderField,
    policy: &'a RedactionPolicy,
}

impl fmt::Display for DisplayWith<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self.policy.contains(&self.field.name);
        write!(
            f,
            "{}: {}",
            self.field.name,
            self.field.rendered_value(redacted)
        )
    }
}

/// Render a list of fields as `[a: 1, b: 2]` using the process-wide policy.
pub(crate) fn describe_fields(fields: &[HeaderField]) -> String {
    let rendered: Vec<String> = fields.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
