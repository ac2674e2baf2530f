//! Display-only redaction of sensitive header values.
//!
//! A [`RedactionPolicy`] is a set of lowercased header names whose values are
//! replaced by [`REDACTED_PLACEHOLDER`] whenever a [`HeaderField`] is rendered
//! for humans (`Display`, `Debug`, log lines). It never changes what goes on
//! the wire, nor how header fields compare or hash.
//!
//! The process-wide policy starts out as [`RedactionPolicy::default`] and can
//! be swapped at any time with [`replace`] or [`set_policy`]. It is the only
//! shared mutable state in the workspace; reads and replacements are
//! serialized by a single mutex.
//!
//! ```
//! use waypoint_core::{HeaderField, redaction};
//!
//! let field = HeaderField::new("Authorization", "secret");
//! assert!(redaction::is_redacted(field.name()));
//! ```
//!
//! [`HeaderField`]: crate::HeaderField

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Text rendered in place of a redacted header value.
pub const REDACTED_PLACEHOLDER: &str = "<redacted>";

/// Header names redacted when no policy has been installed.
pub const DEFAULT_REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "set-cookie"];

/// A set of header names whose values must not be rendered.
///
/// Names are lowercased on insertion, so lookups against the already
/// normalized name of a [`HeaderField`](crate::HeaderField) are a single hash
/// probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedactionPolicy {
    names: HashSet<String>,
}

impl RedactionPolicy {
    /// Create a policy redacting the given header names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// A policy that redacts nothing.
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Returns whether values of the header `name` are redacted.
    pub fn contains(&self, name: &str) -> bool {
        if name.chars().any(char::is_uppercase) {
            self.names.contains(&name.to_lowercase())
        } else {
            self.names.contains(name)
        }
    }

    /// Iterate over the redacted names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REDACTED_HEADERS)
    }
}

static GLOBAL_POLICY: LazyLock<Mutex<RedactionPolicy>> =
    LazyLock::new(|| Mutex::new(RedactionPolicy::default()));

// Rendering must never panic, so a poisoned lock is recovered. The guarded
// value is only ever replaced whole, it cannot be left half-written.
fn lock() -> MutexGuard<'static, RedactionPolicy> {
    GLOBAL_POLICY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A snapshot of the process-wide policy.
pub fn current() -> RedactionPolicy {
    lock().clone()
}

/// Replace the process-wide policy with one redacting exactly `names`.
///
/// Names are normalized before the lock is taken; readers observe either the
/// old set or the new one, never a mix.
pub fn replace<I, S>(names: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    set_policy(RedactionPolicy::new(names));
}

/// Install `policy` as the process-wide policy.
pub fn set_policy(policy: RedactionPolicy) {
    *lock() = policy;
}

/// Restore the process-wide policy to [`DEFAULT_REDACTED_HEADERS`].
pub fn reset() {
    set_policy(RedactionPolicy::default());
}

/// Returns whether the process-wide policy redacts the header `name`.
pub fn is_redacted(name: &str) -> bool {
    lock().contains(name)
}

/// Serializes tests that read or mutate the process-wide policy.
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());
