//! API key wrapper that keeps credentials out of logs.
//!
//! [`SecretString`] holds a provider API key and makes sure it never shows
//! up in `Debug`/`Display` output or serialized configuration.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder keys shipped in sample configs, e.g. `your-openai-api-key-here`.
const PLACEHOLDER_PREFIX: &str = "your-";
const PLACEHOLDER_SUFFIX: &str = "-here";

/// A credential that should not appear in logs, Debug output, or serialized JSON.
///
/// - `Debug` prints `[REDACTED]` (or `""` if empty)
/// - `Serialize` emits an empty string
/// - `Deserialize` accepts a plain string
/// - [`expose()`](SecretString::expose) returns the inner value for actual use
#[derive(Clone, Default)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap the given value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The actual secret value. Only call this where the key is sent
    /// to a backend (HTTP headers).
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns `true` for sample values like `your-gemini-api-key-here`.
    pub fn is_placeholder(&self) -> bool {
        let v = self.0.trim().to_ascii_lowercase();
        v.starts_with(PLACEHOLDER_PREFIX) && v.ends_with(PLACEHOLDER_SUFFIX)
    }

    /// A key that can actually be sent to a backend.
    pub fn is_usable(&self) -> bool {
        !self.is_empty() && !self.is_placeholder()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "\"[REDACTED]\"")
        }
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "")
        } else {
            write!(f, "[REDACTED]")
        }
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString(s))
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString(s.to_string())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
