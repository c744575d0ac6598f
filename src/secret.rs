//! Secret string handling for sensitive values.
//!
//! [`SecretString`] wraps values like client secrets so they cannot leak
//! through `Debug` or `Display` output, while still serializing
//! transparently as a plain string on the wire (registration responses must
//! carry the real secret exactly once).

use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A string wrapper that redacts its contents in Debug and Display output.
///
/// Serialization is transparent: the underlying value is written as a plain
/// JSON string. Use [`expose()`](SecretString::expose) when the value is
/// actually needed.
///
/// ```rust
/// use mcp_oauth_gate::SecretString;
///
/// let secret = SecretString::new("c2VjcmV0LWJ5dGVz");
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "c2VjcmV0LWJ5dGVz");
/// ```
#[derive(Clone)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Wrap a sensitive value.
    pub fn new(s: impl Into<String>) -> Self {
        Self { value: s.into() }
    }

    /// Access the underlying value.
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let secret = SecretString::new("super-secret");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "super-secret");
    }

    #[test]
    fn test_serializes_transparently() {
        let secret = SecretString::new("abc123");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"abc123\"");

        let back: SecretString = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "abc123");
    }

    #[test]
    fn test_redacted_in_containing_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Registration {
            client_id: String,
            client_secret: SecretString,
        }

        let reg = Registration {
            client_id: "client-1".into(),
            client_secret: SecretString::new("hunter2"),
        };
        let debug = format!("{:?}", reg);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
