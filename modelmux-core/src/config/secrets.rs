//! Redacted credentials
//!
//! Usage-endpoint keys end up inside [`RouterConfig`](super::RouterConfig),
//! which is freely logged. `SecretString` keeps the key out of every
//! formatter; the raw value is only reachable through `expose_secret`.

use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Number of characters kept at each end by [`SecretString::partial_redact`]
const VISIBLE_EDGE: usize = 4;

/// A credential that never prints itself
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for building an `Authorization` header
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Show just enough of the key to tell two keys apart in a log line
    ///
    /// Keys too short to hide at least half their characters are fully
    /// redacted.
    pub fn partial_redact(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.is_empty() {
            return "[EMPTY]".to_string();
        }
        if chars.len() < VISIBLE_EDGE * 4 {
            return REDACTED.to_string();
        }

        let head: String = chars[..VISIBLE_EDGE].iter().collect();
        let tail: String = chars[chars.len() - VISIBLE_EDGE..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatters_never_leak() {
        let key = SecretString::new("mmx-live-0123456789abcdef");
        assert_eq!(key.to_string(), "[REDACTED]");
        assert_eq!(format!("{:?}", Some(&key)), "Some([REDACTED])");
    }

    #[test]
    fn test_partial_redaction_keeps_edges() {
        let key = SecretString::new("mmx-live-0123456789abcdef");
        assert_eq!(key.partial_redact(), "mmx-...cdef");
    }

    #[test]
    fn test_short_keys_are_fully_hidden() {
        assert_eq!(SecretString::new("history-token").partial_redact(), "[REDACTED]");
        assert_eq!(SecretString::from("").partial_redact(), "[EMPTY]");
    }

    #[test]
    fn test_serde_is_transparent() {
        let key: SecretString = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(key.expose_secret(), "abc");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"abc\"");
    }
}
