//! Session domain types.

use chrono::{DateTime, Utc};

/// An opaque bearer token handed to the client.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub const fn new(raw: String) -> Self {
        Self(raw)
    }

    /// The raw token for the cookie value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Token to return to the client.
    pub token: SessionToken,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = SessionToken::new("very-secret-token".to_string());
        let debug_output = format!("{token:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-secret-token"));
        assert_eq!(token.as_str(), "very-secret-token");
    }
}
