//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use laundry_core::{AuthProvider, Email, UserId};

/// A staff account.
///
/// Password hashes never leave the repository layer, so this type is safe to
/// serialize in responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name. `None` only for federated accounts created without one.
    pub username: Option<String>,
    /// Email address, if known.
    pub email: Option<Email>,
    /// Stable subject identifier from the federated identity provider.
    #[serde(skip_serializing)]
    pub federated_subject: Option<String>,
    /// Inactive users cannot log in and their sessions stop validating.
    pub active: bool,
    /// How this account authenticates.
    pub auth_provider: AuthProvider,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may currently authenticate.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Name to show in logs and the UI.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or_else(|| self.email.as_ref().map(Email::as_str))
            .unwrap_or("unnamed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: Option<&str>, email: Option<&str>) -> User {
        User {
            id: UserId::new(1),
            username: username.map(str::to_string),
            email: email.and_then(|e| Email::parse(e).ok()),
            federated_subject: None,
            active: true,
            auth_provider: AuthProvider::Local,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_username_then_email() {
        assert_eq!(user(Some("ana"), Some("ana@x.example")).display_name(), "ana");
        assert_eq!(user(None, Some("ana@x.example")).display_name(), "ana@x.example");
        assert_eq!(user(None, None).display_name(), "unnamed");
    }
}
