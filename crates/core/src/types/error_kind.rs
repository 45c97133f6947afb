//! Stable error classification shared by every service.

use serde::{Deserialize, Serialize};

/// The externally visible kind of a failed operation.
///
/// Services attach one of these to every error so the HTTP adapter can map
/// failures without inspecting service-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range caller data. Nothing was written.
    InvalidInput,
    /// Identity could not be established.
    Unauthorized,
    /// Identity established but disallowed by policy.
    Forbidden,
    /// A uniqueness constraint was violated.
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
    /// The backing store could not be reached.
    Unavailable,
    /// Unexpected failure; details are logged, never returned.
    Internal,
}

impl ErrorKind {
    /// Snake-case label used in error response bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }

    /// Whether errors of this kind must be hidden from callers and logged.
    #[must_use]
    pub const fn is_server_fault(self) -> bool {
        matches!(self, Self::Unavailable | Self::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
