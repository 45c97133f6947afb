//! Status enums for various entities.
//!
//! Statuses are stored as lowercase `TEXT` columns, so each enum round-trips
//! through [`std::fmt::Display`] and [`std::str::FromStr`] rather than a
//! database enum type.

use serde::{Deserialize, Serialize};

/// Error returned when a stored status label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Lifecycle status of a laundry order.
///
/// Every order starts as [`OrderStatus::Received`]; later transitions are
/// recorded as order events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Received,
    InProgress,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError {
                kind: "order status",
                value: s.to_owned(),
            }),
        }
    }
}

/// How a user account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Username and password held by this service.
    Local,
    /// Third-party identity assertion (e.g. Google Sign-In).
    Federated,
}

impl AuthProvider {
    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Federated => "federated",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "federated" => Ok(Self::Federated),
            _ => Err(ParseStatusError {
                kind: "auth provider",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_label() {
        for status in [
            OrderStatus::Received,
            OrderStatus::InProgress,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_order_status_default_is_received() {
        assert_eq!(OrderStatus::default(), OrderStatus::Received);
        assert_eq!(OrderStatus::default().to_string(), "received");
    }

    #[test]
    fn test_unknown_labels_are_rejected() {
        assert!("washing machine".parse::<OrderStatus>().is_err());
        assert!("google".parse::<AuthProvider>().is_err());
    }

    #[test]
    fn test_auth_provider_labels() {
        assert_eq!(AuthProvider::Local.to_string(), "local");
        assert_eq!("federated".parse::<AuthProvider>(), Ok(AuthProvider::Federated));
    }
}
