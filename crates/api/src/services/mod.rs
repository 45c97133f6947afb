//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Local and federated login, registration, logout
//! - `identity` - Federated identity token verification
//! - `inventory` - Product catalog and stock adjustments
//! - `orders` - Atomic order creation and read-back
//! - `sessions` - Opaque session token lifecycle
//!
//! Services borrow the pool and are cheap to construct per request.

pub mod auth;
pub mod identity;
pub mod inventory;
pub mod orders;
pub mod sessions;

pub use auth::{AuthError, AuthService, Authenticated, BootstrapOutcome};
pub use identity::{GoogleTokenVerifier, IdentityClaims, IdentityVerifier};
pub use inventory::{InventoryError, InventoryService};
pub use orders::{OrderError, OrderService};
pub use sessions::{SessionError, SessionManager};
