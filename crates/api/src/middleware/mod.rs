//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. `CorsLayer` (frontend origin with credentials)
//!
//! Authentication is per-handler through the [`RequireUser`] extractor.

pub mod auth;
pub mod session;

pub use auth::{RequireUser, SessionCookie};
pub use session::{
    SESSION_COOKIE, read_session_token, removal_cookie, session_cookie, set_cookie_header,
};
