//! Core types for the laundry backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod error_kind;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use error_kind::ErrorKind;
pub use id::*;
pub use status::*;
