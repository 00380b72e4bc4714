//! Shared HTTP API helpers
//!
//! Contains only pure functions; services wrap them with their own
//! framework-specific handlers.

pub mod auth;

pub use auth::{hash_password, verify_password, PasswordError, SESSION_COOKIE};
