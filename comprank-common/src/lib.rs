//! # comprank Common Library
//!
//! Shared code for the comprank services:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Password gate helpers

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
