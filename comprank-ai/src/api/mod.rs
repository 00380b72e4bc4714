//! HTTP API handlers for comprank-ai
//!
//! Job endpoints drive the batch one tick per request; the browser page
//! keeps calling `POST /job/tick` until the job reaches a terminal state.

pub mod auth;
pub mod health;
pub mod jobs;
pub mod ui;

pub use auth::{auth_routes, require_session};
pub use health::health_routes;
pub use jobs::job_routes;
pub use ui::ui_routes;
