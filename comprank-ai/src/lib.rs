//! comprank-ai library interface
//!
//! Rates each row of an uploaded deal table against a target company
//! description, one row per tick, and serves the sorted result.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult, JobError};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::services::SimilarityRater;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool holding the current job
    pub db: SqlitePool,
    /// Rater used by every tick
    pub rater: Arc<SimilarityRater>,
    /// Held across load → mutate → save so ticks never overlap
    pub job_lock: Arc<Mutex<()>>,
    /// Hex SHA-256 of the access password; None leaves the service open
    pub password_sha256: Option<String>,
    /// Session tokens issued by a successful login
    pub sessions: Arc<RwLock<HashSet<Uuid>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, rater: SimilarityRater) -> Self {
        Self {
            db,
            rater: Arc::new(rater),
            job_lock: Arc::new(Mutex::new(())),
            password_sha256: None,
            sessions: Arc::new(RwLock::new(HashSet::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Require a password (hex SHA-256 digest) for the job endpoints
    pub fn with_password_sha256(mut self, digest: Option<String>) -> Self {
        self.password_sha256 = digest;
        self
    }

    /// Remember `message` for the health endpoint
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::auth_routes())
        .merge(api::job_routes(state.clone()))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
