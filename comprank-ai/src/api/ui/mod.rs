//! UI Routes - single-page interface for comprank-ai
//!
//! Vanilla ES6+, no frameworks. The page drives the job itself: it calls
//! `POST /job/tick` in a loop and re-reads `/job/status` on load, so a
//! refresh picks the batch up where the last persisted tick left it.
//!
//! - **Static Assets** (`static_assets`): CSS/JS file serving
//! - **Root Page** (`root`): login, target form, upload, progress, results

use axum::{routing::get, Router};

use crate::AppState;

mod root;
mod static_assets;

use root::root_page;
use static_assets::{serve_comprank_css, serve_comprank_js};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/comprank.css", get(serve_comprank_css))
        .route("/static/comprank.js", get(serve_comprank_js))
}
