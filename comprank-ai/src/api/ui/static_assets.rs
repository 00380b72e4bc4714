//! Static asset handlers for the comprank-ai UI
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const COMPRANK_CSS: &str = include_str!("../../../static/comprank.css");
const COMPRANK_JS: &str = include_str!("../../../static/comprank.js");

/// GET /static/comprank.css
pub async fn serve_comprank_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        COMPRANK_CSS,
    )
        .into_response()
}

/// GET /static/comprank.js
///
/// Page controller: login, target, upload, tick loop, results
pub async fn serve_comprank_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        COMPRANK_JS,
    )
        .into_response()
}
