//! Password gate for the job endpoints
//!
//! POST /auth/login, POST /auth/logout, GET /auth/status. When no password
//! digest is configured every request is let through.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use comprank_common::api::{verify_password, PasswordError, SESSION_COOKIE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /auth/login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Login state as seen by the caller
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    /// Whether a password is configured
    pub required: bool,
    /// Whether this request carries a valid session
    pub authenticated: bool,
}

/// POST /auth/login
///
/// Sets the session cookie on success, 401 on a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Response> {
    let Some(expected) = state.password_sha256.as_deref() else {
        return Ok(Json(AuthStatusResponse {
            required: false,
            authenticated: true,
        })
        .into_response());
    };

    match verify_password(&request.password, expected) {
        Ok(()) => {}
        Err(PasswordError::Incorrect) => {
            tracing::warn!("Rejected login with an incorrect password");
            return Err(ApiError::Unauthorized("Password incorrect".to_string()));
        }
        Err(e @ PasswordError::MalformedDigest) => {
            tracing::error!("Login impossible: {}", e);
            return Err(ApiError::Internal(e.to_string()));
        }
    }

    let token = Uuid::new_v4();
    state.sessions.write().await.insert(token);
    tracing::info!("Session opened");

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, token
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthStatusResponse {
            required: true,
            authenticated: true,
        }),
    )
        .into_response())
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.write().await.remove(&token);
    }

    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE);
    (
        [(header::SET_COOKIE, cookie)],
        Json(AuthStatusResponse {
            required: state.password_sha256.is_some(),
            authenticated: state.password_sha256.is_none(),
        }),
    )
        .into_response()
}

/// GET /auth/status
pub async fn auth_status(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthStatusResponse> {
    let required = state.password_sha256.is_some();
    let authenticated = !required || has_session(&state, &headers).await;
    Json(AuthStatusResponse {
        required,
        authenticated,
    })
}

/// Reject requests without a valid session when a password is configured
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.password_sha256.is_none() || has_session(&state, request.headers()).await {
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized(
        "Log in before using the job endpoints".to_string(),
    ))
}

async fn has_session(state: &AppState, headers: &HeaderMap) -> bool {
    match session_token(headers) {
        Some(token) => state.sessions.read().await.contains(&token),
        None => false,
    }
}

/// Session token from the `Cookie` header(s), if present and well formed
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/status", get(auth_status))
}
