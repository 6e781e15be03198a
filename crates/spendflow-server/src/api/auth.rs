//! Session-cookie authentication endpoints.
//!
//! A single shared login (configured credentials) issues an HttpOnly cookie
//! whose value is derived from the session secret; the middleware checks it
//! on every protected route.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::api::ApiResponse;
use crate::api::state::AppState;

pub const SESSION_COOKIE: &str = "spendflow_session";

const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Derive the session token from the configured secret.
pub fn session_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"spendflow-session:");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether the request carries a valid session cookie.
pub fn has_valid_session(headers: &HeaderMap, secret: &str) -> bool {
    let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let token = session_token(secret);
    cookies.split(';').map(str::trim).any(|pair| {
        pair.strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .is_some_and(|value| value == token)
    })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}

// POST /api/auth/login
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    if request.username == state.config.auth_username
        && request.password == state.config.auth_password
    {
        let cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE,
            session_token(&state.config.session_secret),
            SESSION_MAX_AGE_SECS,
        );
        tracing::info!(username = %request.username, "login succeeded");
        (
            [(header::SET_COOKIE, cookie)],
            Json(ApiResponse::message("Logged in")),
        )
            .into_response()
    } else {
        tracing::warn!(username = %request.username, "login rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error("Invalid credentials")),
        )
            .into_response()
    }
}

// POST /api/auth/logout
pub async fn logout() -> Response {
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    (
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::message("Logged out")),
    )
        .into_response()
}

// GET /api/auth/status
pub async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<AuthStatus>> {
    Json(ApiResponse::ok(AuthStatus {
        authenticated: has_valid_session(&headers, &state.config.session_secret),
    }))
}
