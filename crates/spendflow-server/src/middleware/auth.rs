//! Session gate for the API surface.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::api::auth::has_valid_session;
use crate::api::state::AppState;

/// Routes reachable without a session.
const PUBLIC_PATHS: &[&str] = &["/api/auth/login", "/api/auth/status"];

pub async fn session_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api") || PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
        return next.run(req).await;
    }

    if has_valid_session(req.headers(), &state.config.session_secret) {
        return next.run(req).await;
    }

    unauthorized()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "message": "Authentication required"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use spendflow_ai::llm::MockLlmClient;
    use spendflow_storage::Storage;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::auth::{SESSION_COOKIE, session_token};
    use crate::api::state::AppContext;
    use crate::config::ServerConfig;

    async fn probe() -> &'static str {
        "ok"
    }

    fn test_app() -> (tempfile::TempDir, Router, String) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Arc::new(Storage::new(db_path.to_str().unwrap()).unwrap());

        let config = ServerConfig::test_defaults();
        let token = session_token(&config.session_secret);

        let state: AppState = Arc::new(AppContext {
            storage,
            llm: Arc::new(MockLlmClient::new("mock")),
            config,
        });

        let app = Router::new()
            .route("/api/expenses", get(probe))
            .route("/api/auth/login", get(probe))
            .route("/health", get(probe))
            .layer(from_fn_with_state(state.clone(), session_middleware))
            .with_state(state);

        (temp_dir, app, token)
    }

    async fn get_status(app: Router, uri: &str, cookie: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let (_dir, app, _token) = test_app();
        assert_eq!(
            get_status(app, "/api/expenses", None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_cookie_passes() {
        let (_dir, app, token) = test_app();
        let cookie = format!("{}={}", SESSION_COOKIE, token);
        assert_eq!(
            get_status(app, "/api/expenses", Some(&cookie)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_public_routes_bypass_the_gate() {
        let (_dir, app, _token) = test_app();
        assert_eq!(
            get_status(app.clone(), "/api/auth/login", None).await,
            StatusCode::OK
        );
        assert_eq!(get_status(app, "/health", None).await, StatusCode::OK);
    }
}
