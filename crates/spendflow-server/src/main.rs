mod api;
mod config;
mod middleware;

use api::analytics::get_analytics;
use api::auth::{auth_status, login, logout};
use api::chat::chat;
use api::expenses::{delete_expense, extract_expense, list_expenses, save_expense};
use api::state::{AppContext, AppState};
use axum::{
    Router,
    http::{Method, header},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use config::ServerConfig;
use spendflow_ai::llm::{LlmClient, OpenRouterClient};
use spendflow_storage::Storage;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "spendflow is working!".to_string(),
    })
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Streaming chat relay
        .route("/api/chat", post(chat))
        // Expense extraction and persistence
        .route("/api/expenses/extract", post(extract_expense))
        .route("/api/expenses", get(list_expenses).post(save_expense))
        .route("/api/expenses/{id}", delete(delete_expense))
        // Dashboard aggregation
        .route("/api/analytics", get(get_analytics))
        // Session management
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/status", get(auth_status))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spendflow_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting SpendFlow backend server");

    let config = ServerConfig::load().expect("Failed to load server configuration");
    if config.openrouter_api_key.is_empty() {
        tracing::warn!("OPENROUTER_API_KEY is not set; chat and extraction will fail upstream");
    }

    // Storage is created once here and owned by the shared state for the
    // whole process lifetime; it is dropped (and flushed) when the server
    // stops.
    let storage =
        Arc::new(Storage::new(&config.db_path).expect("Failed to initialize expense storage"));

    let llm: Arc<dyn LlmClient> = Arc::new(
        OpenRouterClient::new(config.openrouter_api_key.clone())
            .with_model(config.model.clone())
            .with_site_url(config.site_url.clone()),
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let state: AppState = Arc::new(AppContext {
        storage,
        llm,
        config: config.clone(),
    });

    let router = app(state).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    tracing::info!("SpendFlow running on http://{}", addr);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
