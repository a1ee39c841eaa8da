//! Proxy service routes

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::{auth, state::AppState, substitutions};

/// Create the router for the proxy service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth", post(auth::login).delete(auth::logout))
        .route("/api/auth/status", get(auth::status))
        .route("/api/substitutions", get(substitutions::get_substitutions))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "proxy"
    }))
}
