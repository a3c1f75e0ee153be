//! Health check endpoint.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
