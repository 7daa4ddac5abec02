//! Axum Router Configuration
//!
//! The service exposes exactly two paths: the WebSocket upgrade endpoint for
//! interview sessions and a liveness check. Everything else is a 404.

use crate::{state::AppState, ws::ws_handler};
use axum::{Json, Router, routing::get};
use serde_json::json;
use std::sync::Arc;

pub const SERVICE_NAME: &str = "interview-relay";

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/interview", get(ws_handler))
        .route("/health", get(health))
        .with_state(app_state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}
