//! Liveness check for process supervisors
//!
//! Answers without consulting the Role Gate or the store, so a 200 only says the
//! HTTP listener is up and which build is serving.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Binary name, so a shared port can be traced to the right service
    pub module: String,
    /// Crate version of the running build
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "curtain-pipeline".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Ungated routes mounted alongside the role endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
