//! Health and generation status endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::generation::test_connection;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub generator: GeneratorInfo,
}

#[derive(Debug, Serialize)]
pub struct GeneratorInfo {
    pub model: String,
    pub configured: bool,
}

/// GET /health
///
/// Does not call the generation service and does not require a session.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "slp-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (slp_common::time::now() - state.startup_time).num_seconds(),
        generator: GeneratorInfo {
            model: state.generator.model().to_string(),
            configured: state.generator.is_configured(),
        },
    })
}

#[derive(Debug, Serialize)]
pub struct GenerationStatus {
    pub model: String,
    pub connected: bool,
}

/// GET /api/generation/status
///
/// Makes one small generation call to confirm the API key works.
pub async fn generation_status(State(state): State<AppState>) -> Json<GenerationStatus> {
    Json(GenerationStatus {
        model: state.generator.model().to_string(),
        connected: test_connection(state.generator.as_ref()).await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/generation/status", get(generation_status))
}
