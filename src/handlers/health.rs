use axum::{extract::State, Json};
use std::sync::Arc;
use crate::AppState;
use crate::models::HealthResponse;
use tracing::debug;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        service: app_state.config.service_name.clone(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    // The registry lives in memory, so there is nothing external to wait for.
    Json(HealthResponse {
        status: "ok".to_string(),
        service: app_state.config.service_name.clone(),
        message: "Service is ready".to_string(),
    })
}
