//! Health check handlers

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};
use infra_db::EntityStore;

use crate::{error::ApiError, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub checks: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: state.config.application.name.clone(),
        version: state.config.application.version.clone(),
    })
}

/// Readiness check (database and forecast store)
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = vec![state.database.health_check().await, forecast_store_check(&state).await];
    let ready = checks.iter().all(HealthCheckResult::is_healthy);

    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(ReadinessResponse {
            status: label.to_string(),
            version: state.config.application.version.clone(),
            checks,
        }),
    )
}

async fn forecast_store_check(state: &AppState) -> HealthCheckResult {
    let start = Instant::now();
    let result = state.forecasts.ping().await;

    HealthCheckResult {
        adapter_id: "forecast-store".to_string(),
        status: if result.is_ok() {
            AdapterHealth::Healthy
        } else {
            AdapterHealth::Unhealthy
        },
        latency_ms: start.elapsed().as_millis() as u64,
        message: result.err().map(|e| e.to_string()),
        checked_at: Utc::now(),
    }
}

/// Runs a trivial script against the database and returns its clock
pub async fn test_database(State(state): State<AppState>) -> Result<Json<String>, ApiError> {
    let now = state.database.server_time().await?;
    Ok(Json(now))
}
