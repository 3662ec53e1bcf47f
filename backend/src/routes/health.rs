//! Health check endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness probe (database and upload directory)
//! - /health/live - Liveness probe (always returns OK if server is running)

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub storage: CheckStatus,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: None,
        }
    }

    fn unhealthy(message: &str) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message.to_string()),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version(),
        checks: None,
    })
}

/// Readiness probe
///
/// Returns 503 if the database is unreachable or the upload directory is
/// missing. Failure detail goes to the log, not the response.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = match db::health_check(state.db()).await {
        Ok(()) => CheckStatus::healthy(),
        Err(e) => {
            warn!(error = %e, "Readiness: database check failed");
            CheckStatus::unhealthy("database unreachable")
        }
    };

    let storage = match tokio::fs::metadata(state.storage().root()).await {
        Ok(meta) if meta.is_dir() => CheckStatus::healthy(),
        Ok(_) => CheckStatus::unhealthy("upload path is not a directory"),
        Err(e) => {
            warn!(error = %e, "Readiness: upload directory check failed");
            CheckStatus::unhealthy("upload directory unavailable")
        }
    };

    let is_ready = database.is_healthy() && storage.is_healthy();

    let response = HealthResponse {
        status: if is_ready { "ready" } else { "not_ready" }.to_string(),
        version: version(),
        checks: Some(HealthChecks { database, storage }),
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness probe
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: version(),
        checks: None,
    })
}
