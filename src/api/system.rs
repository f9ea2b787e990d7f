//! System API endpoints.
//!
//! Health probes for orchestrators plus a small status summary.
//! Business logic lives in [`SystemService`](crate::services::SystemService).

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::{SystemError, SystemStatus};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

impl From<SystemError> for ApiError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::Database(msg) => Self::DatabaseError(msg),
            SystemError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/system/health/live`
///
/// Liveness probe. Answers as long as the process is serving requests.
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/system/health/ready`
///
/// Readiness probe. Returns 503 when the database does not answer.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let ready = state.shared.system_service.check_ready().await.is_ok();

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready,
            checks: HealthReadinessChecks { database: ready },
        })),
    )
        .into_response()
}

/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let status = state
        .shared
        .system_service
        .get_status(
            state.start_time.elapsed().as_secs(),
            env!("CARGO_PKG_VERSION"),
        )
        .await?;

    Ok(Json(ApiResponse::success(status)))
}
