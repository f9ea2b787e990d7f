use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_amount, validate_days, validate_id};
use super::{ApiError, ApiResponse, AppState, CurrentUser, DaysQuery, PlantFilterQuery};
use crate::services::{
    DeletedWatering, RecordedWatering, WateringEntry, WateringError, WateringHistory,
    WateringInput, WateringStats,
};

const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Deserialize)]
pub struct CreateWateringRequest {
    pub plant_id: i32,
    pub amount_ml: i32,
    pub note: Option<String>,
    pub watered_at: Option<DateTime<Utc>>,
}

impl From<WateringError> for ApiError {
    fn from(err: WateringError) -> Self {
        match err {
            WateringError::PlantNotFound(id) => Self::not_found("Plant", id),
            WateringError::NotFound(id) => Self::not_found("Watering", id),
            WateringError::Validation(msg) => Self::validation(msg),
            WateringError::Database(msg) => Self::DatabaseError(msg),
            WateringError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// POST /waterings
pub async fn record_watering(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateWateringRequest>,
) -> Result<Json<ApiResponse<RecordedWatering>>, ApiError> {
    let input = WateringInput {
        plant_id: validate_id(payload.plant_id, "plant")?,
        amount_ml: validate_amount(payload.amount_ml)?,
        note: payload.note,
        watered_at: payload.watered_at,
    };

    let recorded = state
        .shared
        .watering_service
        .record_watering(user.id, input)
        .await?;

    Ok(Json(ApiResponse::success(recorded)))
}

/// GET /waterings?plant_id=
pub async fn list_waterings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<PlantFilterQuery>,
) -> Result<Json<ApiResponse<Vec<WateringEntry>>>, ApiError> {
    let plant_id = query
        .plant_id
        .map(|id| validate_id(id, "plant"))
        .transpose()?;

    let waterings = state
        .shared
        .watering_service
        .list_waterings(user.id, plant_id)
        .await?;

    Ok(Json(ApiResponse::success(waterings)))
}

/// GET /waterings/plant/{plant_id}
pub async fn list_for_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<WateringEntry>>>, ApiError> {
    let plant_id = validate_id(plant_id, "plant")?;

    let waterings = state
        .shared
        .watering_service
        .list_waterings(user.id, Some(plant_id))
        .await?;

    Ok(Json(ApiResponse::success(waterings)))
}

/// GET /waterings/stats?plant_id=
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<PlantFilterQuery>,
) -> Result<Json<ApiResponse<WateringStats>>, ApiError> {
    let plant_id = query
        .plant_id
        .map(|id| validate_id(id, "plant"))
        .transpose()?;

    let stats = state
        .shared
        .watering_service
        .stats(user.id, plant_id)
        .await?;

    Ok(Json(ApiResponse::success(stats)))
}

/// GET /waterings/history?days=30
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<WateringHistory>>, ApiError> {
    let days = validate_days(query.days.unwrap_or(DEFAULT_HISTORY_DAYS))?;

    let history = state
        .shared
        .watering_service
        .history(user.id, days)
        .await?;

    Ok(Json(ApiResponse::success(history)))
}

/// GET /waterings/{id}
pub async fn get_watering(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<WateringEntry>>, ApiError> {
    let id = validate_id(id, "watering")?;
    let watering = state
        .shared
        .watering_service
        .get_watering(user.id, id)
        .await?;

    Ok(Json(ApiResponse::success(watering)))
}

/// DELETE /waterings/{id}
pub async fn delete_watering(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DeletedWatering>>, ApiError> {
    let id = validate_id(id, "watering")?;
    let deleted = state
        .shared
        .watering_service
        .delete_watering(user.id, id)
        .await?;

    Ok(Json(ApiResponse::success(deleted)))
}
