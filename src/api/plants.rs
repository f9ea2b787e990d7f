use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    validate_amount, validate_days, validate_frequency, validate_id, validate_image_url,
    validate_name,
};
use super::{ApiError, ApiResponse, AppState, CurrentUser, DaysQuery, MessageResponse};
use crate::db::Plant;
use crate::services::{
    PlantDetail, PlantError, PlantInput, PlantListItem, PlantNeedingWater, PlantUpdate,
    UpcomingWatering,
};

const DEFAULT_UPCOMING_DAYS: u32 = 7;

#[derive(Deserialize)]
pub struct CreatePlantRequest {
    pub name: String,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: i32,
    pub water_frequency_days: i32,
}

#[derive(Deserialize, Default)]
pub struct UpdatePlantRequest {
    pub name: Option<String>,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: Option<i32>,
    pub water_frequency_days: Option<i32>,
}

impl From<PlantError> for ApiError {
    fn from(err: PlantError) -> Self {
        match err {
            PlantError::NotFound(id) => Self::not_found("Plant", id),
            PlantError::Validation(msg) => Self::validation(msg),
            PlantError::Database(msg) => Self::DatabaseError(msg),
            PlantError::Internal(msg) => Self::internal(msg),
        }
    }
}

fn optional_image_url(url: Option<String>) -> Result<Option<String>, ApiError> {
    match url {
        Some(u) if !u.trim().is_empty() => {
            validate_image_url(&u)?;
            Ok(Some(u))
        }
        _ => Ok(None),
    }
}

/// POST /plants
pub async fn create_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreatePlantRequest>,
) -> Result<Json<ApiResponse<Plant>>, ApiError> {
    let input = PlantInput {
        name: validate_name("Plant name", &payload.name)?.to_string(),
        species: payload.species,
        purchase_date: payload.purchase_date,
        image_url: optional_image_url(payload.image_url)?,
        notes: payload.notes,
        location: payload.location,
        water_amount_ml: validate_amount(payload.water_amount_ml)?,
        water_frequency_days: validate_frequency(payload.water_frequency_days)?,
    };

    let plant = state.shared.plant_service.create_plant(user.id, input).await?;
    Ok(Json(ApiResponse::success(plant)))
}

/// GET /plants
pub async fn list_plants(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PlantListItem>>>, ApiError> {
    let plants = state.shared.plant_service.list_plants(user.id).await?;
    Ok(Json(ApiResponse::success(plants)))
}

/// GET /plants/needing-water
pub async fn needing_water(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PlantNeedingWater>>>, ApiError> {
    let plants = state.shared.plant_service.needing_water(user.id).await?;
    Ok(Json(ApiResponse::success(plants)))
}

/// GET /plants/upcoming-waterings?days=7
pub async fn upcoming_waterings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<Vec<UpcomingWatering>>>, ApiError> {
    let days = validate_days(query.days.unwrap_or(DEFAULT_UPCOMING_DAYS))?;

    let plants = state
        .shared
        .plant_service
        .upcoming_waterings(user.id, days)
        .await?;

    Ok(Json(ApiResponse::success(plants)))
}

/// GET /plants/{id}
pub async fn get_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PlantDetail>>, ApiError> {
    let id = validate_id(id, "plant")?;
    let plant = state.shared.plant_service.get_plant(user.id, id).await?;
    Ok(Json(ApiResponse::success(plant)))
}

/// PATCH /plants/{id}
pub async fn update_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePlantRequest>,
) -> Result<Json<ApiResponse<Plant>>, ApiError> {
    let id = validate_id(id, "plant")?;

    let update = PlantUpdate {
        name: payload
            .name
            .as_deref()
            .map(|n| validate_name("Plant name", n).map(str::to_string))
            .transpose()?,
        species: payload.species,
        purchase_date: payload.purchase_date,
        image_url: optional_image_url(payload.image_url)?,
        notes: payload.notes,
        location: payload.location,
        water_amount_ml: payload.water_amount_ml.map(validate_amount).transpose()?,
        water_frequency_days: payload
            .water_frequency_days
            .map(validate_frequency)
            .transpose()?,
    };

    let plant = state
        .shared
        .plant_service
        .update_plant(user.id, id, update)
        .await?;

    Ok(Json(ApiResponse::success(plant)))
}

/// DELETE /plants/{id}
pub async fn delete_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "plant")?;
    state.shared.plant_service.delete_plant(user.id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Plant {id} deleted"
    )))))
}
