use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{validate_email, validate_name};
use super::{ApiError, ApiResponse, AppState, CurrentUser, MessageResponse};
use crate::db::User;
use crate::services::{ProfileUpdate, UserError, UserStats};

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::NotFound("User not found".to_string()),
            UserError::Conflict(_) => Self::Conflict("Email is already in use".to_string()),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// GET /users/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let profile = state.shared.user_service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let update = ProfileUpdate {
        email: payload.email.as_deref().map(validate_email).transpose()?,
        firstname: payload
            .firstname
            .as_deref()
            .map(|f| validate_name("First name", f).map(str::to_string))
            .transpose()?,
        lastname: payload.lastname,
    };

    let profile = state
        .shared
        .user_service
        .update_profile(user.id, update)
        .await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// GET /users/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserStats>>, ApiError> {
    let stats = state.shared.user_service.get_stats(user.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// DELETE /users/account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.user_service.delete_account(user.id).await?;
    let _ = session.flush().await;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account deleted",
    ))))
}
