use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser, MessageResponse};
use crate::db::PushSubscription;
use crate::services::{DeliveryReport, NotificationError};

#[derive(Deserialize)]
pub struct SubscriptionKeysRequest {
    pub p256dh: String,
    pub auth: String,
}

/// Shape of a browser `PushSubscription.toJSON()`.
#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeysRequest,
}

#[derive(Serialize)]
pub struct VapidKeyResponse {
    pub public_key: String,
}

#[derive(Serialize)]
pub struct TestNotificationResponse {
    pub sent: usize,
    pub reports: Vec<DeliveryReport>,
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Validation(msg) => Self::validation(msg),
            NotificationError::Database(msg) => Self::DatabaseError(msg),
            NotificationError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// POST /notifications/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<PushSubscription>>, ApiError> {
    if url::Url::parse(&payload.endpoint).is_err() {
        return Err(ApiError::validation("Subscription endpoint must be a URL"));
    }

    let subscription = state
        .shared
        .notification_service
        .subscribe(
            user.id,
            &payload.endpoint,
            &payload.keys.p256dh,
            &payload.keys.auth,
        )
        .await?;

    Ok(Json(ApiResponse::success(subscription)))
}

/// DELETE /notifications/unsubscribe/{endpoint}
///
/// The endpoint is URL-encoded into the path. Unknown endpoints are not an error.
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(endpoint): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let removed = state
        .shared
        .notification_service
        .unsubscribe(user.id, &endpoint)
        .await?;

    let message = if removed {
        "Unsubscribed successfully"
    } else {
        "Subscription not found"
    };

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// GET /notifications/subscriptions
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PushSubscription>>>, ApiError> {
    let subscriptions = state
        .shared
        .notification_service
        .list_subscriptions(user.id)
        .await?;

    Ok(Json(ApiResponse::success(subscriptions)))
}

/// POST /notifications/test
pub async fn send_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<TestNotificationResponse>>, ApiError> {
    let reports = state.shared.notification_service.send_test(user.id).await?;

    Ok(Json(ApiResponse::success(TestNotificationResponse {
        sent: reports.iter().filter(|r| r.is_delivered()).count(),
        reports,
    })))
}

/// GET /notifications/vapid-public-key
pub async fn vapid_public_key(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<VapidKeyResponse>> {
    let public_key = state.config().read().await.push.vapid_public_key.clone();
    Json(ApiResponse::success(VapidKeyResponse { public_key }))
}
