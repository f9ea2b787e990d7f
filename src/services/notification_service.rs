//! Domain service for push subscriptions and delivery.

use serde::Serialize;
use thiserror::Error;

use crate::db::PushSubscription;
use crate::domain::ReminderPayload;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of sending to one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service no longer knows the subscription; it has been removed.
    Gone(u16),
    Failed(String),
    /// Push delivery is disabled.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub subscription_id: i32,
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered)
    }
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Stores a subscription. Subscribing the same endpoint again replaces its keys.
    async fn subscribe(
        &self,
        user_id: i32,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, NotificationError>;

    /// Returns whether a subscription was removed.
    async fn unsubscribe(&self, user_id: i32, endpoint: &str) -> Result<bool, NotificationError>;

    async fn list_subscriptions(
        &self,
        user_id: i32,
    ) -> Result<Vec<PushSubscription>, NotificationError>;

    /// Sends `payload` to every subscription of the user concurrently.
    ///
    /// Per-subscription failures are reported, never returned as errors.
    /// Subscriptions the push service reports as gone are deleted.
    async fn send_to_user(
        &self,
        user_id: i32,
        payload: &ReminderPayload,
    ) -> Result<Vec<DeliveryReport>, NotificationError>;

    async fn send_test(&self, user_id: i32) -> Result<Vec<DeliveryReport>, NotificationError>;
}
