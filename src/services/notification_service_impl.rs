//! `SeaORM` implementation of the `NotificationService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clients::push::{PushGateway, SubscriptionKeys, SubscriptionTarget};
use crate::config::PushConfig;
use crate::db::{PushSubscription, Store};
use crate::domain::ReminderPayload;
use crate::domain::reminder::ReminderData;
use crate::services::notification_service::{
    DeliveryOutcome, DeliveryReport, NotificationError, NotificationService,
};

/// Wire format of the notification shown by the service worker.
#[derive(Serialize)]
struct PushMessage<'a> {
    title: &'a str,
    body: &'a str,
    icon: &'a str,
    badge: &'a str,
    data: &'a ReminderData,
}

pub struct SeaOrmNotificationService {
    store: Store,
    gateway: Arc<dyn PushGateway>,
    icon: String,
    badge: String,
}

impl SeaOrmNotificationService {
    #[must_use]
    pub fn new(store: Store, gateway: Arc<dyn PushGateway>, config: &PushConfig) -> Self {
        Self {
            store,
            gateway,
            icon: config.icon.clone(),
            badge: config.badge.clone(),
        }
    }

    fn encode(&self, payload: &ReminderPayload) -> Result<String, NotificationError> {
        let message = PushMessage {
            title: &payload.title,
            body: &payload.body,
            icon: &self.icon,
            badge: &self.badge,
            data: &payload.data,
        };

        serde_json::to_string(&message)
            .map_err(|e| NotificationError::Internal(format!("Failed to encode payload: {e}")))
    }

    async fn deliver_one(&self, subscription: PushSubscription, body: &str) -> DeliveryReport {
        let target = SubscriptionTarget {
            endpoint: subscription.endpoint.clone(),
            keys: SubscriptionKeys {
                p256dh: subscription.p256dh.clone(),
                auth: subscription.auth.clone(),
            },
        };

        let outcome = match self.gateway.deliver(&target, body).await {
            Ok(None) => DeliveryOutcome::Skipped,
            Ok(Some(status)) if (200..300).contains(&status) => DeliveryOutcome::Delivered,
            Ok(Some(status @ (404 | 410))) => {
                info!(
                    subscription_id = subscription.id,
                    status, "Push subscription expired, removing"
                );
                if let Err(e) = self.store.push_subscriptions().delete(subscription.id).await {
                    warn!(
                        subscription_id = subscription.id,
                        error = %e,
                        "Failed to remove expired push subscription"
                    );
                }
                DeliveryOutcome::Gone(status)
            }
            Ok(Some(status)) => DeliveryOutcome::Failed(format!("Push service returned {status}")),
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        };

        if let DeliveryOutcome::Failed(reason) = &outcome {
            warn!(
                subscription_id = subscription.id,
                user_id = subscription.user_id,
                reason = %reason,
                "Push delivery failed"
            );
        }

        let label = match &outcome {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Gone(_) => "gone",
            DeliveryOutcome::Failed(_) => "failed",
            DeliveryOutcome::Skipped => "skipped",
        };
        metrics::counter!("push_deliveries_total", "outcome" => label).increment(1);

        DeliveryReport {
            subscription_id: subscription.id,
            endpoint: subscription.endpoint,
            outcome,
        }
    }
}

#[async_trait]
impl NotificationService for SeaOrmNotificationService {
    async fn subscribe(
        &self,
        user_id: i32,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, NotificationError> {
        if endpoint.trim().is_empty() || p256dh.is_empty() || auth.is_empty() {
            return Err(NotificationError::Validation(
                "Subscription requires endpoint, p256dh and auth".to_string(),
            ));
        }

        let subscription = self
            .store
            .push_subscriptions()
            .upsert(user_id, endpoint.trim(), p256dh, auth)
            .await?;

        debug!(user_id, subscription_id = subscription.id, "Push subscription saved");
        Ok(subscription)
    }

    async fn unsubscribe(&self, user_id: i32, endpoint: &str) -> Result<bool, NotificationError> {
        Ok(self
            .store
            .push_subscriptions()
            .delete_for_user_endpoint(user_id, endpoint)
            .await?)
    }

    async fn list_subscriptions(
        &self,
        user_id: i32,
    ) -> Result<Vec<PushSubscription>, NotificationError> {
        Ok(self.store.push_subscriptions().list_for_user(user_id).await?)
    }

    async fn send_to_user(
        &self,
        user_id: i32,
        payload: &ReminderPayload,
    ) -> Result<Vec<DeliveryReport>, NotificationError> {
        let subscriptions = self.store.push_subscriptions().list_for_user(user_id).await?;
        if subscriptions.is_empty() {
            debug!(user_id, "No push subscriptions, nothing to send");
            return Ok(Vec::new());
        }

        let body = self.encode(payload)?;

        let reports = join_all(
            subscriptions
                .into_iter()
                .map(|subscription| self.deliver_one(subscription, &body)),
        )
        .await;

        debug!(
            user_id,
            sent = reports.iter().filter(|r| r.is_delivered()).count(),
            total = reports.len(),
            "Push fan-out finished"
        );

        Ok(reports)
    }

    async fn send_test(&self, user_id: i32) -> Result<Vec<DeliveryReport>, NotificationError> {
        self.send_to_user(user_id, &ReminderPayload::test()).await
    }
}
