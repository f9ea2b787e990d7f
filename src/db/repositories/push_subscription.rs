use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;

use crate::entities::{prelude::*, push_subscriptions};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushSubscription {
    pub id: i32,
    pub user_id: i32,
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub p256dh: String,
    #[serde(skip_serializing)]
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

pub struct PushSubscriptionRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> PushSubscriptionRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Inserts a subscription or refreshes the keys of an existing
    /// `(user_id, endpoint)` pair.
    pub async fn upsert(
        &self,
        user_id: i32,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription> {
        let now = Utc::now();

        let active = push_subscriptions::ActiveModel {
            user_id: Set(user_id),
            endpoint: Set(endpoint.to_string()),
            p256dh: Set(p256dh.to_string()),
            auth: Set(auth.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        PushSubscriptions::insert(active)
            .on_conflict(
                OnConflict::columns([
                    push_subscriptions::Column::UserId,
                    push_subscriptions::Column::Endpoint,
                ])
                .update_columns([
                    push_subscriptions::Column::P256dh,
                    push_subscriptions::Column::Auth,
                    push_subscriptions::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await
            .context("Failed to upsert push subscription")?;

        self.find_by_endpoint(user_id, endpoint)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Push subscription vanished after upsert"))
    }

    pub async fn find_by_endpoint(
        &self,
        user_id: i32,
        endpoint: &str,
    ) -> Result<Option<PushSubscription>> {
        let model = PushSubscriptions::find()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .filter(push_subscriptions::Column::Endpoint.eq(endpoint))
            .one(self.conn)
            .await?;

        Ok(model.map(Self::map_model))
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<PushSubscription>> {
        let rows = PushSubscriptions::find()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .order_by_asc(push_subscriptions::Column::Id)
            .all(self.conn)
            .await
            .context("Failed to list push subscriptions")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = PushSubscriptions::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_user_endpoint(&self, user_id: i32, endpoint: &str) -> Result<bool> {
        let result = PushSubscriptions::delete_many()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .filter(push_subscriptions::Column::Endpoint.eq(endpoint))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = PushSubscriptions::delete_many()
            .filter(push_subscriptions::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    fn map_model(m: push_subscriptions::Model) -> PushSubscription {
        PushSubscription {
            id: m.id,
            user_id: m.user_id,
            endpoint: m.endpoint,
            p256dh: m.p256dh,
            auth: m.auth,
            created_at: m.created_at,
        }
    }
}
