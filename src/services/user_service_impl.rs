//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use sea_orm::TransactionTrait;
use tracing::info;

use crate::db::repositories::plant::PlantRepository;
use crate::db::repositories::push_subscription::PushSubscriptionRepository;
use crate::db::repositories::user::UserRepository;
use crate::db::repositories::watering::WateringRepository;
use crate::db::{ProfileChanges, Store, User};
use crate::services::user_service::{ProfileUpdate, UserError, UserService, UserStats};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn get_profile(&self, user_id: i32) -> Result<User, UserError> {
        self.store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<User, UserError> {
        let email = update.email.map(|e| e.trim().to_lowercase());

        if let Some(email) = &email {
            let existing = self.store.users().get_by_email(email).await?;
            if existing.is_some_and(|u| u.id != user_id) {
                return Err(UserError::Conflict(email.clone()));
            }
        }

        let changes = ProfileChanges {
            email,
            firstname: update.firstname.map(|f| f.trim().to_string()),
            lastname: update.lastname.map(|l| l.trim().to_string()),
        };

        self.store
            .users()
            .update_profile(user_id, changes)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn get_stats(&self, user_id: i32) -> Result<UserStats, UserError> {
        let total_plants = self.store.plants().count_for_user(user_id).await?;
        let total_waterings = self
            .store
            .waterings()
            .count_for_user(user_id, None, None)
            .await?;

        Ok(UserStats {
            total_plants,
            total_waterings,
        })
    }

    async fn delete_account(&self, user_id: i32) -> Result<(), UserError> {
        let txn = self.store.conn.begin().await?;

        let waterings = WateringRepository::new(&txn).delete_for_user(user_id).await?;
        let plants = PlantRepository::new(&txn).delete_for_user(user_id).await?;
        PushSubscriptionRepository::new(&txn)
            .delete_for_user(user_id)
            .await?;

        if !UserRepository::new(&txn).delete(user_id).await? {
            return Err(UserError::NotFound);
        }

        txn.commit().await?;

        info!(user_id, plants, waterings, "Deleted user account");
        Ok(())
    }
}
