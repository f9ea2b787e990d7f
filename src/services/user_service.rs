//! Domain service for the signed-in user's profile and account.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Email already in use: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UserStats {
    pub total_plants: u64,
    pub total_waterings: u64,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_profile(&self, user_id: i32) -> Result<User, UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the new email belongs to another account.
    async fn update_profile(&self, user_id: i32, update: ProfileUpdate)
    -> Result<User, UserError>;

    async fn get_stats(&self, user_id: i32) -> Result<UserStats, UserError>;

    /// Removes the account together with its plants, waterings and subscriptions.
    async fn delete_account(&self, user_id: i32) -> Result<(), UserError>;
}
