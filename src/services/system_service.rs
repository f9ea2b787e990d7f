//! Domain service for system-level operations.
//!
//! Backs the health probes and the status endpoint.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SystemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: u64,
    pub database_ok: bool,
    pub push_enabled: bool,
    pub scheduler_enabled: bool,
}

#[async_trait::async_trait]
pub trait SystemService: Send + Sync {
    /// Checks that the database answers queries.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Database`] when the database is unreachable.
    async fn check_ready(&self) -> Result<(), SystemError>;

    async fn get_status(&self, uptime_secs: u64, version: &str)
    -> Result<SystemStatus, SystemError>;
}
