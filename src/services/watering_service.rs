//! Domain service for recording waterings.
//!
//! Every mutation here rewrites the owning plant's `next_watering_at` in the
//! same transaction as the watering row itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::{PlantSummary, Watering};

#[derive(Debug, Error)]
pub enum WateringError {
    #[error("Plant not found: {0}")]
    PlantNotFound(i32),

    #[error("Watering not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for WateringError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for WateringError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct WateringInput {
    pub plant_id: i32,
    pub amount_ml: i32,
    pub note: Option<String>,
    /// Event time; `None` means now.
    pub watered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedWatering {
    #[serde(flatten)]
    pub watering: Watering,
    pub next_watering_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedWatering {
    pub id: i32,
    pub plant_id: i32,
    pub next_watering_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WateringEntry {
    #[serde(flatten)]
    pub watering: Watering,
    pub plant: Option<PlantSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WateringStats {
    pub total_waterings: u64,
    pub waterings_last_30_days: u64,
    /// Mean amount in ml, rounded to the nearest integer.
    pub average_amount_ml: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub count: usize,
    pub total_amount_ml: i64,
    pub waterings: Vec<WateringEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WateringHistory {
    pub days: u32,
    pub total_waterings: usize,
    pub total_amount_ml: i64,
    pub history: Vec<HistoryDay>,
}

#[async_trait::async_trait]
pub trait WateringService: Send + Sync {
    /// Records a watering and schedules the plant one interval after its
    /// event time.
    ///
    /// # Errors
    ///
    /// Returns [`WateringError::PlantNotFound`] if the plant does not exist or
    /// belongs to another user.
    async fn record_watering(
        &self,
        user_id: i32,
        input: WateringInput,
    ) -> Result<RecordedWatering, WateringError>;

    /// Deletes a watering and reschedules the plant from the latest remaining
    /// watering, or from now when none is left.
    async fn delete_watering(
        &self,
        user_id: i32,
        watering_id: i32,
    ) -> Result<DeletedWatering, WateringError>;

    /// Newest first, optionally for a single plant.
    async fn list_waterings(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
    ) -> Result<Vec<WateringEntry>, WateringError>;

    async fn get_watering(
        &self,
        user_id: i32,
        watering_id: i32,
    ) -> Result<WateringEntry, WateringError>;

    async fn stats(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
    ) -> Result<WateringStats, WateringError>;

    /// Waterings of the last `days` days bucketed per UTC calendar day, newest first.
    async fn history(&self, user_id: i32, days: u32) -> Result<WateringHistory, WateringError>;
}
