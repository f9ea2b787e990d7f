//! Domain service for plants and their watering schedule.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::db::{Plant, Watering};

#[derive(Debug, Error)]
pub enum PlantError {
    #[error("Plant not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PlantError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PlantError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PlantInput {
    pub name: String,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: i32,
    pub water_frequency_days: i32,
}

#[derive(Debug, Clone, Default)]
pub struct PlantUpdate {
    pub name: Option<String>,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: Option<i32>,
    pub water_frequency_days: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlantListItem {
    #[serde(flatten)]
    pub plant: Plant,
    pub last_watering: Option<Watering>,
    pub total_waterings: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlantDetail {
    #[serde(flatten)]
    pub plant: Plant,
    pub recent_waterings: Vec<Watering>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlantNeedingWater {
    #[serde(flatten)]
    pub plant: Plant,
    /// Whole days past the due time, rounded down.
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingWatering {
    #[serde(flatten)]
    pub plant: Plant,
    /// Days until the due time, rounded up.
    pub days_until_watering: i64,
}

#[async_trait::async_trait]
pub trait PlantService: Send + Sync {
    /// Creates a plant. Its first due time is now plus the watering frequency.
    async fn create_plant(&self, user_id: i32, input: PlantInput) -> Result<Plant, PlantError>;

    /// Plants newest first with their latest watering and watering count.
    async fn list_plants(&self, user_id: i32) -> Result<Vec<PlantListItem>, PlantError>;

    /// # Errors
    ///
    /// Returns [`PlantError::NotFound`] for unknown plants and plants of
    /// other users alike.
    async fn get_plant(&self, user_id: i32, plant_id: i32) -> Result<PlantDetail, PlantError>;

    /// Applies a partial update. A changed frequency reschedules the plant from
    /// its latest watering (or now) inside the same transaction.
    async fn update_plant(
        &self,
        user_id: i32,
        plant_id: i32,
        update: PlantUpdate,
    ) -> Result<Plant, PlantError>;

    async fn delete_plant(&self, user_id: i32, plant_id: i32) -> Result<(), PlantError>;

    async fn needing_water(&self, user_id: i32) -> Result<Vec<PlantNeedingWater>, PlantError>;

    /// Plants coming due within the next `days` days.
    async fn upcoming_waterings(
        &self,
        user_id: i32,
        days: u32,
    ) -> Result<Vec<UpcomingWatering>, PlantError>;
}
