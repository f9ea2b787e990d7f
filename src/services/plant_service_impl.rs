//! `SeaORM` implementation of the `PlantService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::TransactionTrait;
use tracing::{debug, info};

use crate::db::repositories::plant::PlantRepository;
use crate::db::repositories::watering::WateringRepository;
use crate::db::{NewPlant, Plant, PlantChanges, Store};
use crate::domain::schedule::{MAX_FREQUENCY_DAYS, frequency_from_db};
use crate::domain::{next_watering, recompute_due};
use crate::services::plant_service::{
    PlantDetail, PlantError, PlantInput, PlantListItem, PlantNeedingWater, PlantService,
    PlantUpdate, UpcomingWatering,
};

const RECENT_WATERINGS: u64 = 5;

pub struct SeaOrmPlantService {
    store: Store,
}

impl SeaOrmPlantService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate_frequency(days: i32) -> Result<u32, PlantError> {
        u32::try_from(days)
            .ok()
            .filter(|d| (1..=MAX_FREQUENCY_DAYS).contains(d))
            .ok_or_else(|| {
                PlantError::Validation(format!(
                    "Watering frequency must be between 1 and {MAX_FREQUENCY_DAYS} days"
                ))
            })
    }

    fn validate_amount(amount_ml: i32) -> Result<(), PlantError> {
        if amount_ml < 1 {
            return Err(PlantError::Validation(
                "Water amount must be at least 1 ml".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<String, PlantError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PlantError::Validation(
                "Plant name cannot be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

fn days_overdue(next: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - next).num_days().max(0)
}

fn days_until(next: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (next - now).num_seconds().max(0);
    let day = Duration::days(1).num_seconds();
    (seconds + day - 1) / day
}

#[async_trait]
impl PlantService for SeaOrmPlantService {
    async fn create_plant(&self, user_id: i32, input: PlantInput) -> Result<Plant, PlantError> {
        let name = Self::validate_name(&input.name)?;
        let frequency = Self::validate_frequency(input.water_frequency_days)?;
        Self::validate_amount(input.water_amount_ml)?;

        let plant = self
            .store
            .plants()
            .create(NewPlant {
                user_id,
                name,
                species: input.species,
                purchase_date: input.purchase_date,
                image_url: input.image_url,
                notes: input.notes,
                location: input.location,
                water_amount_ml: input.water_amount_ml,
                water_frequency_days: input.water_frequency_days,
                next_watering_at: next_watering(Utc::now(), frequency),
            })
            .await?;

        info!(user_id, plant_id = plant.id, "Created plant");
        Ok(plant)
    }

    async fn list_plants(&self, user_id: i32) -> Result<Vec<PlantListItem>, PlantError> {
        let plants = self.store.plants().list_for_user(user_id).await?;
        let ids: Vec<i32> = plants.iter().map(|p| p.id).collect();

        let waterings = self.store.waterings();
        let mut latest = waterings.latest_for_plants(&ids).await?;
        let counts = waterings.count_for_plants(&ids).await?;

        Ok(plants
            .into_iter()
            .map(|plant| PlantListItem {
                last_watering: latest.remove(&plant.id),
                total_waterings: counts.get(&plant.id).copied().unwrap_or(0),
                plant,
            })
            .collect())
    }

    async fn get_plant(&self, user_id: i32, plant_id: i32) -> Result<PlantDetail, PlantError> {
        let plant = self
            .store
            .plants()
            .find_owned(plant_id, user_id)
            .await?
            .ok_or(PlantError::NotFound(plant_id))?;

        let recent_waterings = self
            .store
            .waterings()
            .recent_for_plant(plant.id, RECENT_WATERINGS)
            .await?;

        Ok(PlantDetail {
            plant,
            recent_waterings,
        })
    }

    async fn update_plant(
        &self,
        user_id: i32,
        plant_id: i32,
        update: PlantUpdate,
    ) -> Result<Plant, PlantError> {
        let name = update.name.as_deref().map(Self::validate_name).transpose()?;
        let new_frequency = update
            .water_frequency_days
            .map(Self::validate_frequency)
            .transpose()?;
        if let Some(amount) = update.water_amount_ml {
            Self::validate_amount(amount)?;
        }

        let txn = self.store.conn.begin().await?;
        let plants = PlantRepository::new(&txn);

        let existing = plants
            .find_owned(plant_id, user_id)
            .await?
            .ok_or(PlantError::NotFound(plant_id))?;

        let changes = PlantChanges {
            name,
            species: update.species,
            purchase_date: update.purchase_date,
            image_url: update.image_url,
            notes: update.notes,
            location: update.location,
            water_amount_ml: update.water_amount_ml,
            water_frequency_days: update.water_frequency_days,
        };

        let mut plant = plants
            .update(plant_id, user_id, changes)
            .await?
            .ok_or(PlantError::NotFound(plant_id))?;

        let frequency_changed = new_frequency
            .is_some_and(|f| f != frequency_from_db(existing.water_frequency_days));

        if let Some(frequency) = new_frequency.filter(|_| frequency_changed) {
            let latest = WateringRepository::new(&txn)
                .find_latest_for_plant(plant_id)
                .await?;
            let next = recompute_due(latest.map(|w| w.watered_at), Utc::now(), frequency);

            plants.update_next_watering(plant_id, next).await?;
            plant.next_watering_at = next;

            debug!(plant_id, frequency, next = %next, "Rescheduled plant after frequency change");
        }

        txn.commit().await?;
        Ok(plant)
    }

    async fn delete_plant(&self, user_id: i32, plant_id: i32) -> Result<(), PlantError> {
        if !self.store.plants().delete(plant_id, user_id).await? {
            return Err(PlantError::NotFound(plant_id));
        }

        info!(user_id, plant_id, "Deleted plant");
        Ok(())
    }

    async fn needing_water(&self, user_id: i32) -> Result<Vec<PlantNeedingWater>, PlantError> {
        let now = Utc::now();
        let plants = self.store.plants().list_due_for_user(user_id, now).await?;

        Ok(plants
            .into_iter()
            .map(|plant| PlantNeedingWater {
                days_overdue: days_overdue(plant.next_watering_at, now),
                plant,
            })
            .collect())
    }

    async fn upcoming_waterings(
        &self,
        user_id: i32,
        days: u32,
    ) -> Result<Vec<UpcomingWatering>, PlantError> {
        let now = Utc::now();
        let until = now + Duration::days(i64::from(days));

        let plants = self
            .store
            .plants()
            .list_due_between(user_id, now, until)
            .await?;

        Ok(plants
            .into_iter()
            .map(|plant| UpcomingWatering {
                days_until_watering: days_until(plant.next_watering_at, now),
                plant,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_overdue_rounds_down() {
        let now = Utc::now();
        assert_eq!(days_overdue(now - Duration::hours(47), now), 1);
        assert_eq!(days_overdue(now - Duration::hours(2), now), 0);
        assert_eq!(days_overdue(now + Duration::hours(2), now), 0);
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_until(now + Duration::hours(1), now), 1);
        assert_eq!(days_until(now + Duration::hours(24), now), 1);
        assert_eq!(days_until(now + Duration::hours(25), now), 2);
        assert_eq!(days_until(now, now), 0);
    }

    #[test]
    fn test_frequency_validation() {
        assert_eq!(SeaOrmPlantService::validate_frequency(7).unwrap(), 7);
        assert!(SeaOrmPlantService::validate_frequency(0).is_err());
        assert!(SeaOrmPlantService::validate_frequency(-3).is_err());
        assert!(SeaOrmPlantService::validate_frequency(366).is_err());
    }
}
