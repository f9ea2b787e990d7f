//! `SeaORM` implementation of the `WateringService` trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{debug, info};

use crate::db::repositories::plant::PlantRepository;
use crate::db::repositories::watering::WateringRepository;
use crate::db::{NewWatering, Store};
use crate::domain::{next_watering, recompute_due};
use crate::domain::schedule::{MAX_FREQUENCY_DAYS, frequency_from_db};
use crate::services::watering_service::{
    DeletedWatering, HistoryDay, RecordedWatering, WateringEntry, WateringError, WateringHistory,
    WateringInput, WateringService, WateringStats,
};

const STATS_WINDOW_DAYS: i64 = 30;

pub struct SeaOrmWateringService {
    store: Store,
}

impl SeaOrmWateringService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Rewrites the plant's due time from its latest watering, or from `now`.
async fn reschedule<C: ConnectionTrait>(
    conn: &C,
    plant_id: i32,
    frequency_days: i32,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, WateringError> {
    let latest = WateringRepository::new(conn)
        .find_latest_for_plant(plant_id)
        .await?;

    let next = recompute_due(
        latest.map(|w| w.watered_at),
        now,
        frequency_from_db(frequency_days),
    );

    PlantRepository::new(conn)
        .update_next_watering(plant_id, next)
        .await?;

    debug!(plant_id, next = %next, "Rescheduled plant");
    Ok(next)
}

fn bucket_by_day(entries: Vec<WateringEntry>) -> Vec<HistoryDay> {
    let mut buckets: BTreeMap<NaiveDate, Vec<WateringEntry>> = BTreeMap::new();
    for entry in entries {
        buckets
            .entry(entry.watering.watered_at.date_naive())
            .or_default()
            .push(entry);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(date, waterings)| HistoryDay {
            date,
            count: waterings.len(),
            total_amount_ml: waterings
                .iter()
                .map(|e| i64::from(e.watering.amount_ml))
                .sum(),
            waterings,
        })
        .collect()
}

#[async_trait]
impl WateringService for SeaOrmWateringService {
    async fn record_watering(
        &self,
        user_id: i32,
        input: WateringInput,
    ) -> Result<RecordedWatering, WateringError> {
        if input.amount_ml < 1 {
            return Err(WateringError::Validation(
                "Water amount must be at least 1 ml".to_string(),
            ));
        }

        let watered_at = input.watered_at.unwrap_or_else(Utc::now);

        let txn = self.store.conn.begin().await?;

        let plant = PlantRepository::new(&txn)
            .find_owned(input.plant_id, user_id)
            .await?
            .ok_or(WateringError::PlantNotFound(input.plant_id))?;

        let watering = WateringRepository::new(&txn)
            .create(NewWatering {
                plant_id: plant.id,
                user_id,
                amount_ml: input.amount_ml,
                note: input.note.filter(|n| !n.trim().is_empty()),
                watered_at,
            })
            .await?;

        let next_watering_at = next_watering(
            watering.watered_at,
            frequency_from_db(plant.water_frequency_days),
        );
        PlantRepository::new(&txn)
            .update_next_watering(plant.id, next_watering_at)
            .await?;

        txn.commit().await?;

        info!(
            user_id,
            plant_id = plant.id,
            watering_id = watering.id,
            next_watering_at = %next_watering_at,
            "Recorded watering"
        );

        Ok(RecordedWatering {
            watering,
            next_watering_at,
        })
    }

    async fn delete_watering(
        &self,
        user_id: i32,
        watering_id: i32,
    ) -> Result<DeletedWatering, WateringError> {
        let now = Utc::now();
        let txn = self.store.conn.begin().await?;

        let waterings = WateringRepository::new(&txn);
        let watering = waterings
            .find_owned(watering_id, user_id)
            .await?
            .ok_or(WateringError::NotFound(watering_id))?;

        let plant = PlantRepository::new(&txn)
            .find_owned(watering.plant_id, user_id)
            .await?
            .ok_or(WateringError::PlantNotFound(watering.plant_id))?;

        waterings.delete(watering.id).await?;

        let next_watering_at = reschedule(&txn, plant.id, plant.water_frequency_days, now).await?;

        txn.commit().await?;

        info!(user_id, plant_id = plant.id, watering_id, "Deleted watering");

        Ok(DeletedWatering {
            id: watering_id,
            plant_id: plant.id,
            next_watering_at,
        })
    }

    async fn list_waterings(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
    ) -> Result<Vec<WateringEntry>, WateringError> {
        if let Some(plant_id) = plant_id {
            self.store
                .plants()
                .find_owned(plant_id, user_id)
                .await?
                .ok_or(WateringError::PlantNotFound(plant_id))?;
        }

        let rows = self.store.waterings().list_for_user(user_id, plant_id).await?;

        Ok(rows
            .into_iter()
            .map(|(watering, plant)| WateringEntry { watering, plant })
            .collect())
    }

    async fn get_watering(
        &self,
        user_id: i32,
        watering_id: i32,
    ) -> Result<WateringEntry, WateringError> {
        let (watering, plant) = self
            .store
            .waterings()
            .find_owned_with_plant(watering_id, user_id)
            .await?
            .ok_or(WateringError::NotFound(watering_id))?;

        Ok(WateringEntry { watering, plant })
    }

    async fn stats(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
    ) -> Result<WateringStats, WateringError> {
        if let Some(plant_id) = plant_id {
            self.store
                .plants()
                .find_owned(plant_id, user_id)
                .await?
                .ok_or(WateringError::PlantNotFound(plant_id))?;
        }

        let waterings = self.store.waterings();
        let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);

        let total_waterings = waterings.count_for_user(user_id, plant_id, None).await?;
        let waterings_last_30_days = waterings
            .count_for_user(user_id, plant_id, Some(since))
            .await?;
        let average = waterings.average_amount(user_id, plant_id).await?;

        #[allow(clippy::cast_possible_truncation)]
        let average_amount_ml = average.map_or(0, |a| a.round() as i64);

        Ok(WateringStats {
            total_waterings,
            waterings_last_30_days,
            average_amount_ml,
        })
    }

    async fn history(&self, user_id: i32, days: u32) -> Result<WateringHistory, WateringError> {
        if !(1..=MAX_FREQUENCY_DAYS).contains(&days) {
            return Err(WateringError::Validation(format!(
                "Days must be between 1 and {MAX_FREQUENCY_DAYS}"
            )));
        }

        let since = Utc::now() - Duration::days(i64::from(days));
        let rows = self.store.waterings().list_since(user_id, since).await?;

        let entries: Vec<WateringEntry> = rows
            .into_iter()
            .map(|(watering, plant)| WateringEntry { watering, plant })
            .collect();

        let total_waterings = entries.len();
        let total_amount_ml = entries
            .iter()
            .map(|e| i64::from(e.watering.amount_ml))
            .sum();

        Ok(WateringHistory {
            days,
            total_waterings,
            total_amount_ml,
            history: bucket_by_day(entries),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Watering;
    use chrono::TimeZone;

    fn entry(id: i32, amount_ml: i32, watered_at: DateTime<Utc>) -> WateringEntry {
        WateringEntry {
            watering: Watering {
                id,
                plant_id: 1,
                user_id: 1,
                amount_ml,
                note: None,
                watered_at,
                created_at: watered_at,
            },
            plant: None,
        }
    }

    #[test]
    fn test_bucket_by_day_newest_first() {
        let day1 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap();

        let buckets = bucket_by_day(vec![
            entry(3, 250, day2),
            entry(2, 100, day1 + Duration::hours(10)),
            entry(1, 200, day1),
        ]);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, day2.date_naive());
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].date, day1.date_naive());
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].total_amount_ml, 300);
    }

    #[test]
    fn test_bucket_by_day_empty() {
        assert!(bucket_by_day(Vec::new()).is_empty());
    }
}
