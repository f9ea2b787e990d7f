use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

use crate::entities::{plants, prelude::*, waterings};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Watering {
    pub id: i32,
    pub plant_id: i32,
    pub user_id: i32,
    pub amount_ml: i32,
    pub note: Option<String>,
    pub watered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The few plant columns shown next to a watering.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlantSummary {
    pub id: i32,
    pub name: String,
    pub species: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWatering {
    pub plant_id: i32,
    pub user_id: i32,
    pub amount_ml: i32,
    pub note: Option<String>,
    pub watered_at: DateTime<Utc>,
}

pub struct WateringRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> WateringRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, watering: NewWatering) -> Result<Watering> {
        let active = waterings::ActiveModel {
            plant_id: Set(watering.plant_id),
            user_id: Set(watering.user_id),
            amount_ml: Set(watering.amount_ml),
            note: Set(watering.note),
            watered_at: Set(watering.watered_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active
            .insert(self.conn)
            .await
            .context("Failed to insert watering")?;

        Ok(Self::map_model(model))
    }

    pub async fn find_owned(&self, id: i32, user_id: i32) -> Result<Option<Watering>> {
        let model = Waterings::find_by_id(id)
            .filter(waterings::Column::UserId.eq(user_id))
            .one(self.conn)
            .await
            .context("Failed to query watering")?;

        Ok(model.map(Self::map_model))
    }

    pub async fn find_owned_with_plant(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<Option<(Watering, Option<PlantSummary>)>> {
        let row = Waterings::find_by_id(id)
            .filter(waterings::Column::UserId.eq(user_id))
            .find_also_related(Plants)
            .one(self.conn)
            .await?;

        Ok(row.map(|(w, p)| (Self::map_model(w), p.map(Self::map_plant))))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Waterings::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = Waterings::delete_many()
            .filter(waterings::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Latest watering by event time. Ties on `watered_at` go to the newest row.
    pub async fn find_latest_for_plant(&self, plant_id: i32) -> Result<Option<Watering>> {
        let model = Waterings::find()
            .filter(waterings::Column::PlantId.eq(plant_id))
            .order_by_desc(waterings::Column::WateredAt)
            .order_by_desc(waterings::Column::Id)
            .one(self.conn)
            .await
            .context("Failed to query latest watering")?;

        Ok(model.map(Self::map_model))
    }

    pub async fn recent_for_plant(&self, plant_id: i32, limit: u64) -> Result<Vec<Watering>> {
        let rows = Waterings::find()
            .filter(waterings::Column::PlantId.eq(plant_id))
            .order_by_desc(waterings::Column::WateredAt)
            .order_by_desc(waterings::Column::Id)
            .limit(limit)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Latest watering per plant for the given plants.
    pub async fn latest_for_plants(&self, plant_ids: &[i32]) -> Result<HashMap<i32, Watering>> {
        if plant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Waterings::find()
            .filter(waterings::Column::PlantId.is_in(plant_ids.to_vec()))
            .order_by_desc(waterings::Column::WateredAt)
            .order_by_desc(waterings::Column::Id)
            .all(self.conn)
            .await?;

        let mut map = HashMap::new();
        for row in rows {
            map.entry(row.plant_id)
                .or_insert_with(|| Self::map_model(row));
        }

        Ok(map)
    }

    pub async fn count_for_plants(&self, plant_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        if plant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let results: Vec<(i32, i64)> = Waterings::find()
            .select_only()
            .column(waterings::Column::PlantId)
            .column_as(waterings::Column::Id.count(), "count")
            .filter(waterings::Column::PlantId.is_in(plant_ids.to_vec()))
            .group_by(waterings::Column::PlantId)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(results
            .into_iter()
            .map(|(id, count)| (id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// Newest first, optionally restricted to one plant.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
    ) -> Result<Vec<(Watering, Option<PlantSummary>)>> {
        let mut query = Waterings::find().filter(waterings::Column::UserId.eq(user_id));
        if let Some(plant_id) = plant_id {
            query = query.filter(waterings::Column::PlantId.eq(plant_id));
        }

        let rows = query
            .order_by_desc(waterings::Column::WateredAt)
            .order_by_desc(waterings::Column::Id)
            .find_also_related(Plants)
            .all(self.conn)
            .await
            .context("Failed to list waterings")?;

        Ok(rows
            .into_iter()
            .map(|(w, p)| (Self::map_model(w), p.map(Self::map_plant)))
            .collect())
    }

    pub async fn count_for_user(
        &self,
        user_id: i32,
        plant_id: Option<i32>,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let mut query = Waterings::find().filter(waterings::Column::UserId.eq(user_id));
        if let Some(plant_id) = plant_id {
            query = query.filter(waterings::Column::PlantId.eq(plant_id));
        }
        if let Some(since) = since {
            query = query.filter(waterings::Column::WateredAt.gte(since));
        }

        query
            .count(self.conn)
            .await
            .context("Failed to count waterings")
    }

    pub async fn average_amount(&self, user_id: i32, plant_id: Option<i32>) -> Result<Option<f64>> {
        let mut query = Waterings::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(waterings::Column::AmountMl))),
                "average",
            )
            .filter(waterings::Column::UserId.eq(user_id));
        if let Some(plant_id) = plant_id {
            query = query.filter(waterings::Column::PlantId.eq(plant_id));
        }

        let average: Option<Option<f64>> = query.into_tuple().one(self.conn).await?;
        Ok(average.flatten())
    }

    /// Waterings of one user at or after `since`, newest first, with their plant.
    pub async fn list_since(
        &self,
        user_id: i32,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Watering, Option<PlantSummary>)>> {
        let rows = Waterings::find()
            .filter(waterings::Column::UserId.eq(user_id))
            .filter(waterings::Column::WateredAt.gte(since))
            .order_by_desc(waterings::Column::WateredAt)
            .order_by_desc(waterings::Column::Id)
            .find_also_related(Plants)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(w, p)| (Self::map_model(w), p.map(Self::map_plant)))
            .collect())
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: waterings::Model) -> Watering {
        Watering {
            id: m.id,
            plant_id: m.plant_id,
            user_id: m.user_id,
            amount_ml: m.amount_ml,
            note: m.note,
            watered_at: m.watered_at,
            created_at: m.created_at,
        }
    }

    fn map_plant(m: plants::Model) -> PlantSummary {
        PlantSummary {
            id: m.id,
            name: m.name,
            species: m.species,
            image_url: m.image_url,
        }
    }
}
