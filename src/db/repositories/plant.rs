use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::{plants, prelude::*};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Plant {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: i32,
    pub water_frequency_days: i32,
    pub next_watering_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlant {
    pub user_id: i32,
    pub name: String,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: i32,
    pub water_frequency_days: i32,
    pub next_watering_at: DateTime<Utc>,
}

/// Partial update. `None` leaves a column as it is.
#[derive(Debug, Clone, Default)]
pub struct PlantChanges {
    pub name: Option<String>,
    pub species: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub water_amount_ml: Option<i32>,
    pub water_frequency_days: Option<i32>,
}

pub struct PlantRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> PlantRepository<'c, C> {
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, plant: NewPlant) -> Result<Plant> {
        let now = Utc::now();

        let active = plants::ActiveModel {
            user_id: Set(plant.user_id),
            name: Set(plant.name),
            species: Set(plant.species),
            purchase_date: Set(plant.purchase_date),
            image_url: Set(plant.image_url),
            notes: Set(plant.notes),
            location: Set(plant.location),
            water_amount_ml: Set(plant.water_amount_ml),
            water_frequency_days: Set(plant.water_frequency_days),
            next_watering_at: Set(plant.next_watering_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(self.conn)
            .await
            .context("Failed to insert plant")?;

        Ok(Self::map_model(model))
    }

    /// Fetches a plant only if it belongs to `user_id`.
    pub async fn find_owned(&self, id: i32, user_id: i32) -> Result<Option<Plant>> {
        let model = Plants::find_by_id(id)
            .filter(plants::Column::UserId.eq(user_id))
            .one(self.conn)
            .await
            .context("Failed to query plant")?;

        Ok(model.map(Self::map_model))
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Plant>> {
        let rows = Plants::find()
            .filter(plants::Column::UserId.eq(user_id))
            .order_by_desc(plants::Column::CreatedAt)
            .order_by_desc(plants::Column::Id)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        Plants::find()
            .filter(plants::Column::UserId.eq(user_id))
            .count(self.conn)
            .await
            .context("Failed to count plants")
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        changes: PlantChanges,
    ) -> Result<Option<Plant>> {
        let Some(model) = Plants::find_by_id(id)
            .filter(plants::Column::UserId.eq(user_id))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut active: plants::ActiveModel = model.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(species) = changes.species {
            active.species = Set(Some(species));
        }
        if let Some(date) = changes.purchase_date {
            active.purchase_date = Set(Some(date));
        }
        if let Some(image_url) = changes.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(location) = changes.location {
            active.location = Set(Some(location));
        }
        if let Some(amount) = changes.water_amount_ml {
            active.water_amount_ml = Set(amount);
        }
        if let Some(frequency) = changes.water_frequency_days {
            active.water_frequency_days = Set(frequency);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Some(Self::map_model(model)))
    }

    pub async fn update_next_watering(&self, id: i32, next: DateTime<Utc>) -> Result<()> {
        Plants::update_many()
            .col_expr(plants::Column::NextWateringAt, Expr::value(next))
            .col_expr(plants::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(plants::Column::Id.eq(id))
            .exec(self.conn)
            .await
            .context("Failed to update next watering time")?;

        Ok(())
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> Result<bool> {
        let result = Plants::delete_many()
            .filter(plants::Column::Id.eq(id))
            .filter(plants::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = Plants::delete_many()
            .filter(plants::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// All plants of every user whose due time is at or before `threshold`,
    /// earliest first.
    pub async fn list_due_by(&self, threshold: DateTime<Utc>) -> Result<Vec<Plant>> {
        let rows = Plants::find()
            .filter(plants::Column::NextWateringAt.lte(threshold))
            .order_by_asc(plants::Column::NextWateringAt)
            .order_by_asc(plants::Column::Id)
            .all(self.conn)
            .await
            .context("Failed to query due plants")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn list_due_for_user(
        &self,
        user_id: i32,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Plant>> {
        let rows = Plants::find()
            .filter(plants::Column::UserId.eq(user_id))
            .filter(plants::Column::NextWateringAt.lte(threshold))
            .order_by_asc(plants::Column::NextWateringAt)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Plants due within `[from, to]` for one user.
    pub async fn list_due_between(
        &self,
        user_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Plant>> {
        let rows = Plants::find()
            .filter(plants::Column::UserId.eq(user_id))
            .filter(plants::Column::NextWateringAt.gte(from))
            .filter(plants::Column::NextWateringAt.lte(to))
            .order_by_asc(plants::Column::NextWateringAt)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: plants::Model) -> Plant {
        Plant {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            species: m.species,
            purchase_date: m.purchase_date,
            image_url: m.image_url,
            notes: m.notes,
            location: m.location,
            water_amount_ml: m.water_amount_ml,
            water_frequency_days: m.water_frequency_days,
            next_watering_at: m.next_watering_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
