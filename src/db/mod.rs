use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::plant::{NewPlant, Plant, PlantChanges};
pub use repositories::push_subscription::PushSubscription;
pub use repositories::user::{NewUser, ProfileChanges, User};
pub use repositories::watering::{NewWatering, PlantSummary, Watering};

use repositories::plant::PlantRepository;
use repositories::push_subscription::PushSubscriptionRepository;
use repositories::user::UserRepository;
use repositories::watering::WateringRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
        let in_memory = path_str.starts_with(":memory:");

        if !in_memory {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection would get its own empty in-memory database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Recycling the only in-memory connection would drop the database.
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn plants(&self) -> PlantRepository<'_, DatabaseConnection> {
        PlantRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn waterings(&self) -> WateringRepository<'_, DatabaseConnection> {
        WateringRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn push_subscriptions(&self) -> PushSubscriptionRepository<'_, DatabaseConnection> {
        PushSubscriptionRepository::new(&self.conn)
    }
}
