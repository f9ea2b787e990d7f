use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::push::{DisabledPushGateway, HttpPushGateway, PushGateway};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, NotificationService, PlantService, ReminderService, SeaOrmAuthService,
    SeaOrmNotificationService, SeaOrmPlantService, SeaOrmSystemService, SeaOrmUserService,
    SeaOrmWateringService, SystemService, UserService, WateringService,
};

/// Picks the push transport from config.
pub fn build_push_gateway(config: &Config) -> anyhow::Result<Arc<dyn PushGateway>> {
    if config.push.enabled {
        info!("Push notifications enabled via relay {}", config.push.relay_url);
        let gateway = HttpPushGateway::new(&config.push)
            .map_err(|e| anyhow::anyhow!("Failed to build push client: {e}"))?;
        Ok(Arc::new(gateway))
    } else {
        info!("Push notifications disabled");
        Ok(Arc::new(DisabledPushGateway))
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub plant_service: Arc<dyn PlantService>,

    pub watering_service: Arc<dyn WateringService>,

    pub notification_service: Arc<dyn NotificationService>,

    pub system_service: Arc<dyn SystemService>,

    pub reminders: Arc<ReminderService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let gateway = build_push_gateway(&config)?;
        Self::with_gateway(config, gateway).await
    }

    /// Builds the state with an explicit push transport.
    pub async fn with_gateway(
        config: Config,
        gateway: Arc<dyn PushGateway>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let user_service = Arc::new(SeaOrmUserService::new(store.clone())) as Arc<dyn UserService>;

        let plant_service =
            Arc::new(SeaOrmPlantService::new(store.clone())) as Arc<dyn PlantService>;

        let watering_service =
            Arc::new(SeaOrmWateringService::new(store.clone())) as Arc<dyn WateringService>;

        let notification_service = Arc::new(SeaOrmNotificationService::new(
            store.clone(),
            gateway,
            &config.push,
        )) as Arc<dyn NotificationService>;

        let reminders = Arc::new(ReminderService::new(
            store.clone(),
            notification_service.clone(),
        ));

        let config = Arc::new(RwLock::new(config));

        let system_service = Arc::new(SeaOrmSystemService::new(store.clone(), config.clone()))
            as Arc<dyn SystemService>;

        Ok(Self {
            config,
            store,
            auth_service,
            user_service,
            plant_service,
            watering_service,
            notification_service,
            system_service,
            reminders,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
