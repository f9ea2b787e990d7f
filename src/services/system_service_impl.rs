//! `SeaORM` implementation of the `SystemService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::Config;
use crate::db::Store;
use crate::services::system_service::{SystemError, SystemService, SystemStatus};

pub struct SeaOrmSystemService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmSystemService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl SystemService for SeaOrmSystemService {
    async fn check_ready(&self) -> Result<(), SystemError> {
        self.store.ping().await?;
        Ok(())
    }

    async fn get_status(
        &self,
        uptime_secs: u64,
        version: &str,
    ) -> Result<SystemStatus, SystemError> {
        let database_ok = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database ping failed");
                false
            }
        };

        let config = self.config.read().await;

        Ok(SystemStatus {
            version: version.to_string(),
            uptime_seconds: uptime_secs,
            database_ok,
            push_enabled: config.push.enabled,
            scheduler_enabled: config.scheduler.enabled,
        })
    }
}
