//! Scans for plants that need water and sends one reminder per user.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Days, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::{Plant, Store};
use crate::domain::{ReminderPayload, group_by_owner};
use crate::services::NotificationService;
use crate::services::notification_service::DeliveryOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub plants: usize,
    pub users: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
    pub skipped: usize,
}

pub struct ReminderService {
    store: Store,
    notifications: Arc<dyn NotificationService>,
    due_guard: Mutex<()>,
    digest_guard: Mutex<()>,
}

impl ReminderService {
    #[must_use]
    pub fn new(store: Store, notifications: Arc<dyn NotificationService>) -> Self {
        Self {
            store,
            notifications,
            due_guard: Mutex::new(()),
            digest_guard: Mutex::new(()),
        }
    }

    /// Plants due at or before `now`, grouped by owner.
    pub async fn scan_due(&self, now: DateTime<Utc>) -> Result<BTreeMap<i32, Vec<Plant>>> {
        let plants = self.store.plants().list_due_by(now).await?;
        Ok(group_by_owner(plants, |p| p.user_id))
    }

    /// Plants due within the next calendar day, grouped by owner.
    pub async fn scan_upcoming(&self, now: DateTime<Utc>) -> Result<BTreeMap<i32, Vec<Plant>>> {
        let threshold = now
            .checked_add_days(Days::new(1))
            .unwrap_or_else(|| now + Duration::days(1));

        let plants = self.store.plants().list_due_by(threshold).await?;
        Ok(group_by_owner(plants, |p| p.user_id))
    }

    /// Sends a "time to water" reminder to every user with overdue plants.
    ///
    /// Returns `None` when the previous due check is still running.
    pub async fn run_due_check(&self, now: DateTime<Utc>) -> Result<Option<ScanSummary>> {
        let Ok(_guard) = self.due_guard.try_lock() else {
            warn!(job_name = "due_check", "Previous due check still in progress, skipping");
            return Ok(None);
        };

        let groups = self.scan_due(now).await?;
        let payloads = groups.into_iter().map(|(user_id, plants)| {
            let named: Vec<(i32, &str)> = plants.iter().map(|p| (p.id, p.name.as_str())).collect();
            (user_id, plants.len(), ReminderPayload::due(&named))
        });

        let summary = self.dispatch(payloads.collect()).await;
        info!(
            job_name = "due_check",
            plants = summary.plants,
            users = summary.users,
            delivered = summary.delivered,
            "Watering reminders sent"
        );

        Ok(Some(summary))
    }

    /// Sends the daily digest of plants due now or within a day.
    ///
    /// Returns `None` when the previous digest is still running.
    pub async fn run_daily_digest(&self, now: DateTime<Utc>) -> Result<Option<ScanSummary>> {
        let Ok(_guard) = self.digest_guard.try_lock() else {
            warn!(job_name = "daily_digest", "Previous digest still in progress, skipping");
            return Ok(None);
        };

        let groups = self.scan_upcoming(now).await?;
        let payloads = groups.into_iter().map(|(user_id, plants)| {
            let ids: Vec<i32> = plants.iter().map(|p| p.id).collect();
            (user_id, plants.len(), ReminderPayload::digest(&ids))
        });

        let summary = self.dispatch(payloads.collect()).await;
        info!(
            job_name = "daily_digest",
            plants = summary.plants,
            users = summary.users,
            delivered = summary.delivered,
            "Daily digest sent"
        );

        Ok(Some(summary))
    }

    async fn dispatch(&self, payloads: Vec<(i32, usize, ReminderPayload)>) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for (user_id, plant_count, payload) in payloads {
            summary.users += 1;
            summary.plants += plant_count;

            match self.notifications.send_to_user(user_id, &payload).await {
                Ok(reports) => {
                    for report in &reports {
                        match report.outcome {
                            DeliveryOutcome::Delivered => summary.delivered += 1,
                            DeliveryOutcome::Gone(_) => summary.pruned += 1,
                            DeliveryOutcome::Failed(_) => summary.failed += 1,
                            DeliveryOutcome::Skipped => summary.skipped += 1,
                        }
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(user_id, error = %e, "Failed to send reminder");
                }
            }
        }

        summary
    }
}
