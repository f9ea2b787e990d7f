use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::ReminderService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReminderJob {
    DueCheck,
    DailyDigest,
}

impl ReminderJob {
    const fn name(self) -> &'static str {
        match self {
            Self::DueCheck => "due_check",
            Self::DailyDigest => "daily_digest",
        }
    }
}

pub struct Scheduler {
    reminders: Arc<ReminderService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(reminders: Arc<ReminderService>, config: SchedulerConfig) -> Self {
        Self {
            reminders,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        sched
            .add(self.reminder_job(&self.config.due_check_cron, ReminderJob::DueCheck)?)
            .await?;
        sched
            .add(self.reminder_job(&self.config.digest_cron, ReminderJob::DailyDigest)?)
            .await?;
        sched.start().await?;

        info!("Due check scheduled: {}", self.config.due_check_cron);
        info!("Daily digest scheduled: {}", self.config.digest_cron);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    fn reminder_job(&self, cron_expr: &str, kind: ReminderJob) -> Result<Job> {
        let reminders = Arc::clone(&self.reminders);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let reminders = Arc::clone(&reminders);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_job(&reminders, kind).await;
            })
        })?;

        Ok(job)
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }
}

async fn run_job(reminders: &ReminderService, kind: ReminderJob) {
    let job_name = kind.name();
    let start = Instant::now();
    info!(event = "job_started", job_name, "Starting scheduled reminder run");

    let now = Utc::now();
    let result = match kind {
        ReminderJob::DueCheck => reminders.run_due_check(now).await,
        ReminderJob::DailyDigest => reminders.run_daily_digest(now).await,
    };

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(Some(summary)) => info!(
            event = "job_finished",
            job_name,
            duration_ms,
            plants = summary.plants,
            users = summary.users,
            delivered = summary.delivered,
            failed = summary.failed,
            pruned = summary.pruned,
            skipped = summary.skipped,
            "Scheduled reminder run finished"
        ),
        Ok(None) => info!(event = "job_skipped", job_name, "Scheduled reminder run skipped"),
        Err(e) => error!(
            event = "job_failed",
            job_name,
            duration_ms,
            error = %e,
            "Scheduled reminder run failed"
        ),
    }
}
