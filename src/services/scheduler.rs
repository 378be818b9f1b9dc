use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::temp_passwords::TempPasswordCache;
use crate::config::SchedulerConfig;
use crate::storage::Storage;

/// Cron expression firing every `minutes` minutes. An hour or more runs hourly.
#[must_use]
pub fn every_minutes(minutes: u32) -> String {
    match minutes.max(1) {
        m if m >= 60 => "0 0 * * * *".to_string(),
        1 => "0 * * * * *".to_string(),
        m => format!("0 */{m} * * * *"),
    }
}

pub struct Scheduler {
    storage: Arc<Storage>,
    temp_passwords: Arc<TempPasswordCache>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        storage: Arc<Storage>,
        temp_passwords: Arc<TempPasswordCache>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            temp_passwords,
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

        let purge_cron = every_minutes(self.config.temp_password_purge_minutes);
        let temp_passwords = Arc::clone(&self.temp_passwords);
        let running = Arc::clone(&self.running);
        let purge_job = Job::new_async(purge_cron.as_str(), move |_uuid, _lock| {
            let temp_passwords = Arc::clone(&temp_passwords);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let purged = temp_passwords.purge_expired().await;
                if purged > 0 {
                    info!(
                        event = "job_finished",
                        job_name = "purge_temp_passwords",
                        purged,
                        "Expired password reveals purged"
                    );
                }
            })
        })?;
        sched.add(purge_job).await?;
        info!("Temp password purge scheduled: {}", purge_cron);

        if self.config.remote_resync_minutes > 0 && self.storage.remote().is_some() {
            let resync_cron = every_minutes(self.config.remote_resync_minutes);
            let storage = Arc::clone(&self.storage);
            let running = Arc::clone(&self.running);
            let resync_job = Job::new_async(resync_cron.as_str(), move |_uuid, _lock| {
                let storage = Arc::clone(&storage);
                let running = Arc::clone(&running);
                Box::pin(async move {
                    if !*running.read().await {
                        return;
                    }
                    let start = std::time::Instant::now();
                    info!(event = "job_started", job_name = "remote_resync", "Starting remote resync");

                    match storage.resync_from_remote().await {
                        Ok(changed) => info!(
                            event = "job_finished",
                            job_name = "remote_resync",
                            changed,
                            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                            "Remote resync finished"
                        ),
                        Err(e) => {
                            error!(event = "job_failed", job_name = "remote_resync", error = %e, "Remote resync failed");
                        }
                    }
                })
            })?;
            sched.add(resync_job).await?;
            info!("Remote resync scheduled: {}", resync_cron);
        }

        sched.start().await?;

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs every job once, outside the schedule.
    pub async fn run_once(&self) -> Result<()> {
        info!("Running scheduled jobs manually...");
        let purged = self.temp_passwords.purge_expired().await;
        let changed = self.storage.resync_from_remote().await?;
        info!(purged, changed, "Manual run finished");
        Ok(())
    }
}
