/// Background sweep scheduler
///
/// Re-runs host discovery on a cron schedule using tokio-cron-scheduler, so
/// the checkers keep reconciling host status without an external trigger.

use crate::cmdb::discovery::HostDiscovery;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

pub struct SweepScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    job_uuid: RwLock<Option<Uuid>>,
    discovery: HostDiscovery,
}

impl SweepScheduler {
    pub async fn new(discovery: HostDiscovery) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            job_uuid: RwLock::new(None),
            discovery,
        })
    }

    /// Register the sweep job on `schedule` (cron with seconds) and start ticking.
    /// Calling it again replaces the previous schedule.
    pub async fn start(&self, schedule: &str) -> Result<()> {
        tracing::info!("⏰ Scheduling host sweep: {}", schedule);

        let discovery = self.discovery.clone();
        let job = Job::new_async(schedule, move |_uuid, _l| {
            let discovery = discovery.clone();

            Box::pin(async move {
                tracing::debug!("🔔 Host sweep triggered");
                match discovery.start_host_check().await {
                    Ok(count) => tracing::debug!("✅ Scheduled sweep queued {} host(s)", count),
                    Err(e) => tracing::error!("❌ Scheduled host sweep failed: {}", e),
                }
            })
        })?;

        {
            let mut job_uuid = self.job_uuid.write().await;
            let scheduler = self.scheduler.read().await;
            if let Some(old) = job_uuid.take() {
                if let Err(e) = scheduler.remove(&old).await {
                    tracing::warn!("⚠️ Failed to remove previous sweep job {}: {}", old, e);
                }
            }
            *job_uuid = Some(scheduler.add(job).await?);
            scheduler.start().await?;
        }

        tracing::info!("✅ Host sweep scheduler started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        tracing::info!("⏹️ Stopping host sweep scheduler");
        self.job_uuid.write().await.take();

        let mut scheduler = self.scheduler.write().await;
        scheduler.shutdown().await?;

        tracing::info!("✅ Host sweep scheduler stopped");
        Ok(())
    }
}
