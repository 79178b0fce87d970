//! Long-running mode: one tick per cron firing until shutdown.

use std::sync::Arc;

use mtcam_core::AppConfig;
use mtcam_scraper::CamFetcher;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::tick::{build_fetcher, execute_tick};

pub(crate) async fn run_daemon(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let fetcher = build_fetcher(&config)?;

    let mut scheduler = build_scheduler(pool, fetcher, &config.schedule).await?;
    tracing::info!(schedule = %config.schedule, "daemon started");

    crate::shutdown_signal().await;
    scheduler.shutdown().await?;
    tracing::info!("daemon stopped");
    Ok(())
}

/// Builds and starts the scheduler with the tick job registered.
///
/// The returned [`JobScheduler`] must be kept alive; dropping it stops
/// the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if `schedule` is not a valid cron
/// expression or the scheduler cannot start.
async fn build_scheduler(
    pool: PgPool,
    fetcher: Arc<CamFetcher>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_tick_job(&scheduler, pool, fetcher, schedule).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the scrape tick. A firing that arrives while the previous tick
/// is still running is skipped.
async fn register_tick_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    fetcher: Arc<CamFetcher>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let running = Arc::new(Mutex::new(()));

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = pool.clone();
        let fetcher = Arc::clone(&fetcher);
        let running = Arc::clone(&running);

        Box::pin(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::warn!("scheduler: previous tick still running; skipping");
                return;
            };

            if let Err(e) = execute_tick(&pool, fetcher, chrono::Utc::now(), false).await {
                tracing::error!(error = %e, "scheduler: tick failed; nothing committed");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
