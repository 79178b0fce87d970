//! One orchestrator tick: load catalog, gate cameras, run fetch jobs
//! concurrently, collect exactly one record per launched job.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use futures::FutureExt;
use mtcam_core::{gate, CatalogSource, Gate, ScrapeBatch, ScrapeRecord, ScrapeResult};
use thiserror::Error;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::Instant;
use uuid::Uuid;

use crate::fetch::CamFetcher;

/// Extra time the collector waits past the job deadline before aborting
/// tasks that have not reported back.
pub const JOIN_GRACE: Duration = Duration::from_secs(2);

/// Failure detail for a task that was cancelled before reporting.
const CANCELLED_DETAIL: &str = "cancelled";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Run one tick and return its batch. Nothing is persisted here.
///
/// Every camera that passes the [`gate`] gets its own task and contributes
/// exactly one record. Jobs still running when the deadline (the fetcher's
/// job timeout, plus [`JOIN_GRACE`]) passes are aborted and recorded as
/// timeouts. Records are sorted by camera id.
///
/// # Errors
///
/// Returns [`OrchestratorError::Catalog`] if the catalog cannot be loaded.
/// No jobs are started in that case.
pub async fn run_batch<C>(
    source: &C,
    fetcher: Arc<CamFetcher>,
    now: DateTime<Utc>,
) -> Result<ScrapeBatch, OrchestratorError>
where
    C: CatalogSource,
{
    let catalog = source
        .load_catalog()
        .await
        .map_err(|e| OrchestratorError::Catalog(Box::new(e)))?;

    let timestamp = now.duration_trunc(TimeDelta::seconds(1)).unwrap_or(now);
    let batch_id = Uuid::new_v4();
    let minute = timestamp.minute();
    let mountains = catalog.mountains_by_id();
    let deadline = Instant::now() + fetcher.job_timeout();

    let mut jobs: JoinSet<ScrapeRecord> = JoinSet::new();
    let mut outstanding: HashMap<task::Id, i64> = HashMap::new();

    for camera in &catalog.cameras {
        match gate(camera, minute) {
            Gate::Scheduled => {}
            Gate::Inactive | Gate::OffCadence => continue,
        }

        let Some(mountain) = mountains.get(&camera.mountain_id) else {
            tracing::warn!(
                camera = %camera.name,
                mountain_id = camera.mountain_id,
                "skipping camera with unknown mountain"
            );
            continue;
        };

        let camera = camera.clone();
        let mountain = (*mountain).clone();
        let fetcher = Arc::clone(&fetcher);
        let camera_id = camera.id;

        let handle = jobs.spawn(async move {
            let job = fetcher.scrape(&camera, &mountain, timestamp, deadline);
            match AssertUnwindSafe(job).catch_unwind().await {
                Ok(record) => record,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(camera = %camera.name, panic = %message, "fetch job panicked");
                    ScrapeRecord::failure(camera.id, timestamp, format!("panic: {message}"))
                }
            }
        });
        outstanding.insert(handle.id(), camera_id);
    }

    let scheduled = outstanding.len();
    let mut records = collect(jobs, outstanding, deadline + JOIN_GRACE, timestamp).await;
    records.sort_by_key(|r| r.camera_id);

    let batch = ScrapeBatch {
        id: batch_id,
        timestamp,
        records,
    };

    tracing::info!(
        batch_id = %batch.id,
        timestamp = %batch.timestamp,
        scheduled,
        success = batch.count(ScrapeResult::Success),
        failure = batch.count(ScrapeResult::Failure),
        idle = batch.count(ScrapeResult::Idle),
        "tick complete"
    );

    Ok(batch)
}

/// Wait for every task until `join_deadline`, then abort the rest.
///
/// Each entry of `outstanding` yields exactly one record: the task's own,
/// a failure for a task that was cancelled, or a timeout for a task still
/// running at the deadline.
async fn collect(
    mut jobs: JoinSet<ScrapeRecord>,
    mut outstanding: HashMap<task::Id, i64>,
    join_deadline: Instant,
    timestamp: DateTime<Utc>,
) -> Vec<ScrapeRecord> {
    let mut records = Vec::with_capacity(outstanding.len());

    loop {
        match tokio::time::timeout_at(join_deadline, jobs.join_next_with_id()).await {
            Ok(Some(Ok((id, record)))) => {
                outstanding.remove(&id);
                records.push(record);
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "fetch task did not complete");
                if let Some(camera_id) = outstanding.remove(&e.id()) {
                    records.push(ScrapeRecord::failure(
                        camera_id,
                        timestamp,
                        join_failure_detail(&e),
                    ));
                }
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    outstanding = jobs.len(),
                    "join deadline passed; aborting outstanding fetch jobs"
                );
                jobs.abort_all();
                break;
            }
        }
    }

    records.extend(
        outstanding
            .into_values()
            .map(|camera_id| ScrapeRecord::timed_out(camera_id, timestamp)),
    );
    records
}

fn join_failure_detail(e: &JoinError) -> String {
    if e.is_cancelled() {
        CANCELLED_DETAIL.to_string()
    } else {
        format!("task failed: {e}")
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
