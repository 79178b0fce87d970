//! One scrape tick: orchestrate, then commit the batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mtcam_core::{AppConfig, ScrapeBatch, ScrapeResult};
use mtcam_scraper::{CamFetcher, FetcherConfig};

/// Build the shared fetcher from config.
pub(crate) fn build_fetcher(config: &AppConfig) -> anyhow::Result<Arc<CamFetcher>> {
    let fetcher = CamFetcher::new(&FetcherConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build camera fetcher: {e}"))?;
    Ok(Arc::new(fetcher))
}

/// Run a tick against the database catalog and commit its records.
///
/// The pool is used twice: to read the catalog before any job starts, and
/// to commit once every job has reported. Nothing is written if the
/// orchestrator fails.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the commit fails.
pub(crate) async fn execute_tick(
    pool: &sqlx::PgPool,
    fetcher: Arc<CamFetcher>,
    now: DateTime<Utc>,
    dry_run: bool,
) -> anyhow::Result<ScrapeBatch> {
    let source = mtcam_db::PgCatalog::new(pool.clone());
    let batch = mtcam_scraper::run_batch(&source, fetcher, now).await?;

    if dry_run {
        return Ok(batch);
    }

    let written = mtcam_db::commit_scrape_batch(pool, &batch).await?;
    tracing::info!(batch_id = %batch.id, rows = written, "batch committed");
    Ok(batch)
}

pub(crate) async fn run_tick(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<()> {
    let fetcher = build_fetcher(config)?;
    let batch = execute_tick(pool, fetcher, Utc::now(), dry_run).await?;

    if dry_run {
        println!("dry-run: batch {} not committed", batch.id);
        print!("{}", format_batch(&batch));
    } else {
        println!(
            "batch {}: {} success, {} failure, {} idle",
            batch.id,
            batch.count(ScrapeResult::Success),
            batch.count(ScrapeResult::Failure),
            batch.count(ScrapeResult::Idle),
        );
    }
    Ok(())
}

/// Render one line per record: camera id, result, then filename or detail.
pub(crate) fn format_batch(batch: &ScrapeBatch) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "{:>8}  {:<8}  {}", "camera", "result", "info");
    for record in &batch.records {
        let info = match record.result {
            ScrapeResult::Success => record.filename.as_str(),
            ScrapeResult::Failure => record.detail.as_str(),
            ScrapeResult::Idle => "",
        };
        let _ = writeln!(
            out,
            "{:>8}  {:<8}  {}",
            record.camera_id,
            record.result.as_str(),
            info
        );
    }
    out
}

#[cfg(test)]
#[path = "tick_test.rs"]
mod tick_test;
