//! Database operations for `scrape_records`.

use chrono::{DateTime, Utc};
use mtcam_core::{ScrapeBatch, ScrapeRecord};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `scrape_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRecordRow {
    pub id: i64,
    pub camera_id: i64,
    pub batch_id: Uuid,
    /// One of `success`, `failure`, `idle` (enforced by a CHECK constraint).
    pub result: String,
    pub detail: String,
    pub filename: String,
    /// The batch timestamp.
    pub created_at: DateTime<Utc>,
    /// When the row was actually written.
    pub recorded_at: DateTime<Utc>,
}

impl ScrapeRecordRow {
    /// Convert back into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidResult`] if `result` is not a known value.
    pub fn to_record(&self) -> Result<ScrapeRecord, DbError> {
        Ok(ScrapeRecord {
            camera_id: self.camera_id,
            created_at: self.created_at,
            result: self.result.parse()?,
            detail: self.detail.clone(),
            filename: self.filename.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Persist every record of a batch in one transaction.
///
/// Either all rows are written or none are: any failing insert returns early
/// and the uncommitted transaction is rolled back when dropped. Records are
/// checked for internal consistency before the transaction is opened.
///
/// Returns the number of rows written. An empty batch is a no-op.
///
/// # Errors
///
/// Returns [`DbError::InconsistentRecord`] if any record's fields disagree
/// with its result, or [`DbError::Sqlx`] if the transaction fails.
pub async fn commit_scrape_batch(pool: &PgPool, batch: &ScrapeBatch) -> Result<usize, DbError> {
    if batch.records.is_empty() {
        return Ok(0);
    }

    if let Some(bad) = batch.records.iter().find(|r| !r.is_consistent()) {
        return Err(DbError::InconsistentRecord {
            camera_id: bad.camera_id,
            result: bad.result,
        });
    }

    let mut tx = pool.begin().await?;

    for record in &batch.records {
        sqlx::query(
            "INSERT INTO scrape_records \
                 (camera_id, batch_id, result, detail, filename, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.camera_id)
        .bind(batch.id)
        .bind(record.result.as_str())
        .bind(&record.detail)
        .bind(&record.filename)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(batch_id = %batch.id, rows = batch.records.len(), "committed scrape batch");
    Ok(batch.records.len())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns records with `start <= created_at < end`, optionally for one
/// camera, ordered by creation time then camera.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_records(
    pool: &PgPool,
    camera_id: Option<i64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ScrapeRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRecordRow>(
        "SELECT id, camera_id, batch_id, result, detail, filename, created_at, recorded_at \
         FROM scrape_records \
         WHERE ($1::BIGINT IS NULL OR camera_id = $1) \
           AND created_at >= $2 AND created_at < $3 \
         ORDER BY created_at, camera_id",
    )
    .bind(camera_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every record written for `batch_id`, ordered by camera.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_batch_records(
    pool: &PgPool,
    batch_id: Uuid,
) -> Result<Vec<ScrapeRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRecordRow>(
        "SELECT id, camera_id, batch_id, result, detail, filename, created_at, recorded_at \
         FROM scrape_records \
         WHERE batch_id = $1 \
         ORDER BY camera_id",
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
