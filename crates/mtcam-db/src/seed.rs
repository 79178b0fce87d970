use mtcam_core::CatalogFile;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub mountains: usize,
    pub cameras: usize,
}

/// Upsert mountains and cameras from the catalog file.
///
/// Mountains are keyed by pathname, cameras by `(mountain_id, pathname)`.
/// A mountain without `timezone` in the file keeps whatever `tz_json` it
/// already has. All upserts run inside a single transaction; if any
/// operation fails the entire seed is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for mountain in &catalog.mountains {
        let tz_json = mountain
            .timezone
            .map(|tz| serde_json::to_string(&tz))
            .transpose()?;

        let mountain_id: i64 = sqlx::query_scalar(
            "INSERT INTO mountains (name, state, pathname, elevation_ft, latitude, longitude, tz_json) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (pathname) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 state = EXCLUDED.state, \
                 elevation_ft = EXCLUDED.elevation_ft, \
                 latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude, \
                 tz_json = COALESCE(EXCLUDED.tz_json, mountains.tz_json), \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(&mountain.name)
        .bind(&mountain.state)
        .bind(mountain.pathname())
        .bind(mountain.elevation_ft)
        .bind(mountain.latitude)
        .bind(mountain.longitude)
        .bind(tz_json)
        .fetch_one(&mut *tx)
        .await?;

        for camera in &mountain.cameras {
            sqlx::query(
                "INSERT INTO cameras \
                     (mountain_id, name, pathname, elevation_ft, latitude, longitude, \
                      url, file_ext, is_active, interval_mins, comment) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                 ON CONFLICT (mountain_id, pathname) DO UPDATE SET \
                     name = EXCLUDED.name, \
                     elevation_ft = EXCLUDED.elevation_ft, \
                     latitude = EXCLUDED.latitude, \
                     longitude = EXCLUDED.longitude, \
                     url = EXCLUDED.url, \
                     file_ext = EXCLUDED.file_ext, \
                     is_active = EXCLUDED.is_active, \
                     interval_mins = EXCLUDED.interval_mins, \
                     comment = EXCLUDED.comment, \
                     updated_at = NOW()",
            )
            .bind(mountain_id)
            .bind(&camera.name)
            .bind(camera.pathname())
            .bind(camera.elevation_ft)
            .bind(camera.latitude)
            .bind(camera.longitude)
            .bind(&camera.url)
            .bind(camera.file_ext.to_lowercase())
            .bind(camera.is_active)
            .bind(camera.interval_mins)
            .bind(camera.comment.as_deref().unwrap_or_default())
            .execute(&mut *tx)
            .await?;

            summary.cameras += 1;
        }

        summary.mountains += 1;
    }

    tx.commit().await?;
    Ok(summary)
}
