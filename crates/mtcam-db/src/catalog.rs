//! Database reads for `mountains` and `cameras`.

use chrono::{DateTime, Utc};
use mtcam_core::{Camera, Catalog, CatalogSource, Mountain, TzOffsets};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `mountains` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MountainRow {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub pathname: String,
    pub elevation_ft: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Raw Google Time Zone API payload. May be `NULL` or garbage; see
    /// [`TzOffsets::from_json_lenient`].
    pub tz_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MountainRow> for Mountain {
    fn from(row: MountainRow) -> Self {
        let tz = TzOffsets::from_json_lenient(row.tz_json.as_deref());
        Mountain {
            id: row.id,
            name: row.name,
            state: row.state,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation_ft: row.elevation_ft,
            tz,
        }
    }
}

/// A row from the `cameras` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CameraRow {
    pub id: i64,
    pub mountain_id: i64,
    pub name: String,
    pub pathname: String,
    pub elevation_ft: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub url: String,
    pub file_ext: String,
    pub is_active: bool,
    pub interval_mins: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CameraRow> for Camera {
    fn from(row: CameraRow) -> Self {
        Camera {
            id: row.id,
            mountain_id: row.mountain_id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation_ft: row.elevation_ft,
            url: row.url,
            file_ext: row.file_ext,
            is_active: row.is_active,
            interval_mins: row.interval_mins,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every mountain, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mountains(pool: &PgPool) -> Result<Vec<MountainRow>, DbError> {
    let rows = sqlx::query_as::<_, MountainRow>(
        "SELECT id, name, state, pathname, elevation_ft, latitude, longitude, tz_json, \
                created_at, updated_at \
         FROM mountains \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every camera, active or not, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cameras(pool: &PgPool) -> Result<Vec<CameraRow>, DbError> {
    let rows = sqlx::query_as::<_, CameraRow>(
        "SELECT id, mountain_id, name, pathname, elevation_ft, latitude, longitude, url, \
                file_ext, is_active, interval_mins, comment, created_at, updated_at \
         FROM cameras \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Reads mountains and cameras into a [`Catalog`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn load_catalog(pool: &PgPool) -> Result<Catalog, DbError> {
    let mountains = list_mountains(pool).await?;
    let cameras = list_cameras(pool).await?;

    Ok(Catalog {
        mountains: mountains.into_iter().map(Mountain::from).collect(),
        cameras: cameras.into_iter().map(Camera::from).collect(),
    })
}

/// Stores a fresh timezone payload for one mountain.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no mountain has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_mountain_tz(pool: &PgPool, id: i64, tz_json: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE mountains \
         SET tz_json = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(tz_json)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// [`CatalogSource`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogSource for PgCatalog {
    type Error = DbError;

    fn load_catalog(
        &self,
    ) -> impl std::future::Future<Output = Result<Catalog, Self::Error>> + Send {
        let pool = self.pool.clone();
        async move { load_catalog(&pool).await }
    }
}
