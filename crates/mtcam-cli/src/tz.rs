//! `mtcam tz refresh`: pull current UTC/DST offsets for every mountain.

use futures::stream::{self, StreamExt};
use mtcam_core::AppConfig;
use mtcam_scraper::TimezoneClient;

const MAX_CONCURRENT_LOOKUPS: usize = 4;

pub(crate) async fn run_refresh(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let api_key = config
        .google_tz_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("GOOGLE_TZ_API_KEY is not set"))?;
    let client = TimezoneClient::new(
        api_key,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build time zone client: {e}"))?;

    let (updated, failed) = refresh_all(pool, &client).await?;
    println!("refreshed {updated} mountain(s), {failed} failed");
    Ok(())
}

/// Look up and store offsets for every mountain. A failed lookup or update
/// is logged and does not stop the others. Returns `(updated, failed)`.
pub(crate) async fn refresh_all(
    pool: &sqlx::PgPool,
    client: &TimezoneClient,
) -> anyhow::Result<(usize, usize)> {
    let mountains = mtcam_db::list_mountains(pool).await?;
    let now = chrono::Utc::now();

    let outcomes: Vec<bool> = stream::iter(&mountains)
        .map(|m| async move {
            let tz = match client.lookup(m.latitude, m.longitude, now).await {
                Ok(tz) => tz,
                Err(e) => {
                    tracing::warn!(mountain = %m.name, error = %e, "time zone lookup failed");
                    return false;
                }
            };

            let stored = match serde_json::to_string(&tz) {
                Ok(json) => mtcam_db::update_mountain_tz(pool, m.id, &json)
                    .await
                    .map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            };

            match stored {
                Ok(()) => {
                    tracing::info!(
                        mountain = %m.name,
                        zone = %tz.time_zone_id,
                        raw_offset = tz.raw_offset,
                        dst_offset = tz.dst_offset,
                        "time zone refreshed"
                    );
                    true
                }
                Err(e) => {
                    tracing::warn!(mountain = %m.name, error = %e, "failed to store time zone");
                    false
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await;

    let updated = outcomes.iter().filter(|ok| **ok).count();
    Ok((updated, outcomes.len() - updated))
}

#[cfg(test)]
#[path = "tz_test.rs"]
mod tz_test;
