//! `mtcam records`: read back persisted outcomes.

use chrono::{TimeDelta, Utc};

pub(crate) async fn run_list(
    pool: &sqlx::PgPool,
    camera: Option<i64>,
    hours: u32,
) -> anyhow::Result<()> {
    let end = Utc::now();
    let start = end - TimeDelta::hours(i64::from(hours));
    let rows = mtcam_db::list_scrape_records(pool, camera, start, end).await?;

    if rows.is_empty() {
        println!("no scrape records in the last {hours}h");
        return Ok(());
    }

    for row in &rows {
        let record = row.to_record()?;
        let info = if record.filename.is_empty() {
            record.detail.as_str()
        } else {
            record.filename.as_str()
        };
        println!(
            "{}  camera {:>6}  {:<8}  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.camera_id,
            record.result.as_str(),
            info
        );
    }
    println!("{} record(s)", rows.len());
    Ok(())
}
