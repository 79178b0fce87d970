//! `mtcam db ...` handlers.

use mtcam_core::AppConfig;

pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    mtcam_db::ping(pool).await?;
    println!("database reachable");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = mtcam_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load the catalog file and upsert it in one transaction.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let catalog = mtcam_core::load_catalog_file(&config.catalog_path)?;
    let summary = mtcam_db::seed_catalog(pool, &catalog).await?;
    tracing::info!(
        path = %config.catalog_path.display(),
        mountains = summary.mountains,
        cameras = summary.cameras,
        "catalog seeded"
    );
    println!(
        "seeded {} mountains, {} cameras from {}",
        summary.mountains,
        summary.cameras,
        config.catalog_path.display()
    );
    Ok(())
}
