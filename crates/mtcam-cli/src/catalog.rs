//! `mtcam catalog check`.

use mtcam_core::{AppConfig, CatalogFile};

pub(crate) fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = mtcam_core::load_catalog_file(&config.catalog_path)?;
    print!("{}", summarize(&catalog));
    println!("{}: ok", config.catalog_path.display());
    Ok(())
}

/// One line per mountain, then an indented line per camera.
fn summarize(catalog: &CatalogFile) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for mountain in &catalog.mountains {
        let _ = writeln!(
            out,
            "{} ({}) [{}]: {} camera(s)",
            mountain.name,
            mountain.state,
            mountain.pathname(),
            mountain.cameras.len()
        );
        for camera in &mountain.cameras {
            let status = if camera.is_active { "active" } else { "inactive" };
            let _ = writeln!(
                out,
                "  {} [{}] every {} min, {}",
                camera.name,
                camera.pathname(),
                camera.interval_mins,
                status
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn offline_config(catalog_path: PathBuf) -> AppConfig {
        AppConfig {
            database_url: None,
            env: mtcam_core::Environment::Test,
            log_level: "info".to_string(),
            catalog_path,
            image_root: PathBuf::from("./img"),
            scraper_user_agent: "mtcam-test/0.1".to_string(),
            scraper_request_timeout_secs: 10,
            scraper_job_timeout_secs: 30,
            solar_horizon_deg: -12.0,
            schedule: "0 * * * * *".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
            db_acquire_timeout_secs: 1,
            google_tz_api_key: None,
        }
    }

    #[test]
    fn check_runs_without_a_database_url() {
        let shipped = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.yaml");
        let config = offline_config(shipped);
        assert!(config.require_database_url().is_err());
        run_check(&config).expect("shipped catalog should validate offline");
    }

    #[test]
    fn check_reports_a_missing_catalog_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = offline_config(tmp.path().join("absent.yaml"));
        assert!(run_check(&config).is_err());
    }

    #[test]
    fn summarize_lists_mountains_and_cameras() {
        let catalog = hood_catalog();
        let text = summarize(&catalog);
        assert!(text.contains("Hood (OR) [hood_or]: 1 camera(s)"));
        assert!(text.contains("  Palmer [palmer] every 10 min, inactive"));
    }

    fn hood_catalog() -> CatalogFile {
        CatalogFile {
            mountains: vec![mtcam_core::MountainConfig {
                name: "Hood".to_string(),
                state: "OR".to_string(),
                elevation_ft: 11_249.0,
                latitude: 45.3735,
                longitude: -121.6959,
                timezone: None,
                cameras: vec![mtcam_core::CameraConfig {
                    name: "Palmer".to_string(),
                    elevation_ft: 8_540.0,
                    latitude: 45.3465,
                    longitude: -121.7098,
                    url: "https://example.com/palmer.jpg".to_string(),
                    file_ext: "jpg".to_string(),
                    is_active: false,
                    interval_mins: 10,
                    comment: None,
                }],
            }],
        }
    }
}
