//! The YAML catalog file used to seed mountains and cameras.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{pathname, TzOffsets};
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountainConfig {
    pub name: String,
    pub state: String,
    pub elevation_ft: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Optional initial offsets; `mtcam tz refresh` keeps them current.
    #[serde(default)]
    pub timezone: Option<TzOffsets>,
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}

impl MountainConfig {
    #[must_use]
    pub fn pathname(&self) -> String {
        pathname(&format!("{}_{}", self.name, self.state))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub name: String,
    pub elevation_ft: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub url: String,
    #[serde(default = "default_file_ext")]
    pub file_ext: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default = "default_interval_mins")]
    pub interval_mins: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CameraConfig {
    #[must_use]
    pub fn pathname(&self) -> String {
        pathname(&self.name)
    }
}

fn default_file_ext() -> String {
    "jpg".to_string()
}

fn default_is_active() -> bool {
    true
}

fn default_interval_mins() -> i32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub mountains: Vec<MountainConfig>,
}

impl CatalogFile {
    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.mountains.iter().map(|m| m.cameras.len()).sum()
    }
}

/// Load and validate the catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog_file(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_mountains = HashSet::new();

    for mountain in &catalog.mountains {
        if mountain.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mountain name must be non-empty".to_string(),
            ));
        }
        check_coordinates(&mountain.name, mountain.latitude, mountain.longitude)?;

        let mt_path = mountain.pathname();
        if !seen_mountains.insert(mt_path.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate mountain pathname: '{mt_path}' (from mountain '{}')",
                mountain.name
            )));
        }

        let mut seen_cameras = HashSet::new();
        for camera in &mountain.cameras {
            validate_camera(&mountain.name, camera)?;

            let cam_path = camera.pathname();
            if !seen_cameras.insert(cam_path.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate camera pathname '{cam_path}' on mountain '{}'",
                    mountain.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_camera(mountain: &str, camera: &CameraConfig) -> Result<(), ConfigError> {
    if camera.pathname().is_empty() {
        return Err(ConfigError::Validation(format!(
            "camera on mountain '{mountain}' has an empty name"
        )));
    }
    check_coordinates(&camera.name, camera.latitude, camera.longitude)?;

    if camera.url.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "camera '{}' has no url",
            camera.name
        )));
    }
    if camera.file_ext.trim().is_empty() || camera.file_ext.contains(['/', '\\', '.']) {
        return Err(ConfigError::Validation(format!(
            "camera '{}' has invalid file_ext '{}'",
            camera.name, camera.file_ext
        )));
    }
    if camera.interval_mins <= 0 {
        return Err(ConfigError::Validation(format!(
            "camera '{}' has invalid interval_mins {}; must be positive",
            camera.name, camera.interval_mins
        )));
    }
    if 60 % camera.interval_mins != 0 {
        tracing::warn!(
            camera = %camera.name,
            interval_mins = camera.interval_mins,
            "interval does not divide 60; cadence will drift at the top of the hour"
        );
    }

    Ok(())
}

fn check_coordinates(name: &str, latitude: f64, longitude: f64) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ConfigError::Validation(format!(
            "'{name}' has out-of-range coordinates ({latitude}, {longitude})"
        )));
    }
    Ok(())
}
