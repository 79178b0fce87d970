pub mod app_config;
pub mod catalog;
pub mod catalog_file;
pub mod config;
pub mod eligibility;
pub mod record;
pub mod solar;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{pathname, Camera, Catalog, CatalogSource, Mountain, TzOffsets};
pub use catalog_file::{load_catalog_file, CameraConfig, CatalogFile, MountainConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use eligibility::{daylight_window, gate, Gate};
pub use record::{ParseScrapeResultError, ScrapeBatch, ScrapeRecord, ScrapeResult, TIMEOUT_DETAIL};
pub use solar::{Observer, SolarWindow, NAUTICAL_TWILIGHT_DEG};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
