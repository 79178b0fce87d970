use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// `None` when `DATABASE_URL` is unset; offline commands run without it.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub image_root: PathBuf,
    pub scraper_user_agent: String,
    /// Per-fetch HTTP timeout.
    pub scraper_request_timeout_secs: u64,
    /// Deadline for the whole join phase of one tick.
    pub scraper_job_timeout_secs: u64,
    pub solar_horizon_deg: f64,
    /// Six-field cron expression used by `mtcam daemon`.
    pub schedule: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub google_tz_api_key: Option<String>,
}

impl AppConfig {
    /// The database URL, for commands that connect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("image_root", &self.image_root)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_job_timeout_secs", &self.scraper_job_timeout_secs)
            .field("solar_horizon_deg", &self.solar_horizon_deg)
            .field("schedule", &self.schedule)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "google_tz_api_key",
                &self.google_tz_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
