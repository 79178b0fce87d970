use crate::app_config::{AppConfig, Environment};
use crate::solar::NAUTICAL_TWILIGHT_DEG;
use crate::ConfigError;

/// Browser-like identification; several camera hosts reject empty or
/// library-default user agents.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid. A missing `DATABASE_URL` is
/// reported later, by [`AppConfig::require_database_url`].
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    // Only commands that connect need it; see `AppConfig::require_database_url`.
    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty());
    let env = parse_environment(&or_default("MTCAM_ENV", "development"))?;
    let log_level = or_default("MTCAM_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("MTCAM_CATALOG_PATH", "./config/catalog.yaml"));
    let image_root = PathBuf::from(or_default("MTCAM_IMAGE_ROOT", "./img"));

    let scraper_user_agent = or_default("MTCAM_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_request_timeout_secs =
        parse_positive_u64("MTCAM_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_job_timeout_secs = parse_positive_u64("MTCAM_SCRAPER_JOB_TIMEOUT_SECS", "30")?;

    let horizon_default = NAUTICAL_TWILIGHT_DEG.to_string();
    let solar_horizon_deg = parse_horizon(&or_default("MTCAM_SOLAR_HORIZON_DEG", &horizon_default))
        .map_err(|reason| invalid("MTCAM_SOLAR_HORIZON_DEG", reason))?;

    let schedule = or_default("MTCAM_SCHEDULE", "0 * * * * *");

    let db_max_connections = parse_u32("MTCAM_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MTCAM_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MTCAM_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let google_tz_api_key = lookup("GOOGLE_TZ_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        catalog_path,
        image_root,
        scraper_user_agent,
        scraper_request_timeout_secs,
        scraper_job_timeout_secs,
        solar_horizon_deg,
        schedule,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        google_tz_api_key,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MTCAM_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Horizon angles are degrees of solar altitude and must lie in `[-90, 90]`.
fn parse_horizon(raw: &str) -> Result<f64, String> {
    let value = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
    if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
        return Err(format!("{value} is outside [-90, 90]"));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
