//! Client for the Google Time Zone API, used to refresh per-mountain
//! UTC and DST offsets.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mtcam_core::TzOffsets;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ScraperError;

pub const GOOGLE_TZ_BASE_URL: &str = "https://maps.googleapis.com";

const TIMEZONE_PATH: &str = "/maps/api/timezone/json";

/// Response body of `GET /maps/api/timezone/json`.
///
/// Serializes back to the same camelCase shape, which is what gets stored
/// in `mountains.tz_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleTimezone {
    #[serde(default)]
    pub dst_offset: i32,
    #[serde(default)]
    pub raw_offset: i32,
    #[serde(default)]
    pub time_zone_id: String,
    #[serde(default)]
    pub time_zone_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GoogleTimezone {
    #[must_use]
    pub fn offsets(&self) -> TzOffsets {
        TzOffsets::new(self.raw_offset, self.dst_offset)
    }
}

#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error(transparent)]
    Request(#[from] ScraperError),

    #[error("time zone API returned {status}: {message}")]
    Api { status: String, message: String },
}

/// Thin wrapper over the Time Zone API. The API key is never logged and is
/// stripped from request errors.
pub struct TimezoneClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for TimezoneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimezoneClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl TimezoneClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: GOOGLE_TZ_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Point the client at a different host (tests use a local mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Look up the offsets in effect at `(latitude, longitude)` at `at`.
    ///
    /// # Errors
    ///
    /// - [`TimezoneError::Request`] for transport failures, non-2xx
    ///   responses, or an unparseable body.
    /// - [`TimezoneError::Api`] when the body's `status` is anything but `OK`.
    pub async fn lookup(
        &self,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<GoogleTimezone, TimezoneError> {
        let url = format!("{}{TIMEZONE_PATH}", self.base_url);
        let location = format!("{latitude},{longitude}");
        let timestamp = at.timestamp().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("timestamp", timestamp.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScraperError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::Http(e.without_url()))?;
        let tz: GoogleTimezone =
            serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
                context: "time zone response".to_string(),
                source,
            })?;

        if tz.status != "OK" {
            return Err(TimezoneError::Api {
                message: tz
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no error message".to_string()),
                status: tz.status,
            });
        }

        Ok(tz)
    }
}
