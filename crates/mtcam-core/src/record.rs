//! Outcome records produced by fetch jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Detail text for a job cut off by the batch deadline.
pub const TIMEOUT_DETAIL: &str = "timeout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeResult {
    Success,
    Failure,
    Idle,
}

impl ScrapeResult {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeResult::Success => "success",
            ScrapeResult::Failure => "failure",
            ScrapeResult::Idle => "idle",
        }
    }
}

impl std::fmt::Display for ScrapeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown scrape result '{0}'")]
pub struct ParseScrapeResultError(pub String);

impl std::str::FromStr for ScrapeResult {
    type Err = ParseScrapeResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ScrapeResult::Success),
            "failure" => Ok(ScrapeResult::Failure),
            "idle" => Ok(ScrapeResult::Idle),
            other => Err(ParseScrapeResultError(other.to_string())),
        }
    }
}

/// One camera's outcome for one tick.
///
/// `filename` is set only for [`ScrapeResult::Success`] and is relative
/// (`1718985600.jpg`), never a full path. `detail` is set only for
/// [`ScrapeResult::Failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRecord {
    pub camera_id: i64,
    pub created_at: DateTime<Utc>,
    pub result: ScrapeResult,
    pub detail: String,
    pub filename: String,
}

impl ScrapeRecord {
    #[must_use]
    pub fn idle(camera_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            camera_id,
            created_at,
            result: ScrapeResult::Idle,
            detail: String::new(),
            filename: String::new(),
        }
    }

    #[must_use]
    pub fn success(camera_id: i64, created_at: DateTime<Utc>, filename: impl Into<String>) -> Self {
        Self {
            camera_id,
            created_at,
            result: ScrapeResult::Success,
            detail: String::new(),
            filename: filename.into(),
        }
    }

    /// A failed attempt. An empty `detail` is replaced so the record stays
    /// self-describing.
    #[must_use]
    pub fn failure(camera_id: i64, created_at: DateTime<Utc>, detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if detail.trim().is_empty() {
            detail = "unknown error".to_string();
        }
        Self {
            camera_id,
            created_at,
            result: ScrapeResult::Failure,
            detail,
            filename: String::new(),
        }
    }

    #[must_use]
    pub fn timed_out(camera_id: i64, created_at: DateTime<Utc>) -> Self {
        Self::failure(camera_id, created_at, TIMEOUT_DETAIL)
    }

    /// Whether `detail` and `filename` agree with `result`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.result {
            ScrapeResult::Success => !self.filename.is_empty() && self.detail.is_empty(),
            ScrapeResult::Failure => !self.detail.is_empty() && self.filename.is_empty(),
            ScrapeResult::Idle => self.detail.is_empty() && self.filename.is_empty(),
        }
    }
}

/// Every record produced by one orchestrator tick, committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeBatch {
    pub id: Uuid,
    /// Shared by every record in the batch and used for image filenames.
    pub timestamp: DateTime<Utc>,
    pub records: Vec<ScrapeRecord>,
}

impl ScrapeBatch {
    #[must_use]
    pub fn count(&self, result: ScrapeResult) -> usize {
        self.records.iter().filter(|r| r.result == result).count()
    }
}
