//! Mountain and camera catalog consumed by the scrape orchestrator.
//!
//! The catalog is read-only from the orchestrator's point of view. Where it
//! comes from (Postgres, a fixture in a test) is hidden behind
//! [`CatalogSource`].

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::solar::Observer;

/// Timezone correction for a mountain, in the shape returned by the Google
/// Time Zone API. Local wall-clock time is `UTC + raw + dst`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TzOffsets {
    #[serde(rename = "rawOffset")]
    pub raw_offset_secs: i32,
    #[serde(rename = "dstOffset")]
    pub dst_offset_secs: i32,
}

impl TzOffsets {
    #[must_use]
    pub fn new(raw_offset_secs: i32, dst_offset_secs: i32) -> Self {
        Self {
            raw_offset_secs,
            dst_offset_secs,
        }
    }

    #[must_use]
    pub fn total_secs(self) -> i64 {
        i64::from(self.raw_offset_secs) + i64::from(self.dst_offset_secs)
    }

    /// Parses a stored timezone JSON document.
    ///
    /// Absent, blank, or malformed data (including Google error payloads that
    /// carry no offsets) yields a zero offset rather than an error.
    #[must_use]
    pub fn from_json_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };

        match serde_json::from_str::<Self>(raw) {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!(error = %e, "malformed timezone data; falling back to zero offset");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mountain {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_ft: f64,
    pub tz: TzOffsets,
}

impl Mountain {
    /// Directory name for this mountain's images, e.g. `three_sisters_or`.
    #[must_use]
    pub fn pathname(&self) -> String {
        pathname(&format!("{}_{}", self.name, self.state))
    }

    /// Observer used for this mountain's daylight window.
    #[must_use]
    pub fn observer(&self) -> Observer {
        Observer::from_feet(self.latitude, self.longitude, self.elevation_ft)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub id: i64,
    pub mountain_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_ft: f64,
    pub url: String,
    pub file_ext: String,
    pub is_active: bool,
    /// Capture cadence in minutes. Assumed to divide 60.
    pub interval_mins: i32,
}

impl Camera {
    /// Directory name for this camera's images, e.g. `fuji_subaru_5th`.
    #[must_use]
    pub fn pathname(&self) -> String {
        pathname(&self.name)
    }
}

/// Derive a filesystem-safe directory name.
///
/// Lowercases, turns whitespace into `_`, and drops anything that is not an
/// ASCII alphanumeric, `-`, or `_` (path separators included).
#[must_use]
pub fn pathname(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}

/// A snapshot of every mountain and camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub mountains: Vec<Mountain>,
    pub cameras: Vec<Camera>,
}

impl Catalog {
    #[must_use]
    pub fn mountains_by_id(&self) -> HashMap<i64, &Mountain> {
        self.mountains.iter().map(|m| (m.id, m)).collect()
    }

    #[must_use]
    pub fn cameras_on(&self, mountain_id: i64) -> Vec<&Camera> {
        self.cameras
            .iter()
            .filter(|c| c.mountain_id == mountain_id)
            .collect()
    }
}

/// Something that can produce the full catalog at the start of a tick.
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every mountain and camera.
    fn load_catalog(&self) -> impl Future<Output = Result<Catalog, Self::Error>> + Send;
}

impl CatalogSource for Catalog {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> impl Future<Output = Result<Catalog, Self::Error>> + Send {
        let catalog = self.clone();
        async move { Ok(catalog) }
    }
}
