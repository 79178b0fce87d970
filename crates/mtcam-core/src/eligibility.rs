//! Per-camera gate deciding whether a capture is attempted this tick.

use chrono::{DateTime, Utc};

use crate::catalog::{Camera, Mountain};
use crate::solar::SolarWindow;

/// Outcome of the cheap, pre-launch part of the eligibility check.
///
/// The solar-window part runs inside the fetch job so that a scheduled
/// camera outside daylight still produces an `idle` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Inactive,
    OffCadence,
    Scheduled,
}

impl Gate {
    #[must_use]
    pub fn is_scheduled(self) -> bool {
        matches!(self, Gate::Scheduled)
    }
}

/// Active flag plus interval cadence.
///
/// A non-positive interval never matches.
#[must_use]
pub fn gate(camera: &Camera, minute_of_hour: u32) -> Gate {
    if !camera.is_active {
        return Gate::Inactive;
    }

    match u32::try_from(camera.interval_mins) {
        Ok(interval) if interval > 0 && minute_of_hour % interval == 0 => Gate::Scheduled,
        _ => Gate::OffCadence,
    }
}

/// The daylight window for a camera on `mountain`.
///
/// Every camera on a mountain shares the mountain's window: its coordinates,
/// elevation and timezone correction.
#[must_use]
pub fn daylight_window(mountain: &Mountain, horizon_deg: f64, now: DateTime<Utc>) -> SolarWindow {
    SolarWindow::for_day(&mountain.observer(), horizon_deg, mountain.tz, now)
}
