//! Daylight capture window.
//!
//! Sunrise and sunset come from the sunrise equation with NOAA's simplified
//! solar-position terms, which is good to roughly a minute at mid latitudes.
//! Decisions are made at whole-hour granularity so that precision is plenty.
//!
//! Polar day and polar night are not special-cased: the hour-angle cosine is
//! clamped, so continuous day becomes a 24 hour window centred on solar noon
//! and continuous night collapses to the instant of solar noon.

use chrono::{DateTime, DurationRound, NaiveTime, TimeDelta, Utc};

use crate::catalog::TzOffsets;

/// Nautical twilight: sun 12° below the horizon.
pub const NAUTICAL_TWILIGHT_DEG: f64 = -12.0;

const FEET_TO_METERS: f64 = 0.3048;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const EARTH_OBLIQUITY_DEG: f64 = 23.4397;

/// Where the sun is observed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude: f64,
    /// Degrees, east positive.
    pub longitude: f64,
    /// Carried with the observer but never moves the horizon crossing.
    pub elevation_m: f64,
}

impl Observer {
    #[must_use]
    pub fn from_feet(latitude: f64, longitude: f64, elevation_ft: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation_m: elevation_ft * FEET_TO_METERS,
        }
    }
}

/// Sunrise and sunset bracketing the local solar day that contains `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarWindow {
    /// Local noon of the current local day, expressed in UTC.
    pub anchor: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl SolarWindow {
    /// Compute the window for the local day containing `now`.
    ///
    /// `horizon_deg` is the solar altitude treated as rise/set. It is used
    /// as given; no dip correction is applied for the observer's elevation.
    #[must_use]
    pub fn for_day(
        observer: &Observer,
        horizon_deg: f64,
        tz: TzOffsets,
        now: DateTime<Utc>,
    ) -> Self {
        let anchor = local_noon_anchor(now, tz);
        let anchor_jd = julian_day(anchor);
        let cycle = solar_cycle(anchor_jd, observer.longitude);

        let today = day_events(cycle, observer, horizon_deg);

        let sunrise = if today.rise <= anchor_jd {
            today.rise
        } else {
            day_events(cycle - 1.0, observer, horizon_deg).rise
        };
        let sunset = if today.set >= anchor_jd {
            today.set
        } else {
            day_events(cycle + 1.0, observer, horizon_deg).set
        };

        Self {
            anchor,
            sunrise: from_julian_day(sunrise),
            sunset: from_julian_day(sunset),
        }
    }

    /// `floor(sunrise) <= floor(now) <= floor(sunset)`, all floored to the hour.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let now = floor_to_hour(now);
        floor_to_hour(self.sunrise) <= now && now <= floor_to_hour(self.sunset)
    }
}

/// Local noon of the local calendar day containing `now`, converted back to UTC.
#[must_use]
pub fn local_noon_anchor(now: DateTime<Utc>, tz: TzOffsets) -> DateTime<Utc> {
    let offset = TimeDelta::seconds(tz.total_secs());
    let local = now.naive_utc() + offset;
    let local_noon = local.date().and_time(NaiveTime::MIN) + TimeDelta::hours(12);
    (local_noon - offset).and_utc()
}

#[must_use]
pub fn floor_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

struct DayEvents {
    rise: f64,
    set: f64,
}

#[allow(clippy::cast_precision_loss)]
fn julian_day(t: DateTime<Utc>) -> f64 {
    t.timestamp() as f64 / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

#[allow(clippy::cast_possible_truncation)]
fn from_julian_day(jd: f64) -> DateTime<Utc> {
    let secs = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY).round() as i64;
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Whole days since J2000 whose mean solar noon at `longitude` is nearest `jd`.
fn solar_cycle(jd: f64, longitude: f64) -> f64 {
    (jd - J2000_JD - 0.0009 + longitude / 360.0).round()
}

fn day_events(cycle: f64, observer: &Observer, horizon_deg: f64) -> DayEvents {
    let mean_noon = cycle + 0.0009 - observer.longitude / 360.0;

    let anomaly = (357.5291 + 0.985_600_28 * mean_noon).rem_euclid(360.0);
    let m = anomaly.to_radians();
    let center = 1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude = (anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);
    let lambda = ecliptic_longitude.to_radians();

    let transit = J2000_JD + mean_noon + 0.0053 * m.sin() - 0.0069 * (2.0 * lambda).sin();

    let sin_decl = lambda.sin() * EARTH_OBLIQUITY_DEG.to_radians().sin();
    let cos_decl = (1.0 - sin_decl * sin_decl).sqrt();

    let altitude = horizon_deg.to_radians();
    let lat = observer.latitude.to_radians();

    let cos_hour_angle =
        ((altitude.sin() - lat.sin() * sin_decl) / (lat.cos() * cos_decl)).clamp(-1.0, 1.0);
    let half_day = cos_hour_angle.acos().to_degrees() / 360.0;

    DayEvents {
        rise: transit - half_day,
        set: transit + half_day,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn equator() -> Observer {
        Observer::from_feet(0.0, 0.0, 0.0)
    }

    fn hood() -> Observer {
        Observer::from_feet(45.373_439, -121.695_962, 11_200.0)
    }

    const PDT: TzOffsets = TzOffsets {
        raw_offset_secs: -28_800,
        dst_offset_secs: 3_600,
    };

    #[test]
    fn anchor_is_local_noon_in_utc() {
        assert_eq!(
            local_noon_anchor(utc(2024, 6, 21, 2, 0), TzOffsets::default()),
            utc(2024, 6, 21, 12, 0)
        );
        // 06:30 UTC is 23:30 on the previous local day in Oregon.
        assert_eq!(
            local_noon_anchor(utc(2024, 6, 21, 6, 30), PDT),
            utc(2024, 6, 20, 19, 0)
        );
        assert_eq!(
            local_noon_anchor(utc(2024, 6, 21, 8, 0), PDT),
            utc(2024, 6, 21, 19, 0)
        );
    }

    #[test]
    fn equator_window_straddles_noon() {
        let window = SolarWindow::for_day(
            &equator(),
            NAUTICAL_TWILIGHT_DEG,
            TzOffsets::default(),
            utc(2024, 3, 20, 12, 0),
        );

        assert_eq!(window.anchor, utc(2024, 3, 20, 12, 0));
        assert!(window.sunrise < window.anchor && window.anchor < window.sunset);
        assert!(
            window.sunrise > utc(2024, 3, 20, 5, 0) && window.sunrise < utc(2024, 3, 20, 5, 40),
            "sunrise {}",
            window.sunrise
        );
        assert!(
            window.sunset > utc(2024, 3, 20, 18, 40) && window.sunset < utc(2024, 3, 20, 19, 15),
            "sunset {}",
            window.sunset
        );
    }

    #[test]
    fn same_window_for_any_time_in_the_local_day() {
        let early = SolarWindow::for_day(
            &equator(),
            NAUTICAL_TWILIGHT_DEG,
            TzOffsets::default(),
            utc(2024, 3, 20, 0, 30),
        );
        let late = SolarWindow::for_day(
            &equator(),
            NAUTICAL_TWILIGHT_DEG,
            TzOffsets::default(),
            utc(2024, 3, 20, 23, 30),
        );
        assert_eq!(early, late);
    }

    #[test]
    fn contains_compares_whole_hours() {
        let window = SolarWindow::for_day(
            &equator(),
            NAUTICAL_TWILIGHT_DEG,
            TzOffsets::default(),
            utc(2024, 3, 20, 12, 0),
        );

        assert!(window.contains(utc(2024, 3, 20, 12, 0)));
        // Before sunrise by minutes but in the same hour.
        assert!(window.contains(utc(2024, 3, 20, 5, 1)));
        assert!(!window.contains(utc(2024, 3, 20, 4, 59)));
        assert!(window.contains(utc(2024, 3, 20, 18, 59)));
        assert!(!window.contains(utc(2024, 3, 20, 19, 30)));
        assert!(!window.contains(utc(2024, 3, 20, 2, 0)));
    }

    #[test]
    fn late_evening_uses_previous_local_day() {
        let at = |h, m| {
            let now = utc(2024, 6, 21, h, m);
            SolarWindow::for_day(&hood(), NAUTICAL_TWILIGHT_DEG, PDT, now).contains(now)
        };

        // 22:30 local on June 20, still nautical twilight on the summit.
        assert!(at(5, 30));
        // 23:30 local, dark.
        assert!(!at(6, 30));
        // 02:00 local on June 21, dark.
        assert!(!at(9, 0));
        // Late morning local.
        assert!(at(18, 0));
    }

    #[test]
    fn zero_offset_fallback_still_produces_a_window() {
        let now = utc(2024, 6, 21, 20, 0);
        let window = SolarWindow::for_day(&hood(), NAUTICAL_TWILIGHT_DEG, TzOffsets::default(), now);
        assert_eq!(window.anchor, utc(2024, 6, 21, 12, 0));
        assert!(window.sunrise < window.sunset);
        assert!(window.sunrise <= window.anchor && window.anchor <= window.sunset);
    }

    #[test]
    fn elevation_does_not_move_the_crossing() {
        let summit = Observer::from_feet(45.373_439, -121.695_962, 11_200.0);
        let sea = Observer::from_feet(45.373_439, -121.695_962, 0.0);

        for day in [4, 21] {
            for month in [1, 6] {
                let now = utc(2024, month, day, 20, 0);
                let high = SolarWindow::for_day(&summit, NAUTICAL_TWILIGHT_DEG, PDT, now);
                let low = SolarWindow::for_day(&sea, NAUTICAL_TWILIGHT_DEG, PDT, now);
                assert_eq!(high, low, "{month}/{day}");
            }
        }

        // Early January evening: summit sunset must not slip past 02:00 UTC.
        let now = utc(2024, 1, 4, 2, 30);
        let window = SolarWindow::for_day(&summit, NAUTICAL_TWILIGHT_DEG, PDT, now);
        assert!(window.sunset < utc(2024, 1, 4, 2, 0), "sunset {}", window.sunset);
        assert!(!window.contains(now));
    }

    #[test]
    fn polar_day_is_a_full_day_window() {
        let now = utc(2024, 6, 21, 12, 0);
        let svalbard = Observer::from_feet(78.2, 15.6, 0.0);
        let window = SolarWindow::for_day(
            &svalbard,
            NAUTICAL_TWILIGHT_DEG,
            TzOffsets::new(3_600, 3_600),
            now,
        );
        let span = window.sunset - window.sunrise;
        assert!((span - TimeDelta::hours(24)).num_seconds().abs() <= 1);
        assert!(window.contains(now));
    }
}
