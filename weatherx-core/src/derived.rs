//! Small conversions from raw forecast values to the values a display wants.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::model::HOURS;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 16-point compass name for a bearing in degrees, `"N/A"` outside `[0, 360]`.
pub fn wind_direction_text(degrees: f64) -> &'static str {
    if !(0.0..=360.0).contains(&degrees) {
        return "N/A";
    }

    let index = ((degrees + 11.25) / 22.5).floor() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

pub fn uv_bucket_text(uv_index: f64) -> &'static str {
    if uv_index <= 2.0 {
        "Low"
    } else if uv_index <= 5.0 {
        "Moderate"
    } else if uv_index <= 7.0 {
        "High"
    } else if uv_index <= 10.0 {
        "Very High"
    } else {
        "Extreme"
    }
}

/// `HH:MM` of an ISO-8601 timestamp, or `"N/A"` when it cannot be read.
pub fn iso_time_of_day(iso8601: &str) -> String {
    parse_local(iso8601).map_or_else(|| "N/A".to_string(), |time| time.format("%H:%M").to_string())
}

/// Hour of an ISO-8601 timestamp with minutes as a fraction, `0.0` when it cannot be read.
pub fn iso_hour_fraction(iso8601: &str) -> f64 {
    parse_local(iso8601).map_or(0.0, |time| {
        f64::from(time.hour()) + f64::from(time.minute()) / 60.0
    })
}

/// Hourly slot for "now plus `hour_offset` hours". Offsets past the end of
/// the hourly window land on the last slot.
pub fn target_hour_index(current_hour: u32, hour_offset: usize) -> usize {
    (current_hour as usize)
        .saturating_add(hour_offset)
        .min(HOURS - 1)
}

/// Open-Meteo returns local times without an offset when `timezone` is set.
/// Timestamps that do carry an offset are shown in the machine's local time.
fn parse_local(iso8601: &str) -> Option<NaiveDateTime> {
    let iso8601 = iso8601.trim();
    if iso8601.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(iso8601) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(iso8601, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(iso8601, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
