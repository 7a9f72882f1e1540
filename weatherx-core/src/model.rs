use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    condition::{UNKNOWN_CONDITION, describe},
    derived::iso_time_of_day,
    extract::{ExtractionRequest, fill_times, find_section},
};

/// Days in the daily forecast.
pub const DAYS: usize = 7;

/// Hours in the hourly forecast.
pub const HOURS: usize = 48;

/// Upcoming hours listed by [`WeatherSnapshot::next_hours_summary`].
pub const SUMMARY_HOURS: usize = 6;

const CURRENT_MARKER: &str = "\"current\"";
const DAILY_MARKER: &str = "\"daily\"";
const HOURLY_MARKER: &str = "\"hourly\"";

/// Conditions reported in the `current` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub apparent_temperature: f64,
    pub dew_point: f64,
    pub cloud_cover: f64,
    /// Degrees, meteorological convention.
    pub wind_direction: f64,
    pub wind_gusts: f64,
    pub uv_index: f64,
    pub solar_radiation: f64,
    pub direct_radiation: f64,
    pub diffuse_radiation: f64,
    pub weather_code: i32,
    pub condition: String,
}

impl Default for CurrentConditions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            wind_speed: 0.0,
            pressure: 0.0,
            apparent_temperature: 0.0,
            dew_point: 0.0,
            cloud_cover: 0.0,
            wind_direction: 0.0,
            wind_gusts: 0.0,
            uv_index: 0.0,
            solar_radiation: 0.0,
            direct_radiation: 0.0,
            diffuse_radiation: 0.0,
            weather_code: 0,
            condition: UNKNOWN_CONDITION.to_string(),
        }
    }
}

impl CurrentConditions {
    fn parse(json: &str) -> Self {
        let scalar = |field| ExtractionRequest::new(CURRENT_MARKER, field).scalar(json);
        let weather_code = scalar("\"weather_code\"") as i32;

        Self {
            temperature: scalar("\"temperature_2m\""),
            humidity: scalar("\"relative_humidity_2m\""),
            wind_speed: scalar("\"wind_speed_10m\""),
            pressure: scalar("\"surface_pressure\""),
            apparent_temperature: scalar("\"apparent_temperature\""),
            dew_point: scalar("\"dew_point_2m\""),
            cloud_cover: scalar("\"cloud_cover\""),
            wind_direction: scalar("\"wind_direction_10m\""),
            wind_gusts: scalar("\"wind_gusts_10m\""),
            uv_index: scalar("\"uv_index\""),
            solar_radiation: scalar("\"shortwave_radiation\""),
            direct_radiation: scalar("\"direct_radiation\""),
            diffuse_radiation: scalar("\"diffuse_radiation\""),
            weather_code,
            condition: describe(weather_code).to_string(),
        }
    }
}

/// Seven-day forecast, one column per variable, index 0 is today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub temperature_max: [f64; DAYS],
    pub temperature_min: [f64; DAYS],
    pub apparent_temperature_max: [f64; DAYS],
    pub apparent_temperature_min: [f64; DAYS],
    pub wind_speed_max: [f64; DAYS],
    pub uv_index_max: [f64; DAYS],
    pub sunrise: [String; DAYS],
    pub sunset: [String; DAYS],
    pub weather_code: [i32; DAYS],
    pub condition: [String; DAYS],
}

impl Default for DailyForecast {
    fn default() -> Self {
        Self {
            temperature_max: [0.0; DAYS],
            temperature_min: [0.0; DAYS],
            apparent_temperature_max: [0.0; DAYS],
            apparent_temperature_min: [0.0; DAYS],
            wind_speed_max: [0.0; DAYS],
            uv_index_max: [0.0; DAYS],
            sunrise: Default::default(),
            sunset: Default::default(),
            weather_code: [0; DAYS],
            condition: std::array::from_fn(|_| UNKNOWN_CONDITION.to_string()),
        }
    }
}

impl DailyForecast {
    fn parse(json: &str) -> Self {
        let mut daily = Self::default();
        let section = find_section(json, DAILY_MARKER);
        if section.is_empty() {
            return daily;
        }

        let numbers = |field: &str, out: &mut [f64]| {
            ExtractionRequest::new(DAILY_MARKER, field).numbers_into(section, out)
        };
        numbers("\"temperature_2m_max\"", &mut daily.temperature_max);
        numbers("\"temperature_2m_min\"", &mut daily.temperature_min);
        numbers("\"apparent_temperature_max\"", &mut daily.apparent_temperature_max);
        numbers("\"apparent_temperature_min\"", &mut daily.apparent_temperature_min);
        numbers("\"wind_speed_10m_max\"", &mut daily.wind_speed_max);
        numbers("\"uv_index_max\"", &mut daily.uv_index_max);

        ExtractionRequest::new(DAILY_MARKER, "\"sunrise\"")
            .strings_into(section, &mut daily.sunrise);
        ExtractionRequest::new(DAILY_MARKER, "\"sunset\"")
            .strings_into(section, &mut daily.sunset);

        let mut codes = [0.0; DAYS];
        let filled = numbers("\"weather_code\"", &mut codes);
        apply_codes(&codes[..filled], &mut daily.weather_code, &mut daily.condition);

        daily
    }
}

/// First 48 hours of the forecast, starting at local midnight of the current
/// day, so slot `h` is hour `h` of today. Longer series are cut; every column
/// holds exactly [`HOURS`] entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    pub time: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub apparent_temperature: Vec<f64>,
    pub cloud_cover: Vec<f64>,
    pub visibility: Vec<f64>,
    pub solar_radiation: Vec<f64>,
    pub direct_radiation: Vec<f64>,
    pub diffuse_radiation: Vec<f64>,
    pub weather_code: Vec<i32>,
    pub condition: Vec<String>,
}

impl Default for HourlyForecast {
    fn default() -> Self {
        Self {
            time: vec![String::new(); HOURS],
            temperature: vec![0.0; HOURS],
            humidity: vec![0.0; HOURS],
            wind_speed: vec![0.0; HOURS],
            apparent_temperature: vec![0.0; HOURS],
            cloud_cover: vec![0.0; HOURS],
            visibility: vec![0.0; HOURS],
            solar_radiation: vec![0.0; HOURS],
            direct_radiation: vec![0.0; HOURS],
            diffuse_radiation: vec![0.0; HOURS],
            weather_code: vec![0; HOURS],
            condition: vec![UNKNOWN_CONDITION.to_string(); HOURS],
        }
    }
}

impl HourlyForecast {
    fn parse(json: &str) -> Self {
        let mut hourly = Self::default();
        let section = find_section(json, HOURLY_MARKER);
        if section.is_empty() {
            return hourly;
        }

        fill_times(section, &mut hourly.time);

        let numbers = |field: &str, out: &mut [f64]| {
            ExtractionRequest::new(HOURLY_MARKER, field)
                .limit(HOURS)
                .numbers_into(section, out)
        };
        numbers("\"temperature_2m\"", &mut hourly.temperature);
        numbers("\"relative_humidity_2m\"", &mut hourly.humidity);
        numbers("\"wind_speed_10m\"", &mut hourly.wind_speed);
        numbers("\"apparent_temperature\"", &mut hourly.apparent_temperature);
        numbers("\"cloud_cover\"", &mut hourly.cloud_cover);
        numbers("\"visibility\"", &mut hourly.visibility);
        numbers("\"shortwave_radiation\"", &mut hourly.solar_radiation);
        numbers("\"direct_radiation\"", &mut hourly.direct_radiation);
        numbers("\"diffuse_radiation\"", &mut hourly.diffuse_radiation);

        let mut codes = [0.0; HOURS];
        let filled = numbers("\"weather_code\"", &mut codes);
        apply_codes(&codes[..filled], &mut hourly.weather_code, &mut hourly.condition);

        hourly
    }
}

/// Writes codes and their descriptions for the slots the source supplied.
/// The remaining slots keep the "Unknown" condition.
fn apply_codes(codes: &[f64], code_out: &mut [i32], condition_out: &mut [String]) {
    for ((code, code_slot), condition_slot) in codes.iter().zip(code_out).zip(condition_out) {
        *code_slot = *code as i32;
        *condition_slot = describe(*code_slot).to_string();
    }
}

/// Everything read from one forecast document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    /// Local time the document was downloaded, set by the poller.
    pub fetched_at: Option<NaiveDateTime>,
    pub current: CurrentConditions,
    pub daily: DailyForecast,
    pub hourly: HourlyForecast,
}

impl WeatherSnapshot {
    /// Builds a snapshot from a raw Open-Meteo response. Never fails: fields
    /// that cannot be found keep their defaults.
    pub fn parse(json: &str) -> Self {
        let current = CurrentConditions::parse(json);
        let daily = DailyForecast::parse(json);
        let hourly = HourlyForecast::parse(json);

        Self {
            fetched_at: None,
            current,
            daily,
            hourly,
        }
    }

    /// Short text for the hours following `current_hour`, e.g.
    /// `"15:00: 21° | 16:00: 20° (Overcast)"`.
    pub fn next_hours_summary(&self, current_hour: u32) -> String {
        let current_hour = current_hour as usize;
        let count = SUMMARY_HOURS.min((HOURS - 1).saturating_sub(current_hour));

        (current_hour + 1..=current_hour + count)
            .map(|index| {
                let mut entry = format!(
                    "{}: {:.0}°",
                    iso_time_of_day(&self.hourly.time[index]),
                    self.hourly.temperature[index]
                );
                let condition = &self.hourly.condition[index];
                if condition != "Clear Sky" {
                    entry.push_str(&format!(" ({condition})"));
                }
                entry
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
