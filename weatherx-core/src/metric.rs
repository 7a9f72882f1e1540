//! Metric keys and how each one is answered from a [`WeatherSnapshot`].

use std::fmt;

use crate::{
    derived::{
        iso_hour_fraction, iso_time_of_day, target_hour_index, uv_bucket_text, wind_direction_text,
    },
    model::WeatherSnapshot,
};

/// Ambient parameters of a query. `forecast_day` and `hour_offset` are
/// clamped when the configuration is loaded, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Query {
    pub forecast_day: usize,
    pub hour_offset: usize,
    /// Local wall-clock hour, `0..=23`.
    pub current_hour: u32,
}

impl Query {
    pub fn hour_index(&self) -> usize {
        target_hour_index(self.current_hour, self.hour_offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    CurrentTemp,
    CurrentHumidity,
    CurrentWindSpeed,
    CurrentPressure,
    CurrentApparentTemp,
    CurrentDewPoint,
    CurrentCloudCover,
    CurrentWindDirection,
    CurrentWindGusts,
    CurrentUvIndex,
    CurrentSolarRadiation,
    CurrentDirectRadiation,
    CurrentDiffuseRadiation,
    CurrentCondition,
    CurrentWindDirectionText,
    ForecastTemp,
    ForecastTempMax,
    ForecastTempMin,
    ForecastApparentTempMax,
    ForecastApparentTempMin,
    ForecastWindSpeed,
    ForecastUvIndex,
    ForecastSunrise,
    ForecastSunriseText,
    ForecastSunset,
    ForecastSunsetText,
    ForecastCondition,
    HourlyTemp,
    HourlyHumidity,
    HourlyWindSpeed,
    HourlyApparentTemp,
    HourlyCloudCover,
    HourlyVisibility,
    HourlySolarRadiation,
    HourlyDirectRadiation,
    HourlyDiffuseRadiation,
    HourlyCondition,
    HourlyTime,
    UvIndexText,
    NextHoursSummary,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::CurrentTemp => "currenttemp",
            Metric::CurrentHumidity => "currenthumidity",
            Metric::CurrentWindSpeed => "currentwindspeed",
            Metric::CurrentPressure => "currentpressure",
            Metric::CurrentApparentTemp => "currentapparenttemp",
            Metric::CurrentDewPoint => "currentdewpoint",
            Metric::CurrentCloudCover => "currentcloudcover",
            Metric::CurrentWindDirection => "currentwinddirection",
            Metric::CurrentWindGusts => "currentwindgusts",
            Metric::CurrentUvIndex => "currentuvindex",
            Metric::CurrentSolarRadiation => "currentsolarradiation",
            Metric::CurrentDirectRadiation => "currentdirectradiation",
            Metric::CurrentDiffuseRadiation => "currentdiffuseradiation",
            Metric::CurrentCondition => "currentcondition",
            Metric::CurrentWindDirectionText => "currentwinddirectiontext",
            Metric::ForecastTemp => "forecasttemp",
            Metric::ForecastTempMax => "forecasttempmax",
            Metric::ForecastTempMin => "forecasttempmin",
            Metric::ForecastApparentTempMax => "forecastapparenttempmax",
            Metric::ForecastApparentTempMin => "forecastapparenttempmin",
            Metric::ForecastWindSpeed => "forecastwindspeed",
            Metric::ForecastUvIndex => "forecastuvindex",
            Metric::ForecastSunrise => "forecastsunrise",
            Metric::ForecastSunriseText => "forecastsunrisetext",
            Metric::ForecastSunset => "forecastsunset",
            Metric::ForecastSunsetText => "forecastsunsettext",
            Metric::ForecastCondition => "forecastcondition",
            Metric::HourlyTemp => "hourlytemp",
            Metric::HourlyHumidity => "hourlyhumidity",
            Metric::HourlyWindSpeed => "hourlywindspeed",
            Metric::HourlyApparentTemp => "hourlyapparenttemp",
            Metric::HourlyCloudCover => "hourlycloudcover",
            Metric::HourlyVisibility => "hourlyvisibility",
            Metric::HourlySolarRadiation => "hourlysolarradiation",
            Metric::HourlyDirectRadiation => "hourlydirectradiation",
            Metric::HourlyDiffuseRadiation => "hourlydiffuseradiation",
            Metric::HourlyCondition => "hourlycondition",
            Metric::HourlyTime => "hourlytime",
            Metric::UvIndexText => "uvindextext",
            Metric::NextHoursSummary => "nexthourssummary",
        }
    }

    pub const fn all() -> &'static [Metric] {
        &[
            Metric::CurrentTemp,
            Metric::CurrentHumidity,
            Metric::CurrentWindSpeed,
            Metric::CurrentPressure,
            Metric::CurrentApparentTemp,
            Metric::CurrentDewPoint,
            Metric::CurrentCloudCover,
            Metric::CurrentWindDirection,
            Metric::CurrentWindGusts,
            Metric::CurrentUvIndex,
            Metric::CurrentSolarRadiation,
            Metric::CurrentDirectRadiation,
            Metric::CurrentDiffuseRadiation,
            Metric::CurrentCondition,
            Metric::CurrentWindDirectionText,
            Metric::ForecastTemp,
            Metric::ForecastTempMax,
            Metric::ForecastTempMin,
            Metric::ForecastApparentTempMax,
            Metric::ForecastApparentTempMin,
            Metric::ForecastWindSpeed,
            Metric::ForecastUvIndex,
            Metric::ForecastSunrise,
            Metric::ForecastSunriseText,
            Metric::ForecastSunset,
            Metric::ForecastSunsetText,
            Metric::ForecastCondition,
            Metric::HourlyTemp,
            Metric::HourlyHumidity,
            Metric::HourlyWindSpeed,
            Metric::HourlyApparentTemp,
            Metric::HourlyCloudCover,
            Metric::HourlyVisibility,
            Metric::HourlySolarRadiation,
            Metric::HourlyDirectRadiation,
            Metric::HourlyDiffuseRadiation,
            Metric::HourlyCondition,
            Metric::HourlyTime,
            Metric::UvIndexText,
            Metric::NextHoursSummary,
        ]
    }

    /// Numeric reading, `None` for metrics that only exist as text.
    pub fn numeric(&self, snapshot: &WeatherSnapshot, query: &Query) -> Option<f64> {
        let current = &snapshot.current;
        let daily = &snapshot.daily;
        let hourly = &snapshot.hourly;
        let day = query.forecast_day;
        let hour = query.hour_index();

        let value = match self {
            Metric::CurrentTemp => current.temperature,
            Metric::CurrentHumidity => current.humidity,
            Metric::CurrentWindSpeed => current.wind_speed,
            Metric::CurrentPressure => current.pressure,
            Metric::CurrentApparentTemp => current.apparent_temperature,
            Metric::CurrentDewPoint => current.dew_point,
            Metric::CurrentCloudCover => current.cloud_cover,
            Metric::CurrentWindDirection => current.wind_direction,
            Metric::CurrentWindGusts => current.wind_gusts,
            Metric::CurrentUvIndex => current.uv_index,
            Metric::CurrentSolarRadiation => current.solar_radiation,
            Metric::CurrentDirectRadiation => current.direct_radiation,
            Metric::CurrentDiffuseRadiation => current.diffuse_radiation,
            Metric::ForecastTemp | Metric::ForecastTempMax => *daily.temperature_max.get(day)?,
            Metric::ForecastTempMin => *daily.temperature_min.get(day)?,
            Metric::ForecastApparentTempMax => *daily.apparent_temperature_max.get(day)?,
            Metric::ForecastApparentTempMin => *daily.apparent_temperature_min.get(day)?,
            Metric::ForecastWindSpeed => *daily.wind_speed_max.get(day)?,
            Metric::ForecastUvIndex => *daily.uv_index_max.get(day)?,
            Metric::ForecastSunrise => iso_hour_fraction(daily.sunrise.get(day)?),
            Metric::ForecastSunset => iso_hour_fraction(daily.sunset.get(day)?),
            Metric::HourlyTemp => *hourly.temperature.get(hour)?,
            Metric::HourlyHumidity => *hourly.humidity.get(hour)?,
            Metric::HourlyWindSpeed => *hourly.wind_speed.get(hour)?,
            Metric::HourlyApparentTemp => *hourly.apparent_temperature.get(hour)?,
            Metric::HourlyCloudCover => *hourly.cloud_cover.get(hour)?,
            Metric::HourlyVisibility => *hourly.visibility.get(hour)?,
            Metric::HourlySolarRadiation => *hourly.solar_radiation.get(hour)?,
            Metric::HourlyDirectRadiation => *hourly.direct_radiation.get(hour)?,
            Metric::HourlyDiffuseRadiation => *hourly.diffuse_radiation.get(hour)?,
            Metric::HourlyTime => iso_hour_fraction(hourly.time.get(hour)?),
            Metric::CurrentCondition
            | Metric::CurrentWindDirectionText
            | Metric::ForecastSunriseText
            | Metric::ForecastSunsetText
            | Metric::ForecastCondition
            | Metric::HourlyCondition
            | Metric::UvIndexText
            | Metric::NextHoursSummary => return None,
        };

        Some(value)
    }

    /// Text rendering, `None` for metrics that are plain numbers.
    pub fn text(&self, snapshot: &WeatherSnapshot, query: &Query) -> Option<String> {
        let day = query.forecast_day;
        let hour = query.hour_index();

        let text = match self {
            Metric::CurrentCondition => snapshot.current.condition.clone(),
            Metric::CurrentWindDirectionText => {
                wind_direction_text(snapshot.current.wind_direction).to_string()
            }
            Metric::ForecastSunriseText => iso_time_of_day(snapshot.daily.sunrise.get(day)?),
            Metric::ForecastSunsetText => iso_time_of_day(snapshot.daily.sunset.get(day)?),
            Metric::ForecastCondition => snapshot.daily.condition.get(day)?.clone(),
            Metric::HourlyCondition => snapshot.hourly.condition.get(hour)?.clone(),
            Metric::HourlyTime => iso_time_of_day(snapshot.hourly.time.get(hour)?),
            Metric::UvIndexText => uv_bucket_text(snapshot.current.uv_index).to_string(),
            Metric::NextHoursSummary => snapshot.next_hours_summary(query.current_hour),
            _ => return None,
        };

        Some(text)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Metric {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        Metric::all()
            .iter()
            .copied()
            .find(|metric| metric.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown metric '{value}'. Run `weatherx keys` to list supported metrics."
                )
            })
    }
}

/// Numeric value for `key`; unknown keys and text-only metrics give `0.0`.
pub fn resolve_numeric(key: &str, snapshot: &WeatherSnapshot, query: &Query) -> f64 {
    Metric::try_from(key)
        .ok()
        .and_then(|metric| metric.numeric(snapshot, query))
        .unwrap_or(0.0)
}

/// Text value for `key`. Anything without a text form is rendered as its
/// numeric value with one decimal.
pub fn resolve_text(key: &str, snapshot: &WeatherSnapshot, query: &Query) -> String {
    Metric::try_from(key)
        .ok()
        .and_then(|metric| metric.text(snapshot, query))
        .unwrap_or_else(|| format!("{:.1}", resolve_numeric(key, snapshot, query)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DAYS, HOURS};

    fn snapshot() -> WeatherSnapshot {
        let mut snapshot = WeatherSnapshot::default();
        snapshot.current.temperature = 21.46;
        snapshot.current.wind_direction = 225.0;
        snapshot.current.uv_index = 6.0;
        snapshot.current.condition = "Overcast".to_string();
        for day in 0..DAYS {
            snapshot.daily.temperature_max[day] = 20.0 + day as f64;
            snapshot.daily.sunrise[day] = format!("2024-07-{:02}T05:30", 15 + day);
            snapshot.daily.condition[day] = format!("day {day}");
        }
        for hour in 0..HOURS {
            snapshot.hourly.temperature[hour] = hour as f64;
            snapshot.hourly.time[hour] =
                format!("2024-07-{:02}T{:02}:00", 15 + hour / 24, hour % 24);
            snapshot.hourly.condition[hour] = "Clear Sky".to_string();
        }
        snapshot
    }

    const NOON: Query = Query {
        forecast_day: 0,
        hour_offset: 0,
        current_hour: 12,
    };

    #[test]
    fn metric_as_str_roundtrip() {
        for metric in Metric::all() {
            let parsed = Metric::try_from(metric.as_str()).expect("roundtrip should succeed");
            assert_eq!(*metric, parsed);
        }
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(Metric::try_from("CurrentTemp").unwrap(), Metric::CurrentTemp);
        assert_eq!(Metric::try_from("NEXTHOURSSUMMARY").unwrap(), Metric::NextHoursSummary);
    }

    #[test]
    fn unknown_metric_error() {
        let err = Metric::try_from("rainfall").unwrap_err();
        assert!(err.to_string().contains("Unknown metric"));
    }

    #[test]
    fn numeric_current_and_daily() {
        let snapshot = snapshot();
        assert_eq!(resolve_numeric("currenttemp", &snapshot, &NOON), 21.46);
        let day_three = Query { forecast_day: 3, ..NOON };
        assert_eq!(resolve_numeric("ForecastTemp", &snapshot, &day_three), 23.0);
        assert_eq!(resolve_numeric("forecasttempmax", &snapshot, &day_three), 23.0);
        assert_eq!(resolve_numeric("forecastsunrise", &snapshot, &day_three), 5.5);
    }

    #[test]
    fn hourly_uses_target_hour() {
        let snapshot = snapshot();
        let later = Query { hour_offset: 5, ..NOON };
        assert_eq!(resolve_numeric("hourlytemp", &snapshot, &later), 17.0);
        assert_eq!(resolve_text("hourlytime", &snapshot, &later), "17:00");

        let far = Query {
            hour_offset: 50,
            current_hour: 10,
            ..NOON
        };
        assert_eq!(resolve_numeric("hourlytemp", &snapshot, &far), 47.0);
    }

    #[test]
    fn unknown_keys_fall_back() {
        let snapshot = snapshot();
        assert_eq!(resolve_numeric("bogus", &snapshot, &NOON), 0.0);
        assert_eq!(resolve_text("bogus", &snapshot, &NOON), "0.0");
    }

    #[test]
    fn text_metrics() {
        let snapshot = snapshot();
        assert_eq!(resolve_text("currentcondition", &snapshot, &NOON), "Overcast");
        assert_eq!(resolve_text("currentwinddirectiontext", &snapshot, &NOON), "SW");
        assert_eq!(resolve_text("uvindextext", &snapshot, &NOON), "High");
        assert_eq!(resolve_text("forecastsunrisetext", &snapshot, &NOON), "05:30");
        let last_day = Query { forecast_day: 6, ..NOON };
        assert_eq!(resolve_text("forecastcondition", &snapshot, &last_day), "day 6");
        assert_eq!(resolve_text("hourlycondition", &snapshot, &NOON), "Clear Sky");
        let summary = resolve_text("nexthourssummary", &snapshot, &NOON);
        assert!(summary.starts_with("13:00: 13° | 14:00: 14°"));
    }

    #[test]
    fn numeric_metrics_render_with_one_decimal() {
        let snapshot = snapshot();
        assert_eq!(resolve_text("currenttemp", &snapshot, &NOON), "21.5");
        assert_eq!(resolve_text("forecastsunrise", &snapshot, &NOON), "5.5");
        assert_eq!(resolve_numeric("currentcondition", &snapshot, &NOON), 0.0);
    }
}
