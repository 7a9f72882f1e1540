use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::{
    config::{Settings, Units},
    error::FetchError,
    model::DAYS,
};

use super::{WeatherProvider, truncate_body};

const API_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("WeatherX/", env!("CARGO_PKG_VERSION"));

const CURRENT_VARIABLES: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
weather_code,cloud_cover,surface_pressure,wind_speed_10m,wind_direction_10m,wind_gusts_10m,\
dew_point_2m,uv_index,shortwave_radiation,direct_radiation,diffuse_radiation";

const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
weather_code,cloud_cover,visibility,wind_speed_10m,shortwave_radiation,direct_radiation,\
diffuse_radiation";

const DAILY_VARIABLES: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
apparent_temperature_max,apparent_temperature_min,sunrise,sunset,uv_index_max,\
wind_speed_10m_max";

/// Builds the forecast request for the configured location and units.
///
/// Only `forecast_days` bounds the series: the hourly data then starts at
/// local midnight, which is what hour indexing in the snapshot expects.
pub fn forecast_url(settings: &Settings) -> Result<Url, FetchError> {
    let mut params = vec![
        ("latitude", settings.latitude.to_string()),
        ("longitude", settings.longitude.to_string()),
        ("current", CURRENT_VARIABLES.to_string()),
        ("hourly", HOURLY_VARIABLES.to_string()),
        ("daily", DAILY_VARIABLES.to_string()),
        ("forecast_days", DAYS.to_string()),
        ("timezone", settings.timezone.clone()),
    ];

    if settings.units == Units::Imperial {
        params.push(("temperature_unit", "fahrenheit".to_string()));
        params.push(("wind_speed_unit", "mph".to_string()));
        params.push(("precipitation_unit", "inch".to_string()));
    }

    Url::parse_with_params(API_BASE_URL, &params)
        .map_err(|e| FetchError::InvalidRequest(format!("Failed to build forecast URL: {e}")))
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http })
    }

    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let res = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Api { status, reason: api_reason(&body) });
        }

        debug!(bytes = body.len(), "forecast downloaded");
        Ok(body)
    }
}

/// Open-Meteo error bodies look like `{"error": true, "reason": "..."}`.
#[derive(Debug, Deserialize)]
struct OmErrorResponse {
    reason: String,
}

fn api_reason(body: &str) -> String {
    serde_json::from_str::<OmErrorResponse>(body)
        .map(|e| e.reason)
        .unwrap_or_else(|_| truncate_body(body))
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    /// Tries the URL as given; when an HTTPS request cannot reach the server
    /// it is repeated once over plain HTTP.
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let err = match self.get(url).await {
            Ok(body) => return Ok(body),
            Err(err @ FetchError::Network(_)) if url.scheme() == "https" => err,
            Err(err) => return Err(err),
        };

        warn!(error = %err, "HTTPS request failed, trying HTTP fallback");

        let mut fallback = url.clone();
        if fallback.set_scheme("http").is_err() {
            return Err(err);
        }

        match self.get(&fallback).await {
            Ok(body) => {
                debug!("HTTP fallback successful");
                Ok(body)
            }
            Err(fallback_err) => {
                error!(error = %fallback_err, "HTTP fallback also failed");
                Err(err)
            }
        }
    }
}
