//! The polling interface: configure once, then ask for a number or a text
//! as often as the host likes. Downloads happen only when the data is stale.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::NaiveDateTime;
use tracing::{debug, error, info, instrument};

use crate::{
    clock::Clock,
    config::{Config, Settings},
    error::FetchError,
    metric::{Query, resolve_numeric, resolve_text},
    model::WeatherSnapshot,
    provider::{WeatherProvider, forecast_url},
};

const INVALID_COORDINATES: &str = "Invalid coordinates";

/// Health of the last download, reported through the `status` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing downloaded yet.
    Pending,
    Ok,
    /// The last attempt failed; values come from an older snapshot, if any.
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Ok => "OK",
            Status::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Another refresh was already running; this one did nothing.
    AlreadyRunning,
    /// The configuration was reloaded while downloading. The result was
    /// dropped and the next update downloads for the new configuration.
    Superseded,
}

#[derive(Debug, Default)]
struct FetchState {
    last_error: String,
    last_url: String,
    last_success: Option<NaiveDateTime>,
    last_attempt_failed: bool,
    force_refresh: bool,
    /// Bumped by every reload.
    generation: u64,
}

#[derive(Debug)]
pub struct Measure {
    provider: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
    settings: RwLock<Settings>,
    snapshot: RwLock<Arc<WeatherSnapshot>>,
    state: Mutex<FetchState>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl Measure {
    pub fn new(provider: Arc<dyn WeatherProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            settings: RwLock::new(Settings::default()),
            snapshot: RwLock::new(Arc::new(WeatherSnapshot::default())),
            state: Mutex::new(FetchState {
                force_refresh: true,
                ..FetchState::default()
            }),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Applies a new configuration. The next [`Measure::update`] downloads
    /// regardless of how fresh the current snapshot is.
    pub fn reload(&self, config: &Config) {
        let settings = Settings::from_config(config);
        debug!(
            latitude = settings.latitude,
            longitude = settings.longitude,
            metric = %settings.metric,
            "configuration reloaded"
        );

        // settings first: a refresh that sees the new generation must also see them
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;

        let mut state = self.state();
        if config.has_valid_coordinates() {
            state.last_error.clear();
        } else {
            error!(
                latitude = config.latitude,
                longitude = config.longitude,
                "invalid coordinates"
            );
            state.last_error = INVALID_COORDINATES.to_string();
        }
        state.force_refresh = true;
        state.generation += 1;
    }

    /// Refreshes when the snapshot is stale, then returns the numeric value of
    /// the configured metric.
    pub async fn update(&self) -> f64 {
        if self.needs_refresh() {
            // failures are recorded in the debug state
            let _ = self.refresh().await;
        }

        self.numeric_value()
    }

    /// Text value of the configured metric, including the debug keys.
    pub fn get_text(&self) -> String {
        let metric = self.settings().metric.clone();

        match metric.as_str() {
            "debugerror" => {
                let state = self.state();
                if state.last_error.is_empty() {
                    "No Error".to_string()
                } else {
                    state.last_error.clone()
                }
            }
            "debugurl" => self.state().last_url.clone(),
            "status" => self.status().as_str().to_string(),
            key => resolve_text(key, &self.snapshot(), &self.query()),
        }
    }

    pub fn numeric_value(&self) -> f64 {
        let metric = self.settings().metric.clone();
        resolve_numeric(&metric, &self.snapshot(), &self.query())
    }

    pub fn needs_refresh(&self) -> bool {
        let interval = self.settings().update_interval;
        let state = self.state();

        if state.force_refresh {
            return true;
        }

        match (state.last_success, chrono::Duration::from_std(interval)) {
            (Some(last), Ok(interval)) => self.clock.now() - last >= interval,
            _ => true,
        }
    }

    /// Downloads and parses a new snapshot and swaps it in. Only one refresh
    /// runs at a time; a concurrent call returns
    /// [`RefreshOutcome::AlreadyRunning`] without waiting.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, FetchError> {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            debug!("refresh already in flight");
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        let generation = self.state().generation;
        let url = match forecast_url(&self.settings()) {
            Ok(url) => url,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        self.state().last_url = url.to_string();
        debug!(%url, "requesting forecast");

        let result = self.provider.fetch(&url).await;
        if self.state().generation != generation {
            debug!(%url, "configuration reloaded during download, dropping result");
            return Ok(RefreshOutcome::Superseded);
        }

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        let fetched_at = self.clock.now();
        let snapshot = Arc::new(WeatherSnapshot {
            fetched_at: Some(fetched_at),
            ..WeatherSnapshot::parse(&body)
        });
        info!(
            temperature = snapshot.current.temperature,
            condition = %snapshot.current.condition,
            "weather data updated"
        );

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;

        let mut state = self.state();
        state.last_error.clear();
        state.last_success = Some(fetched_at);
        state.last_attempt_failed = false;
        // a reload that slipped in after the check above still gets its download
        if state.generation == generation {
            state.force_refresh = false;
        }

        Ok(RefreshOutcome::Updated)
    }

    pub fn status(&self) -> Status {
        let state = self.state();
        if state.last_attempt_failed {
            Status::Error
        } else if state.last_success.is_some() {
            Status::Ok
        } else {
            Status::Pending
        }
    }

    /// The snapshot currently served. Readers keep their `Arc` even if a
    /// refresh swaps in a newer one meanwhile.
    pub fn snapshot(&self) -> Arc<WeatherSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_error(&self) -> String {
        self.state().last_error.clone()
    }

    pub fn last_url(&self) -> String {
        self.state().last_url.clone()
    }

    fn query(&self) -> Query {
        let settings = self.settings();
        Query {
            forecast_day: settings.forecast_day,
            hour_offset: settings.hour_offset,
            current_hour: self.clock.current_hour(),
        }
    }

    fn record_failure(&self, err: &FetchError) {
        error!(error = %err, "weather update failed");

        let mut state = self.state();
        state.last_error = err.to_string();
        state.last_attempt_failed = true;
    }

    fn state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use url::Url;

    const FIRST: &str = concat!(
        r#"{"current":{"temperature_2m":18.5,"weather_code":3},"#,
        r#""hourly":{"time":["2024-07-15T00:00"],"temperature_2m":[11.0]},"#,
        r#""daily":{"temperature_2m_max":[24.0,25.0]}}"#,
    );
    const SECOND: &str = r#"{"current":{"temperature_2m":19.0,"weather_code":0}}"#;

    #[derive(Debug, Default)]
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::InvalidRequest("no more responses".into())))
        }
    }

    fn offline() -> Result<String, FetchError> {
        Err(FetchError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            reason: "maintenance".into(),
        })
    }

    fn clock() -> Arc<FixedClock> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
        Arc::new(FixedClock::new(start))
    }

    fn config(metric: &str) -> Config {
        Config {
            latitude: 49.28,
            longitude: -123.12,
            metric: metric.into(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn first_update_downloads_and_resolves() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(FIRST.into())]));
        let measure = Measure::new(provider.clone(), clock());
        measure.reload(&config("CurrentTemp"));

        assert_eq!(measure.status(), Status::Pending);
        assert_eq!(measure.update().await, 18.5);
        assert_eq!(measure.get_text(), "18.5");
        assert_eq!(measure.status(), Status::Ok);
        assert_eq!(provider.calls(), 1);

        let dumped = serde_json::to_value(measure.snapshot().as_ref()).unwrap();
        assert_eq!(dumped["fetched_at"], "2024-07-15T09:00:00");
        assert_eq!(dumped["current"]["temperature"], 18.5);
    }

    #[tokio::test]
    async fn fresh_snapshot_is_not_downloaded_again() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(FIRST.into()), Ok(SECOND.into())]));
        let clock = clock();
        let measure = Measure::new(provider.clone(), clock.clone());
        measure.reload(&config("currenttemp"));

        assert_eq!(measure.update().await, 18.5);
        clock.advance(chrono::Duration::seconds(599));
        assert_eq!(measure.update().await, 18.5);
        assert_eq!(provider.calls(), 1);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(measure.update().await, 19.0);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn reload_forces_download() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(FIRST.into()), Ok(SECOND.into())]));
        let measure = Measure::new(provider.clone(), clock());
        measure.reload(&config("currenttemp"));
        measure.update().await;

        measure.reload(&config("currentcondition"));
        assert!(measure.needs_refresh());
        measure.update().await;
        assert_eq!(measure.get_text(), "Clear Sky");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn failed_download_keeps_previous_snapshot() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(FIRST.into()), offline()]));
        let clock = clock();
        let measure = Measure::new(provider.clone(), clock.clone());
        measure.reload(&config("forecasttemp"));
        assert_eq!(measure.update().await, 24.0);

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(measure.update().await, 24.0);
        assert_eq!(measure.status(), Status::Error);
        assert!(measure.last_error().contains("maintenance"));
        assert_eq!(measure.snapshot().current.condition, "Overcast");
    }

    #[tokio::test]
    async fn debug_keys_report_fetch_state() {
        let provider = Arc::new(ScriptedProvider::new(vec![offline()]));
        let measure = Measure::new(provider, clock());

        measure.reload(&config("DebugError"));
        assert_eq!(measure.get_text(), "No Error");
        measure.update().await;
        assert_eq!(measure.get_text(), "API Error (503 Service Unavailable): maintenance");

        measure.reload(&config("debugurl"));
        let url = measure.get_text();
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=49.28"));

        measure.reload(&config("status"));
        assert_eq!(measure.get_text(), "Error");
    }

    #[tokio::test]
    async fn invalid_coordinates_are_reported() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let measure = Measure::new(provider, clock());
        measure.reload(&Config {
            latitude: 120.0,
            metric: "debugerror".into(),
            ..Config::default()
        });

        assert_eq!(measure.get_text(), "Invalid coordinates");
    }

    #[tokio::test]
    async fn hourly_metrics_use_clock_hour() {
        let json = r#"{"hourly":{"time":[],"temperature_2m":[0,1,2,3,4,5,6,7,8,9,10,11,12]}}"#;
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(json.into())]));
        let measure = Measure::new(provider, clock());
        measure.reload(&Config { hour_offset: 2, ..config("hourlytemp") });

        assert_eq!(measure.update().await, 11.0);
    }

    #[tokio::test]
    async fn concurrent_refresh_runs_once() {
        let provider = Arc::new(ScriptedProvider {
            delay: Some(Duration::from_millis(20)),
            ..ScriptedProvider::new(vec![Ok(FIRST.into()), Ok(SECOND.into())])
        });
        let measure = Measure::new(provider.clone(), clock());
        measure.reload(&config("currenttemp"));

        let (first, second) = tokio::join!(measure.refresh(), measure.refresh());
        assert_eq!(first.unwrap(), RefreshOutcome::Updated);
        assert_eq!(second.unwrap(), RefreshOutcome::AlreadyRunning);
        assert_eq!(provider.calls(), 1);
        assert_eq!(measure.numeric_value(), 18.5);
    }

    #[tokio::test]
    async fn reload_during_download_is_not_lost() {
        let provider = Arc::new(ScriptedProvider {
            delay: Some(Duration::from_millis(50)),
            ..ScriptedProvider::new(vec![Ok(FIRST.into()), Ok(SECOND.into())])
        });
        let measure = Measure::new(provider.clone(), clock());
        measure.reload(&Config {
            latitude: 10.0,
            longitude: 10.0,
            ..config("currenttemp")
        });

        let moved = Config {
            latitude: 50.0,
            longitude: 8.0,
            ..config("currenttemp")
        };
        let (outcome, ()) = tokio::join!(measure.refresh(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            measure.reload(&moved);
        });

        assert_eq!(outcome.unwrap(), RefreshOutcome::Superseded);
        assert!(measure.needs_refresh());
        assert_eq!(measure.status(), Status::Pending);
        assert_eq!(measure.snapshot().current.temperature, 0.0);

        assert_eq!(measure.update().await, 19.0);
        assert!(measure.last_url().contains("latitude=50&longitude=8"));
        assert!(!measure.needs_refresh());
        assert_eq!(provider.calls(), 2);
    }
}
