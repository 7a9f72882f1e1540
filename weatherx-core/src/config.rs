use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::{DAYS, HOURS};

const DEFAULT_METRIC: &str = "CurrentTemp";
const DEFAULT_UPDATE_INTERVAL: u64 = 600;
const DEFAULT_TIMEZONE: &str = "auto";

/// Unit system requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// latitude = 49.28
/// longitude = -123.12
/// metric = "NextHoursSummary"
/// hour_offset = 2
/// units = "metric"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,

    /// Metric key answered by `update` and `get_text`, case-insensitive.
    pub metric: String,

    /// Day of the daily forecast, 0 is today.
    pub forecast_day: i64,

    /// Hours ahead of the current hour for hourly metrics.
    pub hour_offset: i64,

    /// Seconds between downloads.
    pub update_interval: u64,

    pub units: Units,

    /// IANA timezone name, or "auto" to use the location's timezone.
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            metric: DEFAULT_METRIC.to_string(),
            forecast_day: 0,
            hour_offset: 0,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            units: Units::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl Config {
    /// Load config from the platform config file, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or return the defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherx", "weatherx")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Runtime view of a [`Config`], with out-of-range values already corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub latitude: f64,
    pub longitude: f64,
    pub metric: String,
    pub forecast_day: usize,
    pub hour_offset: usize,
    pub update_interval: Duration,
    pub units: Units,
    pub timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Settings {
    /// A forecast day outside the week falls back to today, the hour offset
    /// is clamped to the hourly window, and a zero interval means the default.
    pub fn from_config(config: &Config) -> Self {
        let forecast_day = usize::try_from(config.forecast_day)
            .ok()
            .filter(|day| *day < DAYS)
            .unwrap_or(0);

        let hour_offset = config.hour_offset.clamp(0, HOURS as i64 - 1) as usize;

        let update_interval = match config.update_interval {
            0 => DEFAULT_UPDATE_INTERVAL,
            secs => secs,
        };

        let timezone = match config.timezone.trim() {
            "" => DEFAULT_TIMEZONE.to_string(),
            tz => tz.to_string(),
        };

        Self {
            latitude: config.latitude,
            longitude: config.longitude,
            metric: config.metric.trim().to_lowercase(),
            forecast_day,
            hour_offset,
            update_interval: Duration::from_secs(update_interval),
            units: config.units,
            timezone,
        }
    }
}
