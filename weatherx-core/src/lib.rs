//! Core library for the `weatherx` tool.
//!
//! This crate defines:
//! - A substring-scan extraction engine for Open-Meteo forecast responses
//! - The parsed weather snapshot and the values derived from it
//! - Metric keys and how they resolve to numbers or text
//! - Configuration, the HTTP provider and the polling `Measure`
//!
//! It is used by `weatherx-cli`, but can also be embedded in other hosts.

pub mod clock;
pub mod condition;
pub mod config;
pub mod derived;
pub mod error;
pub mod extract;
pub mod measure;
pub mod metric;
pub mod model;
pub mod provider;
pub mod refresh;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, Settings, Units};
pub use error::FetchError;
pub use measure::{Measure, RefreshOutcome, Status};
pub use metric::{Metric, Query, resolve_numeric, resolve_text};
pub use model::{CurrentConditions, DailyForecast, HourlyForecast, WeatherSnapshot};
pub use provider::{OpenMeteoProvider, WeatherProvider};
pub use refresh::{RefreshHandle, RefreshMessage};
