use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select, Text, validator::Validation};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::warn;
use weatherx_core::{
    Config, Measure, Metric, OpenMeteoProvider, RefreshHandle, RefreshMessage, Status, SystemClock,
    Units,
};

/// Keys answered from the fetch state rather than the forecast.
const DEBUG_KEYS: [&str; 3] = ["debugerror", "debugurl", "status"];

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherx",
    version,
    about = "Open-Meteo forecast values for status bars and scripts"
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set location, units and timezone interactively.
    Configure,

    /// Download the forecast once and print one metric.
    Show(MetricArgs),

    /// Keep printing a metric, refreshing in the background.
    Watch {
        #[command(flatten)]
        metric: MetricArgs,

        /// Seconds between printed values.
        #[arg(long, default_value_t = 60)]
        every: u64,

        /// Stop after this many values.
        #[arg(long)]
        count: Option<u64>,
    },

    /// Download the forecast once and print the parsed snapshot as JSON.
    Dump,

    /// List the supported metric keys.
    Keys,
}

#[derive(Debug, Args)]
pub struct MetricArgs {
    /// Metric key, e.g. "CurrentTemp" or "NextHoursSummary"; defaults to the configured one.
    pub metric: Option<String>,

    /// Forecast day for daily metrics, 0 is today.
    #[arg(long)]
    pub day: Option<i64>,

    /// Hours ahead of now for hourly metrics.
    #[arg(long)]
    pub hour_offset: Option<i64>,
}

impl MetricArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(metric) = &self.metric {
            config.metric = metric.clone();
        }
        if let Some(day) = self.day {
            config.forecast_day = day;
        }
        if let Some(hour_offset) = self.hour_offset {
            config.hour_offset = hour_offset;
        }

        let key = config.metric.to_lowercase();
        if Metric::try_from(key.as_str()).is_err() && !DEBUG_KEYS.contains(&key.as_str()) {
            warn!(metric = %config.metric, "unknown metric, values will fall back to 0.0");
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(self.config)?,
            Command::Keys => {
                for metric in Metric::all() {
                    println!("{metric}");
                }
                for key in DEBUG_KEYS {
                    println!("{key}");
                }
            }
            Command::Show(args) => {
                let mut config = load_config(self.config.as_ref())?;
                args.apply(&mut config);

                let measure = build_measure(&config)?;
                measure.update().await;
                if measure.status() == Status::Error && !is_debug_key(&config.metric) {
                    bail!("Failed to download forecast: {}", measure.last_error());
                }

                println!("{}", measure.get_text());
            }
            Command::Watch { metric, every, count } => {
                let mut config = load_config(self.config.as_ref())?;
                metric.apply(&mut config);

                let measure = Arc::new(build_measure(&config)?);
                watch(measure, Duration::from_secs(every.max(1)), count).await?;
            }
            Command::Dump => {
                let config = load_config(self.config.as_ref())?;
                let measure = build_measure(&config)?;

                measure.refresh().await.context("Failed to download forecast")?;
                let json = serde_json::to_string_pretty(measure.snapshot().as_ref())
                    .context("Failed to serialize snapshot")?;
                println!("{json}");
            }
        }

        Ok(())
    }
}

fn is_debug_key(metric: &str) -> bool {
    DEBUG_KEYS.contains(&metric.to_lowercase().as_str())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if !config.has_valid_coordinates() {
        bail!(
            "Invalid coordinates in configuration: latitude {}, longitude {}.\n\
             Hint: run `weatherx configure` first.",
            config.latitude,
            config.longitude
        );
    }

    Ok(config)
}

fn build_measure(config: &Config) -> Result<Measure> {
    let provider = OpenMeteoProvider::new().context("Failed to create HTTP client")?;
    let measure = Measure::new(Arc::new(provider), Arc::new(SystemClock));
    measure.reload(config);
    Ok(measure)
}

async fn watch(measure: Arc<Measure>, every: Duration, count: Option<u64>) -> Result<()> {
    let refresh_tick = every.min(Duration::from_secs(30));
    let mut handle = RefreshHandle::spawn(Arc::clone(&measure), refresh_tick);
    let mut interval = tokio::time::interval(every);
    let mut printed = 0u64;

    // wait for the first download so the first line is not a default value
    if let Some(RefreshMessage::Failed(err)) = handle.receiver.recv().await {
        warn!(error = %err, "initial download failed");
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                while let Some(message) = handle.try_recv() {
                    if let RefreshMessage::Failed(err) = message {
                        warn!(error = %err, "background refresh failed");
                    }
                }

                println!("[{}] {}", Local::now().format("%H:%M:%S"), measure.get_text());
                printed += 1;
                if count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn configure(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::config_file_path()?,
    };
    let mut config = Config::load_from(&path)?;

    config.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.latitude)
        .with_validator(|value: &f64| {
            Ok(if (-90.0..=90.0).contains(value) {
                Validation::Valid
            } else {
                Validation::Invalid("Latitude must be between -90 and 90".into())
            })
        })
        .prompt()
        .context("Failed to read latitude")?;

    config.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.longitude)
        .with_validator(|value: &f64| {
            Ok(if (-180.0..=180.0).contains(value) {
                Validation::Valid
            } else {
                Validation::Invalid("Longitude must be between -180 and 180".into())
            })
        })
        .prompt()
        .context("Failed to read longitude")?;

    let starting_units = Units::all().iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(starting_units)
        .prompt()
        .context("Failed to read units")?;

    config.timezone = Text::new("Timezone (IANA name or \"auto\"):")
        .with_default(&config.timezone)
        .prompt()
        .context("Failed to read timezone")?;

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
