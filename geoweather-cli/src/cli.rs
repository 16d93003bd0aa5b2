use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand};
use geoweather_core::{
    Config, ConfiguredLocation, Coordinates, Pipeline, PipelineError, PipelineOptions, Platform,
    TcpProbe, WeatherProvider, provider::provider_from_config,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{
    PACKAGE_ID, configure,
    permission::PromptPermissionGate,
    terminal::{TerminalProgress, TerminalScreen, TerminalSettings},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather for where you are")]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, location source and display region.
    Configure,

    /// Locate, fetch and show the current weather once.
    Show {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Show the weather, then refresh it periodically until Ctrl-C.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(5..))]
        interval: u64,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Per-invocation overrides of the config file.
#[derive(Debug, Args)]
pub struct Overrides {
    /// Latitude to use instead of the configured location sources.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude to use instead of the configured location sources.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Two-letter region deciding the temperature unit label, e.g. "US".
    #[arg(long)]
    region: Option<String>,

    /// OpenWeather API key.
    #[arg(long)]
    api_key: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.location.set_coordinates(Some(Coordinates::new(lat, lon)));
            config.location.ip_lookup = false;
        }
        if let Some(region) = self.region {
            config.display.region = Some(region.to_ascii_uppercase());
        }
        if let Some(key) = self.api_key {
            config.set_api_key(key);
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure::run()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { overrides } => {
                let pipeline = build_pipeline(overrides, "Run `geoweather show` to try again.")?;
                let result = pipeline.run().await;
                Ok(exit_code(result.is_ok()))
            }
            Command::Watch { interval, overrides } => {
                let hint = format!("Retrying in {interval}s.");
                let pipeline = build_pipeline(overrides, &hint)?;
                watch(&pipeline, Duration::from_secs(interval)).await
            }
        }
    }
}

fn exit_code(rendered: bool) -> ExitCode {
    if rendered { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// One full run, then a refresh per tick. Ctrl-C cancels whatever is pending.
async fn watch(pipeline: &Pipeline, interval: Duration) -> anyhow::Result<ExitCode> {
    let cancel = pipeline.cancellation_token();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut rendered = match pipeline.run().await {
        Ok(_) => true,
        // Provider and permission halts need the user to change settings first.
        Err(e) if !e.is_backend() && !matches!(e, PipelineError::NoConnectivity) => {
            return Ok(exit_code(false));
        }
        Err(_) => false,
    };

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("watch stopped");
                break;
            }
            _ = ticker.tick() => {
                debug!("refresh tick");
                rendered = pipeline.refresh().await.is_ok();
            }
        }
    }

    Ok(exit_code(rendered))
}

fn build_pipeline(overrides: Overrides, retry_hint: &str) -> anyhow::Result<Pipeline> {
    let config_path = Config::config_file_path()?;
    let mut config = Config::load_from(&config_path)?;
    overrides.apply(&mut config);

    let weather: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(&config)?);

    let location = Arc::new(
        ConfiguredLocation::from_config(&config.location)
            .context("Failed to set up location sources")?,
    );

    let connectivity = TcpProbe::for_url(config.openweather.base_url(), config.openweather.timeout())
        .ok_or_else(|| anyhow!("Invalid OpenWeather base_url: {}", config.openweather.base_url()))?;

    let screen = Arc::new(TerminalScreen::new(retry_hint));

    let platform = Platform {
        sources: location.clone(),
        permissions: Arc::new(PromptPermissionGate::new(
            config.location.permission,
            config_path.clone(),
        )),
        locator: location,
        connectivity: Arc::new(connectivity),
        weather,
        screen,
        progress: Arc::new(TerminalProgress),
        settings: Arc::new(TerminalSettings::new(config_path.display().to_string())),
    };

    Ok(Pipeline::new(platform, PipelineOptions::from_config(&config, PACKAGE_ID)))
}
