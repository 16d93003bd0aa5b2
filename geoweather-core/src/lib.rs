//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - The location-to-weather pipeline and its state machine
//! - Platform seams (permissions, location sources, connectivity, display)
//! - The OpenWeather client and response model
//! - The presentation binder (icon table, unit suffix, clock formatting)
//! - Configuration handling
//!
//! It is used by `geoweather-cli`, but any host that can implement the
//! platform traits can drive the pipeline.

pub mod config;
pub mod error;
pub mod icon;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod platform;
pub mod present;
pub mod progress;
pub mod provider;

pub use config::{BackendErrorPolicy, Config, StoredPermission};
pub use error::{ErrorCategory, LocationError, PipelineError, WeatherError};
pub use icon::{IconCode, WeatherIcon};
pub use location::{ConfiguredLocation, LocationFetcher, LocationSource, LocationSources, Priority};
pub use model::{Coordinates, WeatherRecord, WeatherRequest};
pub use pipeline::{Pipeline, PipelineOptions, PipelineState, Platform};
pub use platform::{
    Connectivity, Permission, PermissionGate, PermissionOutcome, RationaleChoice, Screen,
    SettingsNavigator, TcpProbe,
};
pub use present::{DisplayContext, WeatherView};
pub use progress::{ProgressIndicator, ProgressSlot};
pub use provider::{OpenWeatherProvider, WeatherProvider};
