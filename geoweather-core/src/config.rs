use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    location::DEFAULT_IP_LOOKUP_URL, model::Coordinates, provider::openweather::DEFAULT_BASE_URL,
};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FIX_TIMEOUT_SECS: u64 = 30;

/// OpenWeather endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenWeatherConfig {
    pub api_key: Option<String>,

    /// Overrides the public endpoint, e.g. for a proxy.
    pub base_url: Option<String>,

    pub timeout_secs: Option<u64>,
}

impl OpenWeatherConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

/// The user's last answer to the location permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredPermission {
    Granted,
    Denied,
    DeniedForever,
}

/// Location sources.
///
/// Example TOML:
/// [location]
/// latitude = 48.85
/// longitude = 2.35
/// ip_lookup = true
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed coordinates; when both are set the "gps" source is enabled.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Enables the "network" source (IP geolocation).
    #[serde(default = "default_true")]
    pub ip_lookup: bool,

    pub ip_lookup_url: Option<String>,

    pub fix_timeout_secs: Option<u64>,

    pub permission: Option<StoredPermission>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            ip_lookup: true,
            ip_lookup_url: None,
            fix_timeout_secs: None,
            permission: None,
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        self.latitude = coordinates.map(|c| c.latitude);
        self.longitude = coordinates.map(|c| c.longitude);
    }

    pub fn ip_lookup_url(&self) -> &str {
        self.ip_lookup_url.as_deref().unwrap_or(DEFAULT_IP_LOOKUP_URL)
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.fix_timeout_secs.unwrap_or(DEFAULT_FIX_TIMEOUT_SECS))
    }
}

/// What happens when the weather request fails after the location was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendErrorPolicy {
    /// Show an error with a retry hint.
    #[default]
    Surface,
    /// Only write the failure to the log.
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Two-letter region code; derived from the process locale when absent.
    pub region: Option<String>,

    #[serde(default)]
    pub backend_errors: BackendErrorPolicy,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openweather: OpenWeatherConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

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
        let dirs = ProjectDirs::from("dev", "geoweather", "geoweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the OpenWeather API key, or an error with a setup hint.
    pub fn api_key(&self) -> Result<&str> {
        self.openweather
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `geoweather configure` and enter your API key."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }
}

fn default_true() -> bool {
    true
}
