//! Location sources and the single-fix fetcher.
//!
//! Two sources are available to a terminal host: fixed coordinates from the
//! config file (treated as the "gps" source) and IP geolocation (the
//! "network" source). Either one being enabled passes the provider check.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::{config::LocationConfig, error::LocationError, model::Coordinates};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json/";
const IP_LOOKUP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationSource {
    Gps,
    Network,
}

/// Requested accuracy for a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    HighAccuracy,
    LowPower,
}

/// OS-level switches for the location sources.
pub trait LocationSources: Send + Sync + Debug {
    fn is_enabled(&self, source: LocationSource) -> bool;

    /// True when at least one of GPS or network is on.
    fn any_enabled(&self) -> bool {
        self.is_enabled(LocationSource::Gps) || self.is_enabled(LocationSource::Network)
    }
}

#[async_trait]
pub trait LocationFetcher: Send + Sync + Debug {
    /// Request exactly one fix.
    async fn request_fix(&self, priority: Priority) -> Result<Coordinates, LocationError>;
}

/// IP geolocation in the ip-api.com response format.
#[derive(Debug, Clone)]
pub struct IpLocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(url: &str) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(IP_LOOKUP_TIMEOUT_SECS))
            .build()?;

        Ok(Self { url: url.to_string(), http })
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn lookup(&self) -> Result<Coordinates, LocationError> {
        let res = self
            .http
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Lookup(format!("lookup returned status {status}")));
        }

        let body: IpLookupResponse = res.json().await?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| body.status.clone());
            return Err(LocationError::Lookup(reason));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Lookup("response has no coordinates".to_string())),
        }
    }
}

#[async_trait]
impl LocationFetcher for IpLocator {
    async fn request_fix(&self, _priority: Priority) -> Result<Coordinates, LocationError> {
        self.lookup().await
    }
}

/// Location sources built from the `[location]` config section.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    fixed: Option<Coordinates>,
    ip: Option<IpLocator>,
}

impl ConfiguredLocation {
    pub fn new(fixed: Option<Coordinates>, ip: Option<IpLocator>) -> Self {
        Self { fixed, ip }
    }

    pub fn from_config(config: &LocationConfig) -> Result<Self, LocationError> {
        let ip = if config.ip_lookup {
            Some(IpLocator::new(config.ip_lookup_url())?)
        } else {
            None
        };

        Ok(Self::new(config.coordinates(), ip))
    }
}

impl LocationSources for ConfiguredLocation {
    fn is_enabled(&self, source: LocationSource) -> bool {
        match source {
            LocationSource::Gps => self.fixed.is_some(),
            LocationSource::Network => self.ip.is_some(),
        }
    }
}

#[async_trait]
impl LocationFetcher for ConfiguredLocation {
    async fn request_fix(&self, priority: Priority) -> Result<Coordinates, LocationError> {
        match (priority, self.fixed, &self.ip) {
            (Priority::HighAccuracy, Some(fixed), _) => {
                debug!("using configured coordinates");
                Ok(fixed)
            }
            (_, fixed, Some(ip)) => match ip.request_fix(priority).await {
                Ok(coords) => {
                    info!(latitude = coords.latitude, longitude = coords.longitude, "ip location resolved");
                    Ok(coords)
                }
                Err(e) => match fixed {
                    Some(fixed) => {
                        warn!(error = %e, "ip lookup failed, using configured coordinates");
                        Ok(fixed)
                    }
                    None => Err(e),
                },
            },
            (_, Some(fixed), None) => Ok(fixed),
            (_, None, None) => Err(LocationError::Unavailable),
        }
    }
}
