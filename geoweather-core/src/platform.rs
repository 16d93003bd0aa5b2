//! Platform services the pipeline consumes: permission prompt, display
//! surface, settings navigation and network reachability.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Url;
use tokio::net::TcpStream;
use tracing::debug;

use crate::present::WeatherView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

impl Permission {
    /// The two permissions a location fix needs.
    pub const LOCATION: [Permission; 2] = [Permission::FineLocation, Permission::CoarseLocation];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    RationaleNeeded,
    PermanentlyDenied,
}

#[async_trait]
pub trait PermissionGate: Send + Sync + Debug {
    /// Adapters that cannot ask should answer `RationaleNeeded`.
    async fn check(&self, permissions: &[Permission]) -> PermissionOutcome;
}

/// The user's choice in the rationale dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RationaleChoice {
    OpenSettings,
    Cancel,
}

#[async_trait]
pub trait Screen: Send + Sync + Debug {
    /// Brief one-shot message.
    fn notice(&self, message: &str);

    fn render(&self, view: &WeatherView);

    /// Terminal failure of a run; `retryable` tells the surface to offer a refresh.
    fn show_error(&self, message: &str, retryable: bool);

    async fn ask_rationale(&self, message: &str) -> RationaleChoice;
}

pub trait SettingsNavigator: Send + Sync + Debug {
    fn open_location_settings(&self) -> anyhow::Result<()>;

    fn open_app_settings(&self, uri: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Connectivity: Send + Sync + Debug {
    async fn is_network_available(&self) -> bool;
}

/// Deep link to the app-details settings page for `package_id`.
pub fn app_settings_uri(package_id: &str) -> String {
    format!("package:{package_id}")
}

/// Reachability check that opens a TCP connection to the weather host.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self { addr: addr.into(), timeout }
    }

    /// Probe the host and port of `url`; `None` if the URL has no host.
    pub fn for_url(url: &str, timeout: Duration) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let port = parsed.port_or_known_default()?;
        Some(Self::new(format!("{host}:{port}"), timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn is_network_available(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "connectivity probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_uri_uses_package_scheme() {
        assert_eq!(app_settings_uri("dev.geoweather.cli"), "package:dev.geoweather.cli");
    }

    #[test]
    fn probe_address_from_url() {
        let probe = TcpProbe::for_url("https://api.openweathermap.org/data/2.5", Duration::from_secs(1))
            .expect("probe");
        assert_eq!(probe.addr(), "api.openweathermap.org:443");

        let probe = TcpProbe::for_url("http://127.0.0.1:8080/x", Duration::from_secs(1)).expect("probe");
        assert_eq!(probe.addr(), "127.0.0.1:8080");

        assert!(TcpProbe::for_url("not a url", Duration::from_secs(1)).is_none());
    }

    #[tokio::test]
    async fn probe_reaches_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(2));
        assert!(probe.is_network_available().await);
    }

    #[tokio::test]
    async fn probe_fails_on_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(2));
        assert!(!probe.is_network_available().await);
    }
}
