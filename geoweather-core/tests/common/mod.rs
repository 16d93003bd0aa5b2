//! Recording fakes for the platform traits.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use geoweather_core::{
    BackendErrorPolicy, Connectivity, Coordinates, LocationError, LocationFetcher, LocationSource,
    LocationSources, Permission, PermissionGate, PermissionOutcome, Pipeline, PipelineOptions,
    Platform, Priority, ProgressIndicator, RationaleChoice, Screen, SettingsNavigator,
    WeatherError, WeatherProvider, WeatherRecord, WeatherRequest, WeatherView,
};

pub const PACKAGE_ID: &str = "dev.geoweather.test";
pub const PARIS: Coordinates = Coordinates { latitude: 48.85, longitude: 2.35 };

/// Body for the documented scenario: one clear-sky entry.
pub fn clear_sky_json() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 2.35, "lat": 48.85},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 21.5, "feels_like": 21.0, "temp_min": 19.0, "temp_max": 23.0, "pressure": 1016, "humidity": 40},
        "wind": {"speed": 3.6, "deg": 220},
        "sys": {"country": "FR", "sunrise": 1_700_000_000_i64, "sunset": 1_700_040_000_i64},
        "name": "Paris",
        "cod": 200
    })
}

pub fn clear_sky_record() -> WeatherRecord {
    serde_json::from_value(clear_sky_json()).expect("fixture parses")
}

#[derive(Debug)]
pub struct FakeSources {
    pub gps: bool,
    pub network: bool,
}

impl LocationSources for FakeSources {
    fn is_enabled(&self, source: LocationSource) -> bool {
        match source {
            LocationSource::Gps => self.gps,
            LocationSource::Network => self.network,
        }
    }
}

#[derive(Debug)]
pub struct FakeGate {
    pub outcome: PermissionOutcome,
    pub calls: AtomicUsize,
}

impl FakeGate {
    pub fn new(outcome: PermissionOutcome) -> Self {
        Self { outcome, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl PermissionGate for FakeGate {
    async fn check(&self, permissions: &[Permission]) -> PermissionOutcome {
        assert_eq!(permissions, Permission::LOCATION);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}

/// Returns `fix`, or never answers when it is `None`.
#[derive(Debug)]
pub struct FakeLocator {
    pub fix: Option<Coordinates>,
    pub calls: AtomicUsize,
}

impl FakeLocator {
    pub fn at(fix: Coordinates) -> Self {
        Self { fix: Some(fix), calls: AtomicUsize::new(0) }
    }

    pub fn silent() -> Self {
        Self { fix: None, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl LocationFetcher for FakeLocator {
    async fn request_fix(&self, priority: Priority) -> Result<Coordinates, LocationError> {
        assert_eq!(priority, Priority::HighAccuracy);
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fix {
            Some(fix) => Ok(fix),
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug)]
pub struct FakeConnectivity(pub bool);

#[async_trait]
impl Connectivity for FakeConnectivity {
    async fn is_network_available(&self) -> bool {
        self.0
    }
}

#[derive(Debug)]
pub struct RecordingScreen {
    pub rationale_choice: RationaleChoice,
    pub notices: Mutex<Vec<String>>,
    pub renders: Mutex<Vec<WeatherView>>,
    pub errors: Mutex<Vec<(String, bool)>>,
    pub rationales: Mutex<Vec<String>>,
}

impl RecordingScreen {
    pub fn new(rationale_choice: RationaleChoice) -> Self {
        Self {
            rationale_choice,
            notices: Mutex::default(),
            renders: Mutex::default(),
            errors: Mutex::default(),
            rationales: Mutex::default(),
        }
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<WeatherView> {
        self.renders.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(String, bool)> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Screen for RecordingScreen {
    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    fn render(&self, view: &WeatherView) {
        self.renders.lock().unwrap().push(view.clone());
    }

    fn show_error(&self, message: &str, retryable: bool) {
        self.errors.lock().unwrap().push((message.to_string(), retryable));
    }

    async fn ask_rationale(&self, message: &str) -> RationaleChoice {
        self.rationales.lock().unwrap().push(message.to_string());
        self.rationale_choice
    }
}

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub shows: AtomicUsize,
    pub hides: AtomicUsize,
}

impl RecordingProgress {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl ProgressIndicator for RecordingProgress {
    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct RecordingSettings {
    pub location_opened: AtomicUsize,
    pub app_uris: Mutex<Vec<String>>,
}

impl SettingsNavigator for RecordingSettings {
    fn open_location_settings(&self) -> anyhow::Result<()> {
        self.location_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn open_app_settings(&self, uri: &str) -> anyhow::Result<()> {
        self.app_uris.lock().unwrap().push(uri.to_string());
        Ok(())
    }
}

/// Answers after `delay` with the clear-sky record.
#[derive(Debug)]
pub struct SlowProvider {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait]
impl WeatherProvider for SlowProvider {
    async fn get_weather(&self, _request: &WeatherRequest) -> Result<WeatherRecord, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(clear_sky_record())
    }
}

pub struct Harness {
    pub sources: Arc<FakeSources>,
    pub gate: Arc<FakeGate>,
    pub locator: Arc<FakeLocator>,
    pub connectivity: Arc<FakeConnectivity>,
    pub screen: Arc<RecordingScreen>,
    pub progress: Arc<RecordingProgress>,
    pub settings: Arc<RecordingSettings>,
    pub region: Option<String>,
    pub fix_timeout: Duration,
    pub backend_errors: BackendErrorPolicy,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            sources: Arc::new(FakeSources { gps: true, network: true }),
            gate: Arc::new(FakeGate::new(PermissionOutcome::Granted)),
            locator: Arc::new(FakeLocator::at(PARIS)),
            connectivity: Arc::new(FakeConnectivity(true)),
            screen: Arc::new(RecordingScreen::new(RationaleChoice::Cancel)),
            progress: Arc::new(RecordingProgress::default()),
            settings: Arc::new(RecordingSettings::default()),
            region: Some("FR".to_string()),
            fix_timeout: Duration::from_secs(5),
            backend_errors: BackendErrorPolicy::Surface,
        }
    }
}

impl Harness {
    pub fn pipeline(&self, weather: Arc<dyn WeatherProvider>) -> Pipeline {
        let platform = Platform {
            sources: self.sources.clone(),
            permissions: self.gate.clone(),
            locator: self.locator.clone(),
            connectivity: self.connectivity.clone(),
            weather,
            screen: self.screen.clone(),
            progress: self.progress.clone(),
            settings: self.settings.clone(),
        };

        let options = PipelineOptions {
            package_id: PACKAGE_ID.to_string(),
            region: self.region.clone(),
            fix_timeout: self.fix_timeout,
            backend_errors: self.backend_errors,
        };

        Pipeline::new(platform, options)
    }

    pub fn gate_calls(&self) -> usize {
        self.gate.calls.load(Ordering::SeqCst)
    }

    pub fn locator_calls(&self) -> usize {
        self.locator.calls.load(Ordering::SeqCst)
    }
}
