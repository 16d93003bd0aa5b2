//! The location-to-weather pipeline.
//!
//! One run walks
//! `CheckingProviderEnabled → CheckingPermission → FetchingLocation →
//! FetchingWeather` and ends in exactly one terminal state. Stages are
//! sequential awaits; a second run while one is in flight is rejected.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::{BackendErrorPolicy, Config},
    error::{ErrorCategory, PipelineError},
    location::{LocationFetcher, LocationSources, Priority},
    model::{Coordinates, WeatherRequest},
    platform::{
        Connectivity, Permission, PermissionGate, PermissionOutcome, RationaleChoice, Screen,
        SettingsNavigator, app_settings_uri,
    },
    present::{DisplayContext, WeatherView, detect_region},
    progress::{ProgressIndicator, ProgressSlot},
    provider::WeatherProvider,
};

pub const RATIONALE_MESSAGE: &str = "It looks like you have turned off permissions required for \
    this feature. It can be enabled under Application Settings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CheckingProviderEnabled,
    RedirectToSettings,
    CheckingPermission,
    Halted(ErrorCategory),
    FetchingLocation,
    FetchingWeather,
    Rendered,
    Failed(ErrorCategory),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RedirectToSettings | Self::Halted(_) | Self::Rendered | Self::Failed(_)
        )
    }
}

/// Everything the pipeline talks to.
#[derive(Debug, Clone)]
pub struct Platform {
    pub sources: Arc<dyn LocationSources>,
    pub permissions: Arc<dyn PermissionGate>,
    pub locator: Arc<dyn LocationFetcher>,
    pub connectivity: Arc<dyn Connectivity>,
    pub weather: Arc<dyn WeatherProvider>,
    pub screen: Arc<dyn Screen>,
    pub progress: Arc<dyn ProgressIndicator>,
    pub settings: Arc<dyn SettingsNavigator>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Identifier used for the app-settings deep link.
    pub package_id: String,
    pub region: Option<String>,
    pub fix_timeout: Duration,
    pub backend_errors: BackendErrorPolicy,
}

impl PipelineOptions {
    pub fn from_config(config: &Config, package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            region: config.display.region.clone().or_else(detect_region),
            fix_timeout: config.location.fix_timeout(),
            backend_errors: config.display.backend_errors,
        }
    }
}

#[derive(Debug)]
pub struct Pipeline {
    platform: Platform,
    options: PipelineOptions,
    progress: ProgressSlot,
    view: Mutex<WeatherView>,
    state: watch::Sender<PipelineState>,
    in_flight: AtomicBool,
    authorized: AtomicBool,
    cancel: CancellationToken,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Pipeline {
    pub fn new(platform: Platform, options: PipelineOptions) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        let progress = ProgressSlot::new(platform.progress.clone());

        Self {
            platform,
            options,
            progress,
            view: Mutex::new(WeatherView::default()),
            state,
            in_flight: AtomicBool::new(false),
            authorized: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Snapshot of the display fields.
    pub async fn view(&self) -> WeatherView {
        self.view.lock().await.clone()
    }

    /// Token that aborts any pending stage; once cancelled, later runs end
    /// immediately.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Full run: provider check, permission gate, then fetch and render.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<WeatherView, PipelineError> {
        let _flight = self.begin()?;

        let result = match self.authorize().await {
            Ok(()) => self.fetch_and_render().await,
            Err(e) => Err(e),
        };

        self.finish(result)
    }

    /// Re-enter `FetchingLocation` directly. Falls back to a full run until a
    /// run has passed both checks.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<WeatherView, PipelineError> {
        if !self.authorized.load(Ordering::Acquire) {
            debug!("refresh before authorization, running full pipeline");
            return self.run().await;
        }

        let _flight = self.begin()?;
        let result = self.fetch_and_render().await;
        self.finish(result)
    }

    fn begin(&self) -> Result<InFlight<'_>, PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("pipeline run already in flight, ignoring request");
                PipelineError::Busy
            })?;

        Ok(InFlight(&self.in_flight))
    }

    fn set_state(&self, state: PipelineState) {
        debug!(?state, "pipeline state");
        self.state.send_replace(state);
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, PipelineError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            out = fut => Ok(out),
        }
    }

    async fn authorize(&self) -> Result<(), PipelineError> {
        let screen = &self.platform.screen;

        self.set_state(PipelineState::CheckingProviderEnabled);
        if !self.platform.sources.any_enabled() {
            screen.notice(&PipelineError::ProviderDisabled.user_message());
            if let Err(e) = self.platform.settings.open_location_settings() {
                warn!(error = %e, "could not open location settings");
            }
            return Err(PipelineError::ProviderDisabled);
        }

        self.set_state(PipelineState::CheckingPermission);
        let outcome = self
            .cancellable(self.platform.permissions.check(&Permission::LOCATION))
            .await?;

        match outcome {
            PermissionOutcome::Granted => {
                self.authorized.store(true, Ordering::Release);
                Ok(())
            }
            PermissionOutcome::PermanentlyDenied => {
                screen.notice(&PipelineError::PermissionDenied.user_message());
                Err(PipelineError::PermissionDenied)
            }
            PermissionOutcome::RationaleNeeded => {
                let choice = self.cancellable(screen.ask_rationale(RATIONALE_MESSAGE)).await?;
                if choice == RationaleChoice::OpenSettings {
                    let uri = app_settings_uri(&self.options.package_id);
                    if let Err(e) = self.platform.settings.open_app_settings(&uri) {
                        warn!(error = %e, %uri, "could not open app settings");
                    }
                }
                Err(PipelineError::PermissionRationale)
            }
        }
    }

    async fn locate(&self) -> Result<Coordinates, PipelineError> {
        let timeout = self.options.fix_timeout;
        let fix = tokio::time::timeout(
            timeout,
            self.platform.locator.request_fix(Priority::HighAccuracy),
        );

        match self.cancellable(fix).await? {
            Ok(coords) => Ok(coords?),
            Err(_) => Err(PipelineError::LocationTimeout(timeout)),
        }
    }

    async fn fetch_and_render(&self) -> Result<WeatherView, PipelineError> {
        self.set_state(PipelineState::FetchingLocation);
        let coords = self.locate().await?;
        info!(latitude = coords.latitude, longitude = coords.longitude, "location fix");

        self.set_state(PipelineState::FetchingWeather);
        if !self.cancellable(self.platform.connectivity.is_network_available()).await? {
            self.platform.screen.notice(&PipelineError::NoConnectivity.user_message());
            return Err(PipelineError::NoConnectivity);
        }

        let progress = self.progress.acquire();
        let request = WeatherRequest::metric(coords);
        let record = self.cancellable(self.platform.weather.get_weather(&request)).await??;
        progress.release();

        let ctx = DisplayContext { region: self.options.region.clone() };
        let mut view = self.view.lock().await;
        view.bind(&record, &ctx);
        self.platform.screen.render(&view);

        Ok(view.clone())
    }

    fn finish(&self, result: Result<WeatherView, PipelineError>) -> Result<WeatherView, PipelineError> {
        match &result {
            Ok(_) => self.set_state(PipelineState::Rendered),
            Err(PipelineError::ProviderDisabled) => self.set_state(PipelineState::RedirectToSettings),
            Err(e) if e.is_backend() => {
                let category = e.category();
                error!(%category, error = %e, "pipeline failed");
                if self.options.backend_errors == BackendErrorPolicy::Surface {
                    self.platform.screen.show_error(&e.user_message(), e.is_retryable());
                }
                self.set_state(PipelineState::Failed(category));
            }
            Err(e) => {
                let category = e.category();
                info!(%category, "pipeline halted");
                self.set_state(PipelineState::Halted(category));
            }
        }

        result
    }
}
