//! Error types for the location-to-weather pipeline.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single weather request.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request rejected (400 Bad Request): {body}")]
    BadRequest { body: String },

    #[error("weather endpoint returned 404 Not Found: {body}")]
    NotFound { body: String },

    #[error("weather request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to reach the weather endpoint: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse the weather response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => WeatherError::BadRequest { body },
            404 => WeatherError::NotFound { body },
            _ => WeatherError::Status { status, body },
        }
    }

    /// Short label written to the log for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherError::BadRequest { .. } => "Bad Request",
            WeatherError::NotFound { .. } => "Not Found",
            WeatherError::Status { .. } => "Generic Error",
            WeatherError::Transport(_) => "Transport Failure",
            WeatherError::Decode(_) => "Malformed Response",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WeatherError::BadRequest { .. } => ErrorCategory::HttpBadRequest,
            WeatherError::NotFound { .. } => ErrorCategory::HttpNotFound,
            WeatherError::Status { .. } => ErrorCategory::HttpOther,
            WeatherError::Transport(_) => ErrorCategory::Transport,
            WeatherError::Decode(_) => ErrorCategory::Decode,
        }
    }
}

/// Failure of a location source.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("no location source is configured")]
    Unavailable,

    #[error("location lookup failed: {0}")]
    Lookup(String),

    #[error("location lookup request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Coarse classification used for logging and for picking the user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    ProviderDisabled,
    PermissionDeniedPermanently,
    PermissionRationale,
    NoConnectivity,
    HttpBadRequest,
    HttpNotFound,
    HttpOther,
    Transport,
    Decode,
    LocationTimeout,
    LocationUnavailable,
    Cancelled,
    Busy,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ProviderDisabled => "provider-disabled",
            ErrorCategory::PermissionDeniedPermanently => "permission-denied-permanently",
            ErrorCategory::PermissionRationale => "permission-rationale",
            ErrorCategory::NoConnectivity => "no-connectivity",
            ErrorCategory::HttpBadRequest => "http-bad-request",
            ErrorCategory::HttpNotFound => "http-not-found",
            ErrorCategory::HttpOther => "http-other",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Decode => "decode",
            ErrorCategory::LocationTimeout => "location-timeout",
            ErrorCategory::LocationUnavailable => "location-unavailable",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Busy => "busy",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pipeline run did not end in a rendered view.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no location provider is enabled")]
    ProviderDisabled,

    #[error("location permission permanently denied")]
    PermissionDenied,

    #[error("location permission needs a rationale")]
    PermissionRationale,

    #[error("no network connectivity")]
    NoConnectivity,

    #[error("no location fix within {0:?}")]
    LocationTimeout(Duration),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("pipeline run was cancelled")]
    Cancelled,

    #[error("a pipeline run is already in flight")]
    Busy,
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderDisabled => ErrorCategory::ProviderDisabled,
            Self::PermissionDenied => ErrorCategory::PermissionDeniedPermanently,
            Self::PermissionRationale => ErrorCategory::PermissionRationale,
            Self::NoConnectivity => ErrorCategory::NoConnectivity,
            Self::LocationTimeout(_) => ErrorCategory::LocationTimeout,
            Self::Location(_) => ErrorCategory::LocationUnavailable,
            Self::Weather(e) => e.category(),
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Busy => ErrorCategory::Busy,
        }
    }

    /// User-facing text for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderDisabled => {
                "Your location provider is turned off. Please turn it on.".to_string()
            }
            Self::PermissionDenied => {
                "You have denied location permission. Please allow it, it is mandatory.".to_string()
            }
            Self::PermissionRationale => "Location permission is required to show the weather.".to_string(),
            Self::NoConnectivity => "No internet connection available.".to_string(),
            Self::LocationTimeout(_) => "Could not determine your location in time.".to_string(),
            Self::Location(_) => "Could not determine your location.".to_string(),
            Self::Weather(WeatherError::NotFound { .. }) => {
                "No weather data is available for your location.".to_string()
            }
            Self::Weather(WeatherError::Transport(_)) => {
                "Could not reach the weather service. Check your connection.".to_string()
            }
            Self::Weather(e) => format!("Weather service error ({}).", e.label()),
            Self::Cancelled => "Cancelled.".to_string(),
            Self::Busy => "A weather update is already in progress.".to_string(),
        }
    }

    /// Failures past the permission and connectivity gates. These end the run in
    /// the `Failed` state instead of halting with a notice.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::LocationTimeout(_) | Self::Location(_) | Self::Weather(_)
        )
    }

    /// Whether a refresh has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LocationTimeout(_) | Self::Location(_) | Self::NoConnectivity => true,
            Self::Weather(WeatherError::Transport(_)) => true,
            Self::Weather(WeatherError::Status { status, .. }) => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
