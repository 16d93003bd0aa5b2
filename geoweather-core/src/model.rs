use serde::{Deserialize, Deserializer, Serialize};

/// A single location fix, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Unit system requested from the weather endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub coordinates: Coordinates,
    pub units: Units,
}

impl WeatherRequest {
    /// The pipeline always asks for metric values.
    pub fn metric(coordinates: Coordinates) -> Self {
        Self { coordinates, units: Units::Metric }
    }
}

/// Current weather for one location, as returned by the endpoint.
///
/// `weather` is guaranteed non-empty once deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(deserialize_with = "non_empty_conditions")]
    pub weather: Vec<Condition>,
    pub main: MainMetrics,
    pub wind: Wind,
    pub name: String,
    pub sys: Sys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainMetrics {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: String,
    /// Unix seconds.
    pub sunrise: i64,
    /// Unix seconds.
    pub sunset: i64,
}

fn non_empty_conditions<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Vec::<Condition>::deserialize(deserializer)?;
    if conditions.is_empty() {
        return Err(serde::de::Error::custom("`weather` must contain at least one condition"));
    }
    Ok(conditions)
}
