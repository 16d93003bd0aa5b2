use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::{
    error::WeatherError,
    model::{WeatherRecord, WeatherRequest},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self), fields(lat = request.coordinates.latitude, lon = request.coordinates.longitude))]
    async fn fetch_current(&self, request: &WeatherRequest) -> Result<WeatherRecord, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", request.coordinates.latitude.to_string()),
                ("lon", request.coordinates.longitude.to_string()),
                ("units", request.units.as_str().to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "OpenWeather request did not complete");
                WeatherError::Transport(e)
            })?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Transport)?;

        if !status.is_success() {
            let err = WeatherError::from_status(status.as_u16(), truncate_body(&body));
            error!(status = status.as_u16(), "{}", err.label());
            return Err(err);
        }

        let record: WeatherRecord = serde_json::from_str(&body).map_err(|e| {
            let err = WeatherError::Decode(e);
            error!(error = %err, "{}", err.label());
            err
        })?;

        debug!(location = %record.name, conditions = record.weather.len(), "weather received");
        Ok(record)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherRecord, WeatherError> {
        self.fetch_current(request).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let p = OpenWeatherProvider::new("k".into(), "http://localhost:1/data/2.5/", Duration::from_secs(1))
            .expect("client should build");
        assert_eq!(p.base_url(), "http://localhost:1/data/2.5");
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("{\"cod\":404}"), "{\"cod\":404}");
    }
}
