//! Terminal implementations of the display-side platform traits.

use std::io::Write;

use async_trait::async_trait;
use geoweather_core::{
    ProgressIndicator, RationaleChoice, Screen, SettingsNavigator, WeatherView,
};
use inquire::Select;
use tracing::warn;

const PROGRESS_TEXT: &str = "Fetching weather...";

#[derive(Debug)]
pub struct TerminalScreen {
    retry_hint: String,
}

impl TerminalScreen {
    pub fn new(retry_hint: &str) -> Self {
        Self { retry_hint: retry_hint.to_string() }
    }
}

pub fn format_view(view: &WeatherView) -> String {
    let glyph = view.icon.map(|i| i.glyph()).unwrap_or(" ");
    let place = match (view.name.is_empty(), view.country.is_empty()) {
        (false, false) => format!("{}, {}", view.name, view.country),
        (false, true) => view.name.clone(),
        _ => view.country.clone(),
    };

    [
        format!("{glyph}  {} ({})", view.main, view.description),
        format!("   {place}"),
        format!("   Temperature  {}  ({} / {})", view.temp, view.min, view.max),
        format!("   Humidity     {}", view.humidity),
        format!("   Wind         {} m/s", view.wind),
        format!("   Sunrise      {}    Sunset {}", view.sunrise, view.sunset),
    ]
    .join("\n")
}

#[async_trait]
impl Screen for TerminalScreen {
    fn notice(&self, message: &str) {
        eprintln!("{message}");
    }

    fn render(&self, view: &WeatherView) {
        println!("{}", format_view(view));
    }

    fn show_error(&self, message: &str, retryable: bool) {
        if retryable {
            eprintln!("error: {message} {}", self.retry_hint);
        } else {
            eprintln!("error: {message}");
        }
    }

    async fn ask_rationale(&self, message: &str) -> RationaleChoice {
        let message = message.to_string();
        let choice = tokio::task::spawn_blocking(move || {
            Select::new(&message, vec!["Go to settings", "Cancel"]).prompt()
        })
        .await;

        match choice {
            Ok(Ok("Go to settings")) => RationaleChoice::OpenSettings,
            Ok(Ok(_)) => RationaleChoice::Cancel,
            Ok(Err(e)) => {
                warn!(error = %e, "rationale prompt failed");
                RationaleChoice::Cancel
            }
            Err(e) => {
                warn!(error = %e, "rationale prompt task failed");
                RationaleChoice::Cancel
            }
        }
    }
}

/// Single status line on stderr.
#[derive(Debug)]
pub struct TerminalProgress;

impl ProgressIndicator for TerminalProgress {
    fn show(&self) {
        let mut err = std::io::stderr();
        let _ = write!(err, "{PROGRESS_TEXT}");
        let _ = err.flush();
    }

    fn hide(&self) {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r{}\r", " ".repeat(PROGRESS_TEXT.len()));
        let _ = err.flush();
    }
}

/// There is no settings app on a terminal; point at the config file instead.
#[derive(Debug)]
pub struct TerminalSettings {
    config_path: String,
}

impl TerminalSettings {
    pub fn new(config_path: String) -> Self {
        Self { config_path }
    }
}

impl SettingsNavigator for TerminalSettings {
    fn open_location_settings(&self) -> anyhow::Result<()> {
        eprintln!(
            "Enable a location source in {}: set [location] latitude and longitude, \
             or ip_lookup = true. `geoweather configure` does this interactively.",
            self.config_path
        );
        Ok(())
    }

    fn open_app_settings(&self, uri: &str) -> anyhow::Result<()> {
        eprintln!(
            "Location permission for {uri} is stored in {} under [location] permission. \
             Run `geoweather configure` to change it.",
            self.config_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoweather_core::WeatherIcon;

    #[test]
    fn formats_rendered_view() {
        let view = WeatherView {
            main: "Clear".into(),
            description: "clear sky".into(),
            temp: "21.5°C".into(),
            min: "19.0 min".into(),
            max: "23.0 max".into(),
            humidity: "40 per cent".into(),
            wind: "3.6".into(),
            name: "Paris".into(),
            country: "FR".into(),
            sunrise: "07:13".into(),
            sunset: "16:20".into(),
            icon: Some(WeatherIcon::Sunny),
        };

        let out = format_view(&view);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "☀  Clear (clear sky)");
        assert_eq!(lines[1], "   Paris, FR");
        assert!(lines[2].contains("21.5°C"));
        assert!(lines[2].contains("19.0 min / 23.0 max"));
        assert!(lines[3].ends_with("40 per cent"));
        assert!(lines[5].contains("07:13") && lines[5].contains("16:20"));
    }

    #[test]
    fn missing_icon_renders_blank_glyph() {
        let view = WeatherView { main: "Mist".into(), name: "Oslo".into(), ..WeatherView::default() };
        let out = format_view(&view);
        assert!(out.starts_with("   Mist"));
        assert!(out.contains("   Oslo\n"));
    }
}
