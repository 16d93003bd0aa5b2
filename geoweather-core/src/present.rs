//! Presentation binder: turns a [`WeatherRecord`] into display strings.

use chrono::{DateTime, Local, TimeZone};
use tracing::warn;

use crate::{
    icon::{IconCode, WeatherIcon},
    model::WeatherRecord,
};

/// Regions that display temperatures in Fahrenheit.
pub const IMPERIAL_REGIONS: [&str; 3] = ["US", "LR", "MM"];

pub const CELSIUS: &str = "°C";
pub const FAHRENHEIT: &str = "°F";

/// Temperature suffix for a two-letter region code.
pub fn unit_suffix(region: &str) -> &'static str {
    if IMPERIAL_REGIONS.iter().any(|r| r.eq_ignore_ascii_case(region)) {
        FAHRENHEIT
    } else {
        CELSIUS
    }
}

/// Extract the region from a POSIX locale string such as `en_US.UTF-8` or
/// `my_MM@calendar`.
pub fn region_from_locale(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?;
    let region = base.split(['_', '-']).nth(1)?;

    if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(region.to_ascii_uppercase())
    } else {
        None
    }
}

/// Region of the process locale, following POSIX precedence.
pub fn detect_region() -> Option<String> {
    detect_region_with(|name| std::env::var(name).ok())
}

pub fn detect_region_with(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
        .and_then(|value| region_from_locale(&value))
}

/// `HH:mm` for a Unix timestamp in `tz`.
pub fn format_clock<Tz>(unix_secs: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp(unix_secs, 0)?;
    Some(utc.with_timezone(tz).format("%H:%M").to_string())
}

/// `HH:mm` in the local time zone.
pub fn format_local_clock(unix_secs: i64) -> Option<String> {
    format_clock(unix_secs, &Local)
}

/// Render a float the way the platform prints a double: always with a
/// fractional part.
fn number(value: f64) -> String {
    format!("{value:?}")
}

/// Inputs to binding that come from the device rather than the response.
#[derive(Debug, Clone)]
pub struct DisplayContext {
    pub region: Option<String>,
}

impl DisplayContext {
    pub fn unit(&self) -> &'static str {
        self.region.as_deref().map(unit_suffix).unwrap_or(CELSIUS)
    }
}

/// Current contents of the display fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherView {
    pub main: String,
    pub description: String,
    pub temp: String,
    pub min: String,
    pub max: String,
    pub humidity: String,
    pub wind: String,
    pub name: String,
    pub country: String,
    pub sunrise: String,
    pub sunset: String,
    pub icon: Option<WeatherIcon>,
}

impl WeatherView {
    /// Bind every condition entry in order; later entries overwrite earlier
    /// ones. The icon only changes for known codes.
    pub fn bind(&mut self, record: &WeatherRecord, ctx: &DisplayContext) {
        self.bind_with_clock(record, ctx, format_local_clock)
    }

    pub fn bind_with_clock(
        &mut self,
        record: &WeatherRecord,
        ctx: &DisplayContext,
        clock: impl Fn(i64) -> Option<String>,
    ) {
        let unit = ctx.unit();

        for condition in &record.weather {
            self.main = condition.main.clone();
            self.description = condition.description.clone();
            self.temp = format!("{}{unit}", number(record.main.temp));
            self.humidity = format!("{} per cent", record.main.humidity);
            self.min = format!("{} min", number(record.main.temp_min));
            self.max = format!("{} max", number(record.main.temp_max));
            self.wind = number(record.wind.speed);
            self.name = record.name.clone();
            self.country = record.sys.country.clone();
            self.sunrise = clock(record.sys.sunrise).unwrap_or_default();
            self.sunset = clock(record.sys.sunset).unwrap_or_default();

            match IconCode::parse(&condition.icon) {
                IconCode::Unknown(code) => {
                    warn!(%code, "unknown icon code, keeping current icon");
                }
                known => {
                    if let Some(icon) = known.icon() {
                        self.icon = Some(icon);
                    }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
