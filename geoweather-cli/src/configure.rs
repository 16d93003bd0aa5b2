//! Interactive `geoweather configure`.

use std::fmt;

use anyhow::Context;
use geoweather_core::{Config, Coordinates};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceChoice {
    IpLookup,
    Fixed,
    Both,
}

impl fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceChoice::IpLookup => "Detect from IP address",
            SourceChoice::Fixed => "Fixed coordinates",
            SourceChoice::Both => "Fixed coordinates, IP address as fallback",
        })
    }
}

pub fn run() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let source = Select::new(
        "Location source:",
        vec![SourceChoice::IpLookup, SourceChoice::Fixed, SourceChoice::Both],
    )
    .prompt()
    .context("Failed to read location source")?;

    let coordinates = match source {
        SourceChoice::IpLookup => None,
        SourceChoice::Fixed | SourceChoice::Both => Some(prompt_coordinates(&config)?),
    };
    config.location.set_coordinates(coordinates);
    config.location.ip_lookup = source != SourceChoice::Fixed;

    let region = Text::new("Region code for the temperature label (e.g. US):")
        .with_help_message("Leave empty to derive it from the system locale")
        .with_initial_value(config.display.region.as_deref().unwrap_or(""))
        .prompt()
        .context("Failed to read region")?;
    config.display.region = normalize_region(&region);

    if config.location.permission.is_some()
        && Confirm::new("Forget the stored location permission answer?")
            .with_default(false)
            .prompt()
            .context("Failed to read confirmation")?
    {
        config.location.permission = None;
    }

    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn prompt_coordinates(config: &Config) -> anyhow::Result<Coordinates> {
    let current = config.location.coordinates();

    let mut lat = CustomType::<f64>::new("Latitude:")
        .with_error_message("Enter a number between -90 and 90")
        .with_validator(|v: &f64| {
            Ok(if (-90.0..=90.0).contains(v) {
                inquire::validator::Validation::Valid
            } else {
                inquire::validator::Validation::Invalid("Latitude must be within -90..90".into())
            })
        });
    if let Some(c) = current {
        lat = lat.with_default(c.latitude);
    }
    let latitude = lat.prompt().context("Failed to read latitude")?;

    let mut lon = CustomType::<f64>::new("Longitude:")
        .with_error_message("Enter a number between -180 and 180")
        .with_validator(|v: &f64| {
            Ok(if (-180.0..=180.0).contains(v) {
                inquire::validator::Validation::Valid
            } else {
                inquire::validator::Validation::Invalid("Longitude must be within -180..180".into())
            })
        });
    if let Some(c) = current {
        lon = lon.with_default(c.longitude);
    }
    let longitude = lon.prompt().context("Failed to read longitude")?;

    Ok(Coordinates::new(latitude, longitude))
}

fn normalize_region(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_ascii_uppercase()) }
}
