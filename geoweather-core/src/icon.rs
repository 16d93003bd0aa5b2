//! Mapping from OpenWeather icon codes to bundled image assets.

/// Bundled image assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sunny,
    Cloud,
    Rain,
    Storm,
    Snowflake,
}

impl WeatherIcon {
    pub fn asset_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloud => "cloud",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Snowflake => "snowflake",
        }
    }

    /// Single-character rendering for terminals.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Cloud => "☁",
            Self::Rain => "☂",
            Self::Storm => "⚡",
            Self::Snowflake => "❄",
        }
    }
}

/// An icon code as sent by the endpoint: `<2-digit condition><d|n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconCode {
    ClearDay,
    ClearNight,
    FewCloudsDay,
    FewCloudsNight,
    ScatteredCloudsDay,
    ScatteredCloudsNight,
    BrokenCloudsDay,
    BrokenCloudsNight,
    RainDay,
    RainNight,
    ThunderstormDay,
    ThunderstormNight,
    SnowDay,
    SnowNight,
    Unknown(String),
}

impl IconCode {
    pub const KNOWN: [&'static str; 14] = [
        "01d", "01n", "02d", "02n", "03d", "03n", "04d", "04n", "10d", "10n", "11d", "11n", "13d",
        "13n",
    ];

    pub fn parse(code: &str) -> Self {
        match code {
            "01d" => Self::ClearDay,
            "01n" => Self::ClearNight,
            "02d" => Self::FewCloudsDay,
            "02n" => Self::FewCloudsNight,
            "03d" => Self::ScatteredCloudsDay,
            "03n" => Self::ScatteredCloudsNight,
            "04d" => Self::BrokenCloudsDay,
            "04n" => Self::BrokenCloudsNight,
            "10d" => Self::RainDay,
            "10n" => Self::RainNight,
            "11d" => Self::ThunderstormDay,
            "11n" => Self::ThunderstormNight,
            "13d" => Self::SnowDay,
            "13n" => Self::SnowNight,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Asset for this code; `None` for unknown codes, which keep whatever is
    /// currently displayed.
    ///
    /// Night codes do not follow their day counterparts: 01n and 10n are a
    /// cloud, 11n is rain.
    pub fn icon(&self) -> Option<WeatherIcon> {
        match self {
            Self::ClearDay => Some(WeatherIcon::Sunny),
            Self::ClearNight
            | Self::FewCloudsDay
            | Self::FewCloudsNight
            | Self::ScatteredCloudsDay
            | Self::ScatteredCloudsNight
            | Self::BrokenCloudsDay
            | Self::BrokenCloudsNight
            | Self::RainNight => Some(WeatherIcon::Cloud),
            Self::RainDay | Self::ThunderstormNight => Some(WeatherIcon::Rain),
            Self::ThunderstormDay => Some(WeatherIcon::Storm),
            Self::SnowDay | Self::SnowNight => Some(WeatherIcon::Snowflake),
            Self::Unknown(_) => None,
        }
    }
}
