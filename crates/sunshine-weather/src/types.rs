use serde::{Deserialize, Serialize};
use sunshine_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};

/// Today's conditions, reduced to what the watch face shows.
///
/// Built once from a provider response and never modified; temperatures are
/// already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub condition_id: i32,
    /// Short condition group, e.g. "Clear" or "Rain"
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub high_temperature: String,
    pub low_temperature: String,
}

impl WeatherSummary {
    pub fn art(&self) -> Option<WeatherArt> {
        WeatherArt::from_condition_id(self.condition_id)
    }
}

/// Icon artwork for a provider condition id.
/// See: https://openweathermap.org/weather-conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherArt {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Clouds,
}

impl WeatherArt {
    /// Map an OpenWeatherMap condition id to artwork.
    ///
    /// Ranges are checked in order, so 761 (dust) lands on fog before the
    /// storm check for 781 (tornado). Unknown ids have no artwork.
    pub fn from_condition_id(id: i32) -> Option<Self> {
        match id {
            200..=232 => Some(Self::Storm),
            300..=321 => Some(Self::LightRain),
            500..=504 => Some(Self::Rain),
            511 => Some(Self::Snow),
            520..=531 => Some(Self::Rain),
            600..=622 => Some(Self::Snow),
            701..=761 => Some(Self::Fog),
            781 => Some(Self::Storm),
            800 => Some(Self::Clear),
            801 => Some(Self::LightClouds),
            802..=804 => Some(Self::Clouds),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Storm => "storm",
            Self::LightRain => "light_rain",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Clear => "clear",
            Self::LightClouds => "light_clouds",
            Self::Clouds => "clouds",
        }
    }
}

/// Weather fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location not found: {0}")]
    NotFound(String),
    #[error("Provider returned status {code}: {message}")]
    Provider { code: i64, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(e) => AppError::Network(e.into_network_error()),
            FetchError::NotFound(location) => {
                AppError::Weather(WeatherError::LocationNotFound(location))
            }
            FetchError::Provider { code: 401, .. } => AppError::Weather(WeatherError::InvalidApiKey),
            FetchError::Provider { code, message } => {
                AppError::Weather(WeatherError::ApiError(format!("{}: {}", code, message)))
            }
            FetchError::Parse(msg) => AppError::Weather(WeatherError::Malformed(msg)),
            FetchError::InvalidEndpoint(msg) => {
                AppError::Network(NetworkError::InvalidResponse(msg))
            }
        }
    }
}
