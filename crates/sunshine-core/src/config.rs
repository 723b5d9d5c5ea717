use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_WEATHER_ENDPOINT: &str = "http://api.openweathermap.org/data/2.5/weather";
const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather provider settings (phone side)
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Watch face settings (wearable side)
    #[serde(default)]
    pub face: FaceConfig,
}

/// Unit system requested from the provider (`units` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestUnits {
    #[default]
    Metric,
    Imperial,
    /// Kelvin
    Standard,
}

impl RequestUnits {
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }
}

/// Temperature unit preference for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Show values in whatever unit the provider returned
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Location query sent as `q` (city name or postal code)
    pub location: String,

    #[serde(default)]
    pub units: RequestUnits,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Provider endpoint for current conditions
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OpenWeatherMap `appid`; falls back to the environment
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds, 0 disables it
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_WEATHER_ENDPOINT.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: "94043".to_string(),
            units: RequestUnits::Metric,
            temperature_unit: TemperatureUnit::Auto,
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: 0,
        }
    }
}

impl WeatherConfig {
    /// API key from the config file or, failing that, `OPENWEATHER_API_KEY`
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceConfig {
    #[serde(default = "default_face_size")]
    pub width: u32,
    #[serde(default = "default_face_size")]
    pub height: u32,

    /// Display has fewer bits per color in ambient mode
    #[serde(default)]
    pub low_bit_ambient: bool,

    /// Edge length of the relayed condition icon, in pixels
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,

    /// Baseline of the time row
    #[serde(default = "default_y_offset")]
    pub y_offset: i32,

    #[serde(default = "default_line_height")]
    pub line_height: i32,

    /// Length of the separator under the date
    #[serde(default = "default_line_width")]
    pub line_width: i32,
}

fn default_face_size() -> u32 {
    320
}

fn default_icon_size() -> u32 {
    40
}

fn default_y_offset() -> i32 {
    80
}

fn default_line_height() -> i32 {
    20
}

fn default_line_width() -> i32 {
    80
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            width: default_face_size(),
            height: default_face_size(),
            low_bit_ambient: false,
            icon_size: default_icon_size(),
            y_offset: default_y_offset(),
            line_height: default_line_height(),
            line_width: default_line_width(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, creating a default file if
    /// it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from the user config directory, apply an optional
    /// location override and validate it
    ///
    /// A default file is created if none exists. Warnings are logged; any
    /// error fails the load.
    pub fn load_validated(location: Option<String>) -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path, location)
    }

    pub fn load_validated_from(
        config_path: &Path,
        location: Option<String>,
    ) -> Result<(Self, ValidationResult)> {
        let mut config = Self::load_from(config_path)?;
        if let Some(location) = location {
            config.weather.location = location;
        }
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.location.trim().is_empty() {
            result.add_error("weather.location", "Location must not be empty");
        }

        if self.weather.effective_api_key().is_none() {
            result.add_warning(
                "weather.api_key",
                "No API key configured - the provider may reject requests",
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_warning(
                "weather.timeout_secs",
                "No request timeout - a stalled provider blocks that refresh indefinitely",
            );
        }

        if self.face.width == 0 {
            result.add_error("face.width", "Face width must be greater than 0");
        }

        if self.face.height == 0 {
            result.add_error("face.height", "Face height must be greater than 0");
        }

        if self.face.icon_size == 0 {
            result.add_error("face.icon_size", "Icon size must be greater than 0");
        } else if self.face.icon_size > 256 {
            result.add_warning("face.icon_size", "Icon is unusually large (>256 px)");
        }

        if self.face.line_height <= 0 {
            result.add_error("face.line_height", "Line height must be positive");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sunshine");

        Ok(config_dir.join("config.toml"))
    }
}
