//! OpenWeatherMap current-conditions client.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use sunshine_core::{RequestUnits, TemperatureUnit, WeatherConfig};
use tracing::instrument;

use crate::format::format_temperature;
use crate::types::{FetchError, WeatherSummary};

/// Anything that can produce a [`WeatherSummary`] for a location query.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, location_query: &str) -> Result<WeatherSummary, FetchError>;
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    coord: Option<Coord>,
    weather: Vec<Condition>,
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    id: i32,
    #[serde(default)]
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    units: RequestUnits,
    display: TemperatureUnit,
}

impl WeatherFetcher {
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            api_key: config.effective_api_key(),
            units: config.units,
            display: config.temperature_unit,
        })
    }

    /// Build the request URL for a location query.
    pub fn request_url(&self, location_query: &str) -> Result<Url, FetchError> {
        let mut params = vec![
            ("q", location_query.to_string()),
            ("mode", "json".to_string()),
            ("units", self.units.as_query().to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("appid", key.clone()));
        }

        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| FetchError::InvalidEndpoint(format!("{}: {}", self.base_url, e)))
    }
}

#[async_trait]
impl WeatherSource for WeatherFetcher {
    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, location_query: &str) -> Result<WeatherSummary, FetchError> {
        let url = self.request_url(location_query)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("Provider answered {} ({} bytes)", status, body.len());

        match parse_current_weather(&body, self.units, self.display) {
            // Error pages without a `cod` field still need a provider error
            Err(FetchError::Parse(_)) if !status.is_success() => Err(FetchError::Provider {
                code: i64::from(status.as_u16()),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }),
            Err(FetchError::NotFound(_)) => Err(FetchError::NotFound(location_query.to_string())),
            other => other,
        }
    }
}

/// Parse a current-conditions response body into a summary.
///
/// A `cod` field other than 200 short-circuits before any other field is
/// read, so a failed lookup never yields partial data.
pub fn parse_current_weather(
    body: &str,
    units: RequestUnits,
    display: TemperatureUnit,
) -> Result<WeatherSummary, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(format!("invalid JSON: {}", e)))?;

    check_status(&value)?;

    let response: CurrentResponse = serde_json::from_value(value)
        .map_err(|e| FetchError::Parse(format!("unexpected response shape: {}", e)))?;

    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse("empty weather array".to_string()))?;

    Ok(WeatherSummary {
        condition_id: condition.id,
        description: condition.main,
        latitude: response.coord.as_ref().map(|c| c.lat),
        longitude: response.coord.as_ref().map(|c| c.lon),
        high_temperature: format_temperature(response.main.temp_max, units, display),
        low_temperature: format_temperature(response.main.temp_min, units, display),
    })
}

/// `cod` is a number on success and a string on most errors.
fn check_status(value: &Value) -> Result<(), FetchError> {
    let code = match value.get("cod") {
        None => return Ok(()),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| FetchError::Parse("status code is not numeric".to_string()))?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match code {
        200 => Ok(()),
        404 => Err(FetchError::NotFound(message)),
        _ => Err(FetchError::Provider { code, message }),
    }
}
