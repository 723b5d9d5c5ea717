pub mod config;
pub mod error;

pub use config::{
    Config, ValidationResult, FaceConfig, RequestUnits, TemperatureUnit, WeatherConfig,
};
pub use error::{
    AppError, NetworkError, ReqwestErrorExt, TransportFailure, WeatherError,
};

use anyhow::Result;

/// Initialize logging for a Sunshine process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Sunshine core initialized");
    Ok(())
}
