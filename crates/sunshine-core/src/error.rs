//! Centralized error types for the Sunshine processes.
//!
//! Crate-specific errors (`FetchError` in `sunshine-weather`, inbound payload
//! errors in `sunshine-face`) convert into [`AppError`] so the binary can log a
//! short, user-facing summary next to the detailed cause.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for a status line.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a short message suitable for display on the phone or watch.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Transport(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Weather provider errors, as seen by the application.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
            WeatherError::Malformed(_) => "Weather service sent unexpected data.",
        }
    }
}

/// Device transport failures, as seen by the application.
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("Not connected to the device network")]
    NotConnected,

    #[error("Peer {0} is unreachable")]
    PeerUnreachable(String),

    #[error("Payload rejected: {0}")]
    Rejected(String),
}

impl TransportFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            TransportFailure::NotConnected => "Watch is not connected.",
            TransportFailure::PeerUnreachable(_) => "Watch could not be reached.",
            TransportFailure::Rejected(_) => "Watch rejected the weather update.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
