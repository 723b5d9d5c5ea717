//! Weather service for Sunshine
//!
//! Fetches current conditions from OpenWeatherMap, formats the day's high and
//! low for display and renders the matching condition icon.

pub mod format;
pub mod icon;
pub mod provider;
pub mod types;

pub use format::format_temperature;
pub use icon::{decode_png, encode_png, render_icon};
pub use provider::{parse_current_weather, WeatherFetcher, WeatherSource};
pub use types::*;
