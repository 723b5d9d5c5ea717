//! What the face draws, and where the time comes from.

use chrono::{DateTime, FixedOffset, Local, Utc};
use image::RgbaImage;
use std::sync::Arc;
use sunshine_sync::WeatherBundle;

/// Source of wall-clock time and the device's current UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn local_offset(&self) -> FixedOffset;
}

/// The host's real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}

/// Everything the draw routine reads.
///
/// The weather fields only change when the phone sends something; the draw
/// path never waits for them.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub current_time: DateTime<FixedOffset>,
    pub high_temp: Option<String>,
    pub low_temp: Option<String>,
    pub icon: Option<Arc<RgbaImage>>,
    pub ambient: bool,
}

impl RenderState {
    pub fn new(current_time: DateTime<FixedOffset>) -> Self {
        Self {
            current_time,
            high_temp: None,
            low_temp: None,
            icon: None,
            ambient: false,
        }
    }

    pub fn apply_bundle(&mut self, bundle: WeatherBundle) {
        self.high_temp = Some(bundle.max_temp);
        self.low_temp = Some(bundle.low_temp);
    }

    pub fn apply_icon(&mut self, icon: RgbaImage) {
        self.icon = Some(Arc::new(icon));
    }
}
