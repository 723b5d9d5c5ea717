//! Wearable-side lifecycle: visibility, ambient mode, inbound weather and
//! redraw scheduling.
//!
//! All host callbacks funnel into [`FaceEvent`]s handled on one task, so
//! the render state is only ever touched from [`WatchFaceEngine::handle`]
//! and the `on_*` methods it dispatches to.

use chrono::FixedOffset;
use embedded_graphics::geometry::Size;
use std::sync::Arc;
use std::time::Duration;
use sunshine_core::{AppError, FaceConfig};
use sunshine_sync::{
    path_matches, Transport, TransportEvent, WeatherBundle, ICON_ASSET_KEY, ICON_PATH,
    WEATHER_UPDATE_PATH,
};
use sunshine_weather::decode_png;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::FaceError;
use crate::render::{render, DisplayList, FaceLayout};
use crate::state::{Clock, RenderState};
use crate::timer::{RedrawTimer, AMBIENT_PERIOD, INTERACTIVE_PERIOD};

#[derive(Debug, Clone)]
pub enum FaceEvent {
    Tick,
    VisibilityChanged(bool),
    AmbientModeChanged(bool),
    PropertiesChanged { low_bit_ambient: bool },
    TimeZoneChanged(FixedOffset),
    Transport(TransportEvent),
    Destroy,
}

pub struct WatchFaceEngine {
    state: RenderState,
    layout: FaceLayout,
    bounds: Size,
    low_bit_ambient: bool,
    visible: bool,
    time_zone: FixedOffset,
    time_zone_listener: bool,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    timer: Option<RedrawTimer>,
    events: mpsc::UnboundedSender<FaceEvent>,
}

impl WatchFaceEngine {
    pub fn new(
        config: &FaceConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<FaceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let time_zone = clock.local_offset();
        let state = RenderState::new(clock.now().with_timezone(&time_zone));

        let engine = Self {
            state,
            layout: FaceLayout::from(config),
            bounds: Size::new(config.width, config.height),
            low_bit_ambient: config.low_bit_ambient,
            visible: false,
            time_zone,
            time_zone_listener: false,
            transport,
            clock,
            timer: None,
            events,
        };
        (engine, rx)
    }

    /// Sender for feeding host callbacks into [`WatchFaceEngine::run`]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<FaceEvent> {
        self.events.clone()
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn low_bit_ambient(&self) -> bool {
        self.low_bit_ambient
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Redraw period, or `None` while the timer should be stopped.
    pub fn cadence(&self) -> Option<Duration> {
        if !self.visible {
            None
        } else if self.state.ambient {
            Some(AMBIENT_PERIOD)
        } else {
            Some(INTERACTIVE_PERIOD)
        }
    }

    pub fn timer_period(&self) -> Option<Duration> {
        self.timer.as_ref().map(RedrawTimer::period)
    }

    /// Apply one event; returns a frame when the face needs repainting.
    pub async fn handle(&mut self, event: FaceEvent) -> Option<DisplayList> {
        let invalidated = match event {
            FaceEvent::Tick => true,
            FaceEvent::VisibilityChanged(visible) => {
                self.on_visibility_changed(visible).await && visible
            }
            FaceEvent::AmbientModeChanged(ambient) => self.on_ambient_mode_changed(ambient).await,
            FaceEvent::PropertiesChanged { low_bit_ambient } => {
                self.on_properties_changed(low_bit_ambient);
                false
            }
            FaceEvent::TimeZoneChanged(offset) => self.on_time_zone_changed(offset),
            FaceEvent::Transport(event) => match self.on_transport_event(&event) {
                Ok(changed) => changed,
                Err(e) => {
                    let app_err = AppError::from(e);
                    warn!("Ignoring payload from phone: {}", app_err);
                    false
                }
            },
            FaceEvent::Destroy => {
                self.on_destroy().await;
                false
            }
        };

        if invalidated && self.visible {
            Some(self.on_draw())
        } else {
            None
        }
    }

    /// Drive the engine until [`FaceEvent::Destroy`], handing every frame
    /// to `present`.
    pub async fn run<F>(mut self, mut events: mpsc::UnboundedReceiver<FaceEvent>, mut present: F)
    where
        F: FnMut(DisplayList) + Send,
    {
        while let Some(event) = events.recv().await {
            let destroy = matches!(event, FaceEvent::Destroy);
            if let Some(frame) = self.handle(event).await {
                present(frame);
            }
            if destroy {
                break;
            }
        }
        debug!("Watch face engine stopped");
    }

    /// Returns whether visibility actually changed.
    #[instrument(skip(self))]
    pub async fn on_visibility_changed(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;

        if visible {
            self.time_zone_listener = true;
            self.time_zone = self.clock.local_offset();
            if let Err(e) = self.transport.connect().await {
                warn!("Failed to connect to phone: {}", e);
            }
            self.request_weather().await;
        } else {
            self.time_zone_listener = false;
            if self.transport.is_connected() {
                if let Err(e) = self.transport.disconnect().await {
                    warn!("Failed to disconnect from phone: {}", e);
                }
            }
        }

        self.update_timer();
        true
    }

    /// Returns whether the mode actually changed.
    #[instrument(skip(self))]
    pub async fn on_ambient_mode_changed(&mut self, ambient: bool) -> bool {
        if self.state.ambient == ambient {
            return false;
        }
        self.state.ambient = ambient;
        self.update_timer();

        if !ambient {
            self.request_weather().await;
        }
        true
    }

    pub fn on_properties_changed(&mut self, low_bit_ambient: bool) {
        debug!("Low-bit ambient: {}", low_bit_ambient);
        self.low_bit_ambient = low_bit_ambient;
    }

    /// Only honoured while the face is visible.
    pub fn on_time_zone_changed(&mut self, offset: FixedOffset) -> bool {
        if !self.time_zone_listener {
            return false;
        }
        info!("Time zone changed to {}", offset);
        self.time_zone = offset;
        true
    }

    /// Apply a bundle or icon from the phone. Returns whether the render
    /// state changed.
    pub fn on_transport_event(&mut self, event: &TransportEvent) -> Result<bool, FaceError> {
        match event {
            TransportEvent::Message { path, payload, .. }
                if path_matches(path, WEATHER_UPDATE_PATH) =>
            {
                if payload.is_empty() {
                    return Ok(false);
                }
                let bundle = WeatherBundle::from_bytes(payload)?;
                debug!("Weather from phone: {} / {}", bundle.max_temp, bundle.low_temp);
                self.state.apply_bundle(bundle);
                Ok(true)
            }
            TransportEvent::DataChanged { item, .. } if path_matches(&item.path, ICON_PATH) => {
                let bytes = item
                    .assets
                    .get(ICON_ASSET_KEY)
                    .ok_or_else(|| FaceError::MissingAsset(ICON_ASSET_KEY.to_string()))?;
                let icon = decode_png(bytes)?;
                debug!("Weather icon from phone: {:?}", icon.dimensions());
                self.state.apply_icon(icon);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Refresh the clock and build a frame from cached state.
    pub fn on_draw(&mut self) -> DisplayList {
        self.state.current_time = self.clock.now().with_timezone(&self.time_zone);
        render(&self.state, &self.layout, self.low_bit_ambient, self.bounds)
    }

    pub async fn on_destroy(&mut self) {
        self.timer = None;
        self.time_zone_listener = false;
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Failed to disconnect from phone: {}", e);
            }
        }
        self.visible = false;
    }

    fn update_timer(&mut self) {
        match self.cadence() {
            Some(period) => {
                self.timer = Some(RedrawTimer::start(
                    period,
                    Arc::clone(&self.clock),
                    self.events.clone(),
                ));
            }
            None => self.timer = None,
        }
    }

    /// Ask every connected phone for fresh weather. Returns how many
    /// requests went out.
    async fn request_weather(&self) -> usize {
        if !self.transport.is_connected() {
            debug!("Not connected; skipping weather request");
            return 0;
        }

        let nodes = match self.transport.connected_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Could not list phones: {}", e);
                return 0;
            }
        };

        let mut sent = 0;
        for node in &nodes {
            match self
                .transport
                .send_message(&node.id, WEATHER_UPDATE_PATH, Vec::new())
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => warn!("Weather request to {} failed: {}", node.id, e),
            }
        }
        debug!("Requested weather from {} node(s)", sent);
        sent
    }
}

/// Forward inbound transport events into the engine's event channel.
pub fn forward_transport_events(
    mut inbound: mpsc::UnboundedReceiver<TransportEvent>,
    events: mpsc::UnboundedSender<FaceEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = inbound.recv().await {
            if events.send(FaceEvent::Transport(event)).is_err() {
                break;
            }
        }
    })
}
