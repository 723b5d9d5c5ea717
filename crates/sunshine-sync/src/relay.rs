//! Phone-side weather relay.
//!
//! Answers refresh requests from wearables: fetch the weather, then push
//! the temperature bundle to each connected peer and publish the condition
//! icon as a data item. A failed fetch sends nothing at all.

use futures::future::join_all;
use std::sync::Arc;
use sunshine_core::AppError;
use sunshine_weather::{encode_png, render_icon, FetchError, WeatherSource, WeatherSummary};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bundle::{icon_data_item, WeatherBundle};
use crate::transport::{
    path_matches, NodeId, Transport, TransportError, TransportEvent, WEATHER_UPDATE_PATH,
};

/// Outcome of one relay pass
#[derive(Debug, Default)]
pub struct RelayReport {
    pub delivered: Vec<NodeId>,
    pub failed: Vec<(NodeId, TransportError)>,
    pub icon_pushed: bool,
}

pub struct SyncRelay {
    source: Arc<dyn WeatherSource>,
    transport: Arc<dyn Transport>,
    location: String,
    icon_size: u32,
}

impl SyncRelay {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        transport: Arc<dyn Transport>,
        location: impl Into<String>,
        icon_size: u32,
    ) -> Self {
        Self {
            source,
            transport,
            location: location.into(),
            icon_size,
        }
    }

    /// Handle an inbound transport event.
    ///
    /// Only weather-update messages start a refresh; everything else is
    /// ignored and yields `None`.
    pub fn on_message(
        self: &Arc<Self>,
        event: &TransportEvent,
    ) -> Option<JoinHandle<Option<RelayReport>>> {
        match event {
            TransportEvent::Message { source, path, .. }
                if path_matches(path, WEATHER_UPDATE_PATH) =>
            {
                tracing::info!("Weather update requested by {}", source);
                Some(self.on_weather_request(None))
            }
            TransportEvent::Message { path, .. } => {
                tracing::debug!("Ignoring message on {}", path);
                None
            }
            TransportEvent::DataChanged { item, .. } => {
                tracing::debug!("Ignoring data change on {}", item.path);
                None
            }
        }
    }

    /// Start a fetch-and-relay in the background.
    ///
    /// Uses `location` when given, otherwise the configured one. Concurrent
    /// requests are not merged; each runs its own fetch.
    pub fn on_weather_request(
        self: &Arc<Self>,
        location: Option<String>,
    ) -> JoinHandle<Option<RelayReport>> {
        let relay = Arc::clone(self);
        let location = location.unwrap_or_else(|| self.location.clone());

        tokio::spawn(async move {
            match relay.refresh(&location).await {
                Ok(report) => Some(report),
                Err(e) => {
                    let app_err = AppError::from(e);
                    tracing::warn!(
                        "Weather fetch for {} failed, nothing relayed: {} ({})",
                        location,
                        app_err,
                        app_err.user_message()
                    );
                    None
                }
            }
        })
    }

    /// Fetch, then relay on success
    pub async fn refresh(&self, location: &str) -> Result<RelayReport, FetchError> {
        let summary = self.source.fetch(location).await?;
        Ok(self.relay(&summary).await)
    }

    /// Push `summary` to every connected peer.
    ///
    /// Connects first when needed. If the peers can't be listed nothing is
    /// relayed, not even the icon.
    pub async fn relay(&self, summary: &WeatherSummary) -> RelayReport {
        let mut report = RelayReport::default();

        if !self.transport.is_connected() {
            if let Err(e) = self.transport.connect().await {
                tracing::warn!("Could not connect, nothing relayed: {}", e);
                return report;
            }
        }

        match WeatherBundle::from(summary).to_bytes() {
            Ok(payload) => {
                if !self.send_to_peers(payload, &mut report).await {
                    return report;
                }
            }
            Err(e) => tracing::warn!("Could not encode weather bundle: {}", e),
        }

        report.icon_pushed = self.push_icon(summary).await;

        tracing::info!(
            "Relayed weather {} / {} to {} peer(s), {} failed",
            summary.high_temperature,
            summary.low_temperature,
            report.delivered.len(),
            report.failed.len()
        );
        report
    }

    /// Returns false when the peers could not be listed
    async fn send_to_peers(&self, payload: Vec<u8>, report: &mut RelayReport) -> bool {
        let nodes = match self.transport.connected_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!("Could not list connected peers: {}", e);
                return false;
            }
        };

        let sends = nodes.into_iter().map(|node| {
            let payload = payload.clone();
            async move {
                let result = self
                    .transport
                    .send_message(&node.id, WEATHER_UPDATE_PATH, payload)
                    .await;
                (node.id, result)
            }
        });

        for (node, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    tracing::debug!("Weather sent to {}", node);
                    report.delivered.push(node);
                }
                Err(e) => {
                    tracing::warn!("Weather send to {} failed: {}", node, e);
                    report.failed.push((node, e));
                }
            }
        }
        true
    }

    async fn push_icon(&self, summary: &WeatherSummary) -> bool {
        let Some(art) = summary.art() else {
            tracing::debug!("No artwork for condition {}", summary.condition_id);
            return false;
        };

        let png = match encode_png(&render_icon(art, self.icon_size)) {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!("Could not encode {} icon: {}", art.name(), e);
                return false;
            }
        };

        match self.transport.put_data_item(icon_data_item(png)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not publish weather icon: {}", e);
                false
            }
        }
    }

    /// Serve inbound transport events until the channel closes or `cancel`
    /// fires. Fetches already in flight are left to finish.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Relay stopped");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.on_message(&event);
                    }
                    None => {
                        tracing::info!("Relay event stream closed");
                        break;
                    }
                },
            }
        }
    }
}
