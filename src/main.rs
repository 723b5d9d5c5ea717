use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use sunshine_core::{AppError, Config};
use sunshine_face::{
    forward_transport_events, DisplayList, DrawCommand, FaceEvent, SystemClock, WatchFaceEngine,
};
use sunshine_sync::{MemoryBus, SyncRelay, Transport};
use sunshine_weather::WeatherFetcher;
use tokio_util::sync::CancellationToken;

/// How long the demo keeps the face on screen
const RUN_FOR: Duration = Duration::from_secs(5);

fn describe(frame: &DisplayList) -> String {
    frame
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[tokio::main]
async fn main() -> Result<()> {
    sunshine_core::init()?;

    let (config, _) = Config::load_validated(std::env::args().nth(1))
        .context("Failed to load configuration")?;

    let bus = MemoryBus::new();
    let (phone, phone_rx) = bus.join("phone", "Phone");
    let (watch, watch_rx) = bus.join("watch", "Watch");
    phone.connect().await.context("phone failed to connect")?;

    let fetcher = WeatherFetcher::new(&config.weather).map_err(AppError::from)?;
    let relay = Arc::new(SyncRelay::new(
        Arc::new(fetcher),
        Arc::new(phone),
        config.weather.location.clone(),
        config.face.icon_size,
    ));
    let cancel = CancellationToken::new();
    let relay_task = tokio::spawn(relay.run(phone_rx, cancel.clone()));

    let (engine, events) =
        WatchFaceEngine::new(&config.face, Arc::new(watch), Arc::new(SystemClock));
    let sender = engine.event_sender();
    let forwarder = forward_transport_events(watch_rx, sender.clone());
    let face_task = tokio::spawn(engine.run(events, |frame| {
        tracing::info!("frame: {}", describe(&frame));
    }));

    tracing::info!("Sunshine started for {}", config.weather.location);
    sender.send(FaceEvent::VisibilityChanged(true))?;

    tokio::select! {
        _ = tokio::time::sleep(RUN_FOR) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    sender.send(FaceEvent::Destroy)?;
    face_task.await?;
    forwarder.abort();
    cancel.cancel();
    relay_task.await?;

    tracing::info!("Sunshine stopped");
    Ok(())
}
