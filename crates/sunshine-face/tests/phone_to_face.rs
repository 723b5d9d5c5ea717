//! Watch face and phone relay talking over the in-process bus, with the
//! weather provider mocked by wiremock.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use sunshine_core::{FaceConfig, WeatherConfig};
use sunshine_face::{
    forward_transport_events, Clock, DisplayList, DrawCommand, FaceEvent, WatchFaceEngine,
};
use sunshine_sync::{MemoryBus, SyncRelay, Transport};
use sunshine_weather::WeatherFetcher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEATHER_PATH: &str = "/data/2.5/weather";

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 3, 18, 5, 0).unwrap()
    }

    fn local_offset(&self) -> FixedOffset {
        FixedOffset::west_opt(8 * 3600).unwrap()
    }
}

fn texts(frame: &DisplayList) -> Vec<String> {
    frame
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn has_icon(frame: &DisplayList) -> bool {
    frame
        .iter()
        .any(|c| matches!(c, DrawCommand::Bitmap { image, .. } if image.dimensions() == (40, 40)))
}

async fn mock_provider(condition_id: i32) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", "Mountain View"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": 200,
            "weather": [{"id": condition_id, "main": "Clear"}],
            "main": {"temp_max": 24.6, "temp_min": 15.5}
        })))
        .mount(&server)
        .await;
    server
}

struct Running {
    bus: MemoryBus,
    face: mpsc::UnboundedSender<FaceEvent>,
    frames: mpsc::UnboundedReceiver<DisplayList>,
}

async fn start(server: &MockServer) -> Running {
    let config = WeatherConfig {
        location: "Mountain View".to_string(),
        base_url: format!("{}{}", server.uri(), WEATHER_PATH),
        api_key: Some("test-key".to_string()),
        ..WeatherConfig::default()
    };

    let bus = MemoryBus::new();
    let (phone, phone_rx) = bus.join("phone", "Phone");
    let (watch, watch_rx) = bus.join("watch", "Watch");
    phone.connect().await.unwrap();

    let relay = Arc::new(SyncRelay::new(
        Arc::new(WeatherFetcher::new(&config).unwrap()),
        Arc::new(phone),
        config.location.clone(),
        40,
    ));
    tokio::spawn(relay.run(phone_rx, CancellationToken::new()));

    let (engine, events) =
        WatchFaceEngine::new(&FaceConfig::default(), Arc::new(watch), Arc::new(FixedClock));
    let face = engine.event_sender();
    forward_transport_events(watch_rx, face.clone());

    let (frame_tx, frames) = mpsc::unbounded_channel();
    tokio::spawn(engine.run(events, move |frame| {
        let _ = frame_tx.send(frame);
    }));

    Running { bus, face, frames }
}

async fn wait_for<F>(frames: &mut mpsc::UnboundedReceiver<DisplayList>, done: F) -> DisplayList
where
    F: Fn(&DisplayList) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = frames.recv().await.unwrap();
            if done(&frame) {
                return frame;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_visible_face_shows_relayed_weather() {
    let server = mock_provider(800).await;
    let mut running = start(&server).await;

    running.face.send(FaceEvent::VisibilityChanged(true)).unwrap();

    let first = wait_for(&mut running.frames, |_| true).await;
    assert!(texts(&first).contains(&"10".to_string()));
    assert!(texts(&first).contains(&"--".to_string()));

    let frame = wait_for(&mut running.frames, |f| {
        has_icon(f) && texts(f).contains(&"25°".to_string())
    })
    .await;
    assert!(texts(&frame).contains(&"16°".to_string()));
    assert!(texts(&frame).contains(&":05:00".to_string()));

    let requests = running.bus.messages_to("phone");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].payload.is_empty());

    running.face.send(FaceEvent::Destroy).unwrap();
}

#[tokio::test]
async fn test_unknown_condition_still_delivers_temperatures() {
    let server = mock_provider(999).await;
    let mut running = start(&server).await;

    running.face.send(FaceEvent::VisibilityChanged(true)).unwrap();

    let frame = wait_for(&mut running.frames, |f| texts(f).contains(&"25°".to_string())).await;
    assert!(!has_icon(&frame));
    assert!(running.bus.published_items().is_empty());

    running.face.send(FaceEvent::Destroy).unwrap();
}

#[tokio::test]
async fn test_returning_from_ambient_refreshes_once() {
    let server = mock_provider(800).await;
    let mut running = start(&server).await;

    running.face.send(FaceEvent::VisibilityChanged(true)).unwrap();
    wait_for(&mut running.frames, |f| texts(f).contains(&"25°".to_string())).await;

    running.face.send(FaceEvent::AmbientModeChanged(true)).unwrap();
    let ambient = wait_for(&mut running.frames, |f| texts(f).contains(&":05".to_string())).await;
    assert!(!texts(&ambient).contains(&":05:00".to_string()));

    running.face.send(FaceEvent::AmbientModeChanged(false)).unwrap();
    wait_for(&mut running.frames, |f| texts(f).contains(&":05:00".to_string())).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while running.bus.messages_to("phone").len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(running.bus.messages_to("phone").len(), 2);

    running.face.send(FaceEvent::Destroy).unwrap();
}
