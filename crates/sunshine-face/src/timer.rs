//! Redraw timer aligned to wall-clock boundaries.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::FaceEvent;
use crate::state::Clock;

pub const INTERACTIVE_PERIOD: Duration = Duration::from_secs(1);
pub const AMBIENT_PERIOD: Duration = Duration::from_secs(60);

/// Time from `now_ms` to the next multiple of `period`.
///
/// A timestamp sitting exactly on a boundary waits a full period.
pub fn delay_to_next_boundary(now_ms: i64, period: Duration) -> Duration {
    let period_ms = period.as_millis().max(1) as i64;
    let remaining = period_ms - now_ms.rem_euclid(period_ms);
    Duration::from_millis(remaining as u64)
}

/// Posts [`FaceEvent::Tick`] on every boundary until dropped.
pub struct RedrawTimer {
    period: Duration,
    handle: JoinHandle<()>,
}

impl RedrawTimer {
    pub fn start(
        period: Duration,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<FaceEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                let delay = delay_to_next_boundary(clock.now().timestamp_millis(), period);
                tokio::time::sleep(delay).await;
                if events.send(FaceEvent::Tick).is_err() {
                    break;
                }
            }
        });
        tracing::trace!("Redraw timer started ({:?})", period);
        Self { period, handle }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for RedrawTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
