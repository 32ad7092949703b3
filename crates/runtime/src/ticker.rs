//! Interval task pushing tick markers into the zone's input queue.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::handle::ZoneHandle;

/// Spawns the ticker. A zero interval disables ticking. The task exits when
/// the worker's queue closes.
pub fn spawn_ticker(handle: ZoneHandle, interval: Duration) -> JoinHandle<()> {
    if interval.is_zero() {
        tracing::info!("ticker disabled");
        return tokio::spawn(async {});
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; swallow it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if handle.enqueue_tick().await.is_err() {
                break;
            }
        }
        tracing::debug!("ticker stopped");
    })
}
