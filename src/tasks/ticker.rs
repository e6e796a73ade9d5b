//! One-second countdown ticker

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::state::AppState;

/// Period between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task driving the engine while it runs.
///
/// Spawned by `AppState::start` and tagged with a generation; it exits as soon
/// as the host reports that generation is no longer the live one.
pub async fn ticker_task(state: Arc<AppState>, generation: u64) {
    debug!("Ticker {} started", generation);

    // First tick lands one full period after start, not immediately.
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match state.tick(generation) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!("Failed to advance timer: {}", e);
                break;
            }
        }
    }

    debug!("Ticker {} stopped", generation);
}
