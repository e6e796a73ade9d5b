//! Host context owning the timer engine, its ticker and its observers

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

use super::{RemoteSummary, TimerSnapshot};
use crate::{
    engine::{Phase, PhaseDurations, TimerEngine, TimerEvent},
    error::TimerError,
    tasks::ticker_task,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine plus the one ticker allowed to drive it
#[derive(Debug)]
struct TimerCell {
    engine: TimerEngine,
    ticker: Option<JoinHandle<()>>,
    /// Bumped whenever a ticker is spawned or cancelled; ticks from an older
    /// generation are ignored.
    generation: u64,
}

/// Main application state shared by the HTTP layer and background tasks
#[derive(Debug)]
pub struct AppState {
    timer: Mutex<TimerCell>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Every engine notification, in order
    event_tx: broadcast::Sender<TimerEvent>,
    /// Latest snapshot, refreshed after every notification
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Profile, badges and statistics from the session API
    remote: Mutex<RemoteSummary>,
}

impl AppState {
    /// Create the host context around a freshly built engine
    pub fn new(port: u16, host: String, engine: TimerEngine) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, _) = watch::channel(TimerSnapshot::capture(&engine));

        Self {
            timer: Mutex::new(TimerCell {
                engine,
                ticker: None,
                generation: 0,
            }),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            event_tx,
            snapshot_tx,
            remote: Mutex::new(RemoteSummary::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TimerCell>, TimerError> {
        self.timer
            .lock()
            .map_err(|e| TimerError::LockPoisoned(e.to_string()))
    }

    /// Broadcast events and refresh the snapshot. Called with the timer lock
    /// held so observers see events in the order the engine produced them.
    fn publish(&self, engine: &TimerEngine, events: impl IntoIterator<Item = TimerEvent>) {
        for event in events {
            debug!("Timer event: {:?}", event);
            // No subscribers is fine; nobody is rendering right now.
            let _ = self.event_tx.send(event);
        }
        self.snapshot_tx.send_replace(TimerSnapshot::capture(engine));
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Start the countdown. A second start while running is a no-op and
    /// never spawns a second ticker.
    pub fn start(self: &Arc<Self>) -> Result<TimerSnapshot, TimerError> {
        let mut cell = self.lock()?;
        if let Some(event) = cell.engine.start() {
            cell.generation += 1;
            let generation = cell.generation;
            if let Some(stale) = cell.ticker.take() {
                stale.abort();
            }
            cell.ticker = Some(tokio::spawn(ticker_task(Arc::clone(self), generation)));
            info!(
                "Timer started: {} with {}s remaining",
                cell.engine.phase(),
                cell.engine.remaining_seconds()
            );
            self.publish(&cell.engine, [event]);
        }
        let snapshot = TimerSnapshot::capture(&cell.engine);
        drop(cell);

        self.record_action("start");
        Ok(snapshot)
    }

    /// Pause the countdown and cancel the ticker
    pub fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        let mut cell = self.lock()?;
        if let Some(event) = Self::stop_ticking(&mut cell) {
            info!("Timer paused with {}s remaining", cell.engine.remaining_seconds());
            self.publish(&cell.engine, [event]);
        }
        let snapshot = TimerSnapshot::capture(&cell.engine);
        drop(cell);

        self.record_action("pause");
        Ok(snapshot)
    }

    /// Pause, rewind the current phase and forget the open session
    pub fn reset(&self) -> Result<TimerSnapshot, TimerError> {
        let mut cell = self.lock()?;
        let paused = Self::stop_ticking(&mut cell);
        let reset = cell.engine.reset();
        if let Some(id) = cell.engine.take_session_id() {
            debug!("Dropping session {} on reset", id);
        }
        info!("Timer reset: {}", cell.engine.phase());
        self.publish(&cell.engine, paused.into_iter().chain([reset]));
        let snapshot = TimerSnapshot::capture(&cell.engine);
        drop(cell);

        self.record_action("reset");
        Ok(snapshot)
    }

    /// Change one phase's duration
    pub fn set_duration(&self, phase: Phase, seconds: u64) -> Result<TimerSnapshot, TimerError> {
        let mut cell = self.lock()?;
        let event = cell.engine.set_duration(phase, seconds)?;
        info!("Duration for {} set to {}s", phase, seconds);
        self.publish(&cell.engine, [event]);
        let snapshot = TimerSnapshot::capture(&cell.engine);
        drop(cell);

        self.record_action("set-duration");
        Ok(snapshot)
    }

    /// One second elapsed for the ticker of `generation`.
    ///
    /// Returns whether that ticker should keep running.
    pub fn tick(&self, generation: u64) -> Result<bool, TimerError> {
        let mut cell = self.lock()?;
        if cell.generation != generation || !cell.engine.is_running() {
            debug!("Ignoring tick from stale ticker generation {}", generation);
            return Ok(false);
        }

        let events = cell.engine.tick();
        let still_running = cell.engine.is_running();
        if !still_running {
            // Completion paused the engine; the calling ticker exits on its own.
            cell.generation += 1;
            cell.ticker = None;
            info!(
                "Phase complete, next up {} ({}s), {} work sessions done",
                cell.engine.phase(),
                cell.engine.remaining_seconds(),
                cell.engine.completed_work_sessions()
            );
        }
        self.publish(&cell.engine, events);
        Ok(still_running)
    }

    fn stop_ticking(cell: &mut TimerCell) -> Option<TimerEvent> {
        let event = cell.engine.pause()?;
        cell.generation += 1;
        if let Some(ticker) = cell.ticker.take() {
            ticker.abort();
        }
        Some(event)
    }

    /// Subscribe to every future timer notification
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Latest published snapshot. Reads the watch channel, not the engine lock.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Replace the cached remote data with whatever `summary` carries
    pub fn store_remote_summary(&self, summary: RemoteSummary) -> Result<(), TimerError> {
        let mut remote = self
            .remote
            .lock()
            .map_err(|e| TimerError::LockPoisoned(e.to_string()))?;
        remote.merge(summary);
        Ok(())
    }

    /// Last profile, badges and statistics fetched from the session API
    pub fn remote_summary(&self) -> Result<RemoteSummary, TimerError> {
        self.remote
            .lock()
            .map(|remote| remote.clone())
            .map_err(|e| TimerError::LockPoisoned(e.to_string()))
    }

    /// Current duration table and long-break interval
    pub fn settings(&self) -> Result<(PhaseDurations, u32), TimerError> {
        self.lock()
            .map(|cell| (*cell.engine.durations(), cell.engine.long_break_interval()))
    }

    pub fn has_ticker(&self) -> Result<bool, TimerError> {
        self.lock().map(|cell| cell.ticker.is_some())
    }

    pub fn session_id(&self) -> Result<Option<String>, TimerError> {
        self.lock().map(|cell| cell.engine.session_id().map(str::to_owned))
    }

    /// Store the session opened for countdown `run`.
    ///
    /// Refused when a session is already attached, or when the run was reset
    /// or completed while the session was being opened. Returns whether the
    /// id was stored.
    pub fn attach_session(&self, id: String, run: u64) -> Result<bool, TimerError> {
        let mut cell = self.lock()?;
        if cell.engine.run() != run || cell.engine.session_id().is_some() {
            return Ok(false);
        }
        cell.engine.set_session_id(Some(id));
        self.snapshot_tx.send_replace(TimerSnapshot::capture(&cell.engine));
        Ok(true)
    }

    pub fn take_session_id(&self) -> Result<Option<String>, TimerError> {
        let mut cell = self.lock()?;
        let id = cell.engine.take_session_id();
        if id.is_some() {
            self.snapshot_tx.send_replace(TimerSnapshot::capture(&cell.engine));
        }
        Ok(id)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    fn test_state(work: u64, short_break: u64, long_break: u64) -> Arc<AppState> {
        let durations = PhaseDurations::new(work, short_break, long_break).unwrap();
        Arc::new(AppState::new(0, "127.0.0.1".to_string(), TimerEngine::new(durations)))
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let state = test_state(60, 5, 10);
        state.start().unwrap();

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(state.snapshot().remaining_seconds, 57);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_single_ticker() {
        let state = test_state(60, 5, 10);
        let mut events = state.subscribe();
        state.start().unwrap();
        state.start().unwrap();

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(state.snapshot().remaining_seconds, 58);

        assert!(matches!(events.recv().await, Ok(TimerEvent::Started { .. })));
        assert!(matches!(
            events.recv().await,
            Ok(TimerEvent::Tick { remaining_seconds: 59, .. })
        ));
        assert!(matches!(
            events.recv().await,
            Ok(TimerEvent::Tick { remaining_seconds: 58, .. })
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_countdown() {
        let state = test_state(60, 5, 10);
        state.start().unwrap();
        sleep(Duration::from_millis(2500)).await;

        let paused = state.pause().unwrap();
        assert!(!paused.running);
        assert_eq!(paused.remaining_seconds, 58);
        assert!(!state.has_ticker().unwrap());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(state.snapshot().remaining_seconds, 58);

        state.start().unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(state.snapshot().remaining_seconds, 57);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_stops_ticker_and_switches_phase() {
        let state = test_state(2, 5, 10);
        let mut events = state.subscribe();
        state.start().unwrap();

        // Ticks at 1s and 2s reach zero, the third tick completes.
        sleep(Duration::from_millis(3500)).await;
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::ShortBreak);
        assert_eq!(snapshot.remaining_seconds, 5);
        assert_eq!(snapshot.completed_work_sessions, 1);
        assert!(!snapshot.running);
        assert!(!state.has_ticker().unwrap());

        sleep(Duration::from_secs(3)).await;
        assert_eq!(state.snapshot().remaining_seconds, 5);

        let mut completions = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, TimerEvent::Completed { .. }) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rewinds_and_forgets_session() {
        let state = test_state(60, 5, 10);
        state.start().unwrap();
        assert!(state.attach_session("7".to_string(), 0).unwrap());
        assert!(!state.attach_session("8".to_string(), 0).unwrap());
        sleep(Duration::from_millis(2500)).await;

        let snapshot = state.reset().unwrap();
        assert_eq!(snapshot.remaining_seconds, 60);
        assert!(!snapshot.running);
        assert_eq!(snapshot.session_id, None);
        assert_eq!(state.get_last_action().0.as_deref(), Some("reset"));

        // A session opened before the reset belongs to the abandoned run.
        assert!(!state.attach_session("9".to_string(), 0).unwrap());
        assert!(state.attach_session("10".to_string(), 1).unwrap());
        assert_eq!(state.snapshot().session_id.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn stale_generation_is_ignored() {
        let state = test_state(60, 5, 10);
        assert!(!state.tick(0).unwrap());
        assert_eq!(state.snapshot().remaining_seconds, 60);
    }

    #[tokio::test]
    async fn snapshot_follows_changes() {
        let state = test_state(60, 5, 10);
        state.set_duration(Phase::Work, 90).unwrap();
        assert_eq!(state.snapshot().remaining_seconds, 90);
        assert_eq!(state.snapshot().display, "01:30");
        assert!(state.set_duration(Phase::Work, 0).is_err());
        assert_eq!(state.snapshot().remaining_seconds, 90);
    }

    #[tokio::test]
    async fn remote_summary_keeps_fields_not_refreshed() {
        let state = test_state(60, 5, 10);
        state
            .store_remote_summary(RemoteSummary {
                profile: Some(serde_json::json!({ "level": 1 })),
                statistics: Some(serde_json::json!({ "total_sessions": 3 })),
                ..RemoteSummary::default()
            })
            .unwrap();
        state
            .store_remote_summary(RemoteSummary {
                profile: Some(serde_json::json!({ "level": 2 })),
                ..RemoteSummary::default()
            })
            .unwrap();

        let summary = state.remote_summary().unwrap();
        assert_eq!(summary.profile.unwrap()["level"], 2);
        assert_eq!(summary.statistics.unwrap()["total_sessions"], 3);
        assert!(summary.badges.is_none());
    }
}
