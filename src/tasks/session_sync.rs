//! Session correlation background task

use std::sync::Arc;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::{
    engine::{Phase, TimerEvent},
    error::SessionApiError,
    services::SessionApi,
    state::{AppState, RemoteSummary},
};

/// Background task that mirrors work phases as remote session records.
///
/// Remote failures are logged and dropped: the local timer stays authoritative.
pub async fn session_sync_task<A: SessionApi>(state: Arc<AppState>, api: A) {
    info!("Starting session sync task");

    let mut events = state.subscribe();
    refresh_summary(&state, &api).await;

    loop {
        match events.recv().await {
            Ok(TimerEvent::Started { phase: Phase::Work, run, .. }) => {
                open_session(&state, &api, run).await;
            }
            Ok(TimerEvent::Completed { finished: Phase::Work, completed_work_sessions, .. }) => {
                close_session(&state, &api, completed_work_sessions).await;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Session sync lagged behind, skipped {} timer events", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Timer event channel closed, stopping session sync");
                break;
            }
        }
    }
}

/// Open a session for work run `run`. The id is dropped if the run was reset
/// or completed while the request was in flight.
async fn open_session<A: SessionApi>(state: &AppState, api: &A, run: u64) {
    match state.session_id() {
        Ok(Some(id)) => {
            debug!("Resuming work phase of session {}", id);
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to read session id: {}", e);
            return;
        }
    }

    let minutes = match state.settings() {
        Ok((durations, _)) => durations.get(Phase::Work).div_ceil(60),
        Err(e) => {
            error!("Failed to read work duration: {}", e);
            return;
        }
    };

    match api.start_session(minutes).await {
        Ok(Some(id)) => match state.attach_session(id.clone(), run) {
            Ok(true) => info!("Opened session {} for a {}min work phase", id, minutes),
            Ok(false) => debug!("Session {} belongs to an abandoned work run, dropped", id),
            Err(e) => error!("Failed to store session id: {}", e),
        },
        Ok(None) => debug!("Session API offline, work phase not recorded"),
        Err(e) => warn!("Failed to start session: {}", e),
    }
}

async fn close_session<A: SessionApi>(state: &AppState, api: &A, completed_work_sessions: u32) {
    let id = match state.take_session_id() {
        Ok(Some(id)) => id,
        Ok(None) => {
            debug!("Work phase {} completed without an open session", completed_work_sessions);
            return;
        }
        Err(e) => {
            error!("Failed to take session id: {}", e);
            return;
        }
    };

    match api.complete_session(&id).await {
        Ok(outcome) => {
            info!("Session {} completed, earned {} XP", id, outcome.xp_earned);
            if outcome.leveled_up {
                match outcome.level {
                    Some(level) => info!("Level up! Now level {}", level),
                    None => info!("Level up!"),
                }
            }
            for badge in &outcome.new_badges {
                info!("New badge earned: {}", badge);
            }
            refresh_summary(state, api).await;
        }
        Err(e) => warn!("Failed to complete session {}: {}", id, e),
    }
}

/// Fetch profile, badges and statistics and merge whatever arrived into the cache
async fn refresh_summary<A: SessionApi>(state: &AppState, api: &A) {
    let (profile, badges, statistics) = tokio::join!(api.profile(), api.badges(), api.statistics());

    let summary = RemoteSummary {
        profile: keep_document("profile", profile),
        badges: keep_document("badges", badges),
        statistics: keep_document("statistics", statistics),
        refreshed_at: Some(Utc::now()),
    };
    if summary.is_empty() {
        debug!("No profile or statistics available from the session API");
        return;
    }
    if let Err(e) = state.store_remote_summary(summary) {
        error!("Failed to store profile and statistics: {}", e);
    }
}

fn keep_document(what: &str, fetched: Result<Option<Value>, SessionApiError>) -> Option<Value> {
    fetched.unwrap_or_else(|e| {
        warn!("Failed to fetch {}: {}", what, e);
        None
    })
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Mutex,
        time::Duration,
    };

    use serde_json::json;
    use tokio::time::sleep;

    use super::*;
    use crate::{
        engine::{PhaseDurations, TimerEngine},
        services::CompletionOutcome,
    };

    /// Records session calls. `fail` breaks every request, `fail_complete`
    /// only completions; `start_delay` slows down opening a session.
    #[derive(Clone, Default)]
    struct RecordingApi {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
        fail_complete: bool,
        start_delay: Duration,
    }

    impl RecordingApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn completions(&self) -> usize {
            self.calls().iter().filter(|call| call.starts_with("complete:")).count()
        }

        fn document(&self, body: Value) -> Result<Option<Value>, SessionApiError> {
            if self.fail {
                return Err(SessionApiError::Rejected("offline".to_string()));
            }
            Ok(Some(body))
        }
    }

    impl SessionApi for RecordingApi {
        async fn start_session(&self, minutes: u64) -> Result<Option<String>, SessionApiError> {
            let id = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(format!("start:{}", minutes));
                format!("s{}", calls.len())
            };
            sleep(self.start_delay).await;
            if self.fail {
                return Err(SessionApiError::Rejected("offline".to_string()));
            }
            Ok(Some(id))
        }

        async fn complete_session(&self, session_id: &str) -> Result<CompletionOutcome, SessionApiError> {
            self.calls.lock().unwrap().push(format!("complete:{}", session_id));
            if self.fail || self.fail_complete {
                return Err(SessionApiError::Rejected("offline".to_string()));
            }
            Ok(CompletionOutcome {
                xp_earned: 10,
                leveled_up: true,
                level: Some(2),
                new_badges: vec!["First Step".to_string()],
            })
        }

        async fn profile(&self) -> Result<Option<Value>, SessionApiError> {
            self.document(json!({ "level": 1 + self.completions() }))
        }

        async fn badges(&self) -> Result<Option<Value>, SessionApiError> {
            self.document(json!([]))
        }

        async fn statistics(&self) -> Result<Option<Value>, SessionApiError> {
            self.document(json!({ "total_sessions": self.completions() }))
        }
    }

    fn test_state() -> Arc<AppState> {
        // 90s of work is sent as two whole minutes.
        let durations = PhaseDurations::new(90, 5, 10).unwrap();
        Arc::new(AppState::new(0, "127.0.0.1".to_string(), TimerEngine::new(durations)))
    }

    async fn spawn_sync(state: &Arc<AppState>, api: RecordingApi) {
        tokio::spawn(session_sync_task(Arc::clone(state), api));
        // Let the task subscribe before anything is published.
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn work_phase_opens_and_closes_a_session() {
        let state = test_state();
        let api = RecordingApi::default();
        spawn_sync(&state, api.clone()).await;

        state.start().unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(state.session_id().unwrap().as_deref(), Some("s1"));

        sleep(Duration::from_secs(91)).await;
        assert_eq!(state.snapshot().phase, Phase::ShortBreak);
        assert_eq!(api.calls(), vec!["start:2", "complete:s1"]);
        assert_eq!(state.session_id().unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn resuming_keeps_the_open_session() {
        let state = test_state();
        let api = RecordingApi::default();
        spawn_sync(&state, api.clone()).await;

        state.start().unwrap();
        sleep(Duration::from_millis(1500)).await;
        state.pause().unwrap();
        state.start().unwrap();
        sleep(Duration::from_millis(500)).await;

        assert_eq!(api.calls(), vec!["start:2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn breaks_do_not_open_sessions() {
        let state = test_state();
        let api = RecordingApi::default();
        spawn_sync(&state, api.clone()).await;

        state.set_duration(Phase::Work, 1).unwrap();
        state.start().unwrap();
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(state.snapshot().phase, Phase::ShortBreak);

        state.start().unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(api.calls(), vec!["start:1", "complete:s1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn api_failures_leave_timer_untouched() {
        let state = test_state();
        let api = RecordingApi {
            fail: true,
            ..RecordingApi::default()
        };
        spawn_sync(&state, api.clone()).await;

        state.start().unwrap();
        sleep(Duration::from_millis(3500)).await;

        let snapshot = state.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.remaining_seconds, 87);
        assert_eq!(snapshot.session_id, None);
        assert_eq!(api.calls(), vec!["start:2"]);
        assert!(state.remote_summary().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_completion_still_moves_on() {
        let state = test_state();
        let api = RecordingApi {
            fail_complete: true,
            ..RecordingApi::default()
        };
        spawn_sync(&state, api.clone()).await;

        state.start().unwrap();
        sleep(Duration::from_millis(91_500)).await;

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::ShortBreak);
        assert_eq!(snapshot.completed_work_sessions, 1);
        assert_eq!(state.session_id().unwrap(), None);
        assert_eq!(api.calls(), vec!["start:2", "complete:s1"]);

        // The break counts down as usual.
        state.start().unwrap();
        sleep(Duration::from_millis(3500)).await;
        let snapshot = state.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.remaining_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_session_from_reset_run_is_dropped() {
        let state = test_state();
        let api = RecordingApi {
            start_delay: Duration::from_secs(2),
            ..RecordingApi::default()
        };
        spawn_sync(&state, api.clone()).await;

        state.start().unwrap();
        sleep(Duration::from_millis(500)).await;
        state.reset().unwrap();

        // s1 answers after the reset and must not be attached.
        sleep(Duration::from_secs(3)).await;
        assert_eq!(state.session_id().unwrap(), None);

        state.start().unwrap();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(state.session_id().unwrap().as_deref(), Some("s2"));

        sleep(Duration::from_secs(89)).await;
        assert_eq!(state.snapshot().phase, Phase::ShortBreak);
        assert_eq!(api.calls(), vec!["start:2", "start:2", "complete:s2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn summary_is_refreshed_after_completion() {
        let state = test_state();
        let api = RecordingApi::default();
        spawn_sync(&state, api.clone()).await;

        let summary = state.remote_summary().unwrap();
        assert_eq!(summary.statistics, Some(json!({ "total_sessions": 0 })));
        assert!(summary.refreshed_at.is_some());

        state.set_duration(Phase::Work, 1).unwrap();
        state.start().unwrap();
        sleep(Duration::from_millis(2500)).await;

        let summary = state.remote_summary().unwrap();
        assert_eq!(summary.profile, Some(json!({ "level": 2 })));
        assert_eq!(summary.statistics, Some(json!({ "total_sessions": 1 })));
        assert_eq!(summary.badges, Some(json!([])));
    }
}
