//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::{error::TimerError, state::AppState};
use super::responses::{
    ApiResponse, DurationRequest, HealthResponse, ProfileResponse, SettingsResponse,
    StatisticsResponse, StatusResponse,
};

/// Handle POST /timer/start - Start or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, TimerError> {
    let timer = state.start().inspect_err(|e| error!("Failed to start timer: {}", e))?;
    info!("Start endpoint called - {} running, {} left", timer.phase, timer.display);
    Ok(Json(ApiResponse::new("Timer started", timer)))
}

/// Handle POST /timer/pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, TimerError> {
    let timer = state.pause().inspect_err(|e| error!("Failed to pause timer: {}", e))?;
    info!("Pause endpoint called - {} left", timer.display);
    Ok(Json(ApiResponse::new("Timer paused", timer)))
}

/// Handle POST /timer/reset - Rewind the current phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, TimerError> {
    let timer = state.reset().inspect_err(|e| error!("Failed to reset timer: {}", e))?;
    info!("Reset endpoint called - {} back to {}", timer.phase, timer.display);
    Ok(Json(ApiResponse::new("Timer reset", timer)))
}

/// Handle PUT /timer/duration - Change one phase's duration
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DurationRequest>,
) -> Result<Json<ApiResponse>, TimerError> {
    let timer = state
        .set_duration(request.phase, request.seconds)
        .inspect_err(|e| warn!("Rejected duration change: {}", e))?;
    Ok(Json(ApiResponse::new(
        format!("{} duration set to {}s", request.phase, request.seconds),
        timer,
    )))
}

/// Handle GET /settings - Return the duration table
pub async fn settings_handler(State(state): State<Arc<AppState>>) -> Result<Json<SettingsResponse>, TimerError> {
    let (durations, long_break_interval) = state.settings()?;
    Ok(Json(SettingsResponse::new(&durations, long_break_interval)))
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.snapshot(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /profile - Return the cached gamification profile and badges
pub async fn profile_handler(State(state): State<Arc<AppState>>) -> Result<Json<ProfileResponse>, TimerError> {
    let summary = state
        .remote_summary()
        .inspect_err(|e| error!("Failed to read profile: {}", e))?;
    Ok(Json(summary.into()))
}

/// Handle GET /statistics - Return the cached session statistics
pub async fn statistics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatisticsResponse>, TimerError> {
    let summary = state
        .remote_summary()
        .inspect_err(|e| error!("Failed to read statistics: {}", e))?;
    Ok(Json(summary.into()))
}

/// Handle GET /events - Stream timer notifications as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = state.subscribe();
    info!("Event stream subscriber connected");

    let stream = stream::unfold(events, |mut events| async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let sse = Event::default().event(event.name()).json_data(&event);
                    return Some((sse, events));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
