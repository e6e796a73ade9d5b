//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    engine::{Phase, PhaseDurations},
    error::TimerError,
    state::{RemoteSummary, TimerSnapshot},
};

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(message: impl Into<String>, timer: TimerSnapshot) -> Self {
        let status = if timer.running { "running" } else { "paused" };
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Body of `PUT /timer/duration`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationRequest {
    pub phase: Phase,
    pub seconds: u64,
}

/// Duration table in seconds, as served by `GET /settings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub work_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    pub long_break_interval: u32,
}

impl SettingsResponse {
    pub fn new(durations: &PhaseDurations, long_break_interval: u32) -> Self {
        Self {
            work_seconds: durations.get(Phase::Work),
            short_break_seconds: durations.get(Phase::ShortBreak),
            long_break_seconds: durations.get(Phase::LongBreak),
            long_break_interval,
        }
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Gamification profile and badges, as served by `GET /profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: Option<Value>,
    pub badges: Option<Value>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Session statistics, as served by `GET /statistics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub statistics: Option<Value>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl From<RemoteSummary> for ProfileResponse {
    fn from(summary: RemoteSummary) -> Self {
        Self {
            profile: summary.profile,
            badges: summary.badges,
            refreshed_at: summary.refreshed_at,
        }
    }
}

impl From<RemoteSummary> for StatisticsResponse {
    fn from(summary: RemoteSummary) -> Self {
        Self {
            statistics: summary.statistics,
            refreshed_at: summary.refreshed_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for TimerError {
    fn into_response(self) -> Response {
        let code = if self.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
