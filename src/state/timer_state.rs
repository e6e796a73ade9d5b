//! Read-only timer snapshot handed to renderers

use serde::{Deserialize, Serialize};

use crate::engine::{Phase, TimerEngine};

/// Coloring hint for a progress ring, from the share of time left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    /// More than half the phase remains
    Normal,
    /// More than a fifth remains
    Warning,
    Danger,
}

impl ProgressBand {
    pub fn from_remaining(remaining_seconds: u64, duration_seconds: u64) -> Self {
        if duration_seconds == 0 {
            return ProgressBand::Danger;
        }
        let percent_left = remaining_seconds as f64 / duration_seconds as f64 * 100.0;
        if percent_left > 50.0 {
            ProgressBand::Normal
        } else if percent_left > 20.0 {
            ProgressBand::Warning
        } else {
            ProgressBand::Danger
        }
    }
}

/// Everything a renderer needs to draw the timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub duration_seconds: u64,
    pub running: bool,
    pub completed_work_sessions: u32,
    pub progress: f64,
    /// Countdown formatted as `MM:SS`
    pub display: String,
    pub band: ProgressBand,
    pub session_id: Option<String>,
}

impl TimerSnapshot {
    /// Capture the engine's current state
    pub fn capture(engine: &TimerEngine) -> Self {
        let remaining_seconds = engine.remaining_seconds();
        let duration_seconds = engine.duration();
        Self {
            phase: engine.phase(),
            remaining_seconds,
            duration_seconds,
            running: engine.is_running(),
            completed_work_sessions: engine.completed_work_sessions(),
            progress: engine.progress(),
            display: format_clock(remaining_seconds),
            band: ProgressBand::from_remaining(remaining_seconds, duration_seconds),
            session_id: engine.session_id().map(str::to_owned),
        }
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::capture(&TimerEngine::default())
    }
}

/// Format seconds as a zero-padded `MM:SS` clock. Minutes are not wrapped.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
