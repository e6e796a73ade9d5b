//! Error types

use thiserror::Error;

use crate::engine::Phase;

/// Errors raised by the timer engine and the host context around it
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("{phase} duration must be at least one second")]
    ZeroDuration { phase: Phase },

    #[error("{requested}s remaining exceeds the {phase} duration of {duration}s")]
    RemainingOutOfRange {
        phase: Phase,
        requested: u64,
        duration: u64,
    },

    #[error("{minutes} minutes is too long for the {phase} duration")]
    DurationOverflow { phase: Phase, minutes: u64 },

    #[error("long break interval must be at least one work session")]
    ZeroLongBreakInterval,

    #[error("failed to lock timer state: {0}")]
    LockPoisoned(String),
}

impl TimerError {
    /// True for errors caused by caller input rather than host failure
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, TimerError::LockPoisoned(_))
    }
}

/// Errors talking to the remote session API
#[derive(Debug, Error)]
pub enum SessionApiError {
    #[error("session api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session api rejected the request: {0}")]
    Rejected(String),
}
