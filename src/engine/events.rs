//! Notifications produced by the timer engine
//!
//! Every engine operation that changes observable state returns the events it
//! produced. The host broadcasts them to whoever is listening.

use serde::{Deserialize, Serialize};

use super::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// The countdown began (or resumed) decrementing.
    Started {
        phase: Phase,
        remaining_seconds: u64,
        /// Countdown run being started; unchanged by pause and resume.
        run: u64,
    },
    Paused {
        phase: Phase,
        remaining_seconds: u64,
    },
    /// The countdown was rewound to the full duration of the current phase.
    Reset {
        phase: Phase,
        remaining_seconds: u64,
    },
    /// One second elapsed, or a phase boundary reloaded the countdown.
    Tick {
        phase: Phase,
        remaining_seconds: u64,
    },
    /// A phase ran out and the engine moved on to the next one.
    Completed {
        finished: Phase,
        next_phase: Phase,
        remaining_seconds: u64,
        completed_work_sessions: u32,
    },
    DurationChanged {
        phase: Phase,
        seconds: u64,
    },
}

impl TimerEvent {
    /// Short event name, used as the SSE event field
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::Started { .. } => "started",
            TimerEvent::Paused { .. } => "paused",
            TimerEvent::Reset { .. } => "reset",
            TimerEvent::Tick { .. } => "tick",
            TimerEvent::Completed { .. } => "completed",
            TimerEvent::DurationChanged { .. } => "duration_changed",
        }
    }
}
