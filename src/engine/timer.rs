//! The pomodoro countdown state machine.
//!
//! The engine never spawns anything and performs no I/O. It is driven from
//! outside: the host calls `tick()` once per second while `is_running()` is
//! true, and publishes whatever events each call returns.
//!
//! ## Phase cycle
//!
//! ```text
//! WORK -> SHORT_BREAK -> WORK -> ... -> WORK -> LONG_BREAK -> WORK
//!                         (every long_break_interval-th work completion)
//! ```

use super::{Phase, PhaseDurations, TimerEvent};
use crate::error::TimerError;

/// Work completions per long break unless configured otherwise.
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: Phase,
    durations: PhaseDurations,
    remaining_seconds: u64,
    running: bool,
    completed_work_sessions: u32,
    long_break_interval: u32,
    /// Bumped whenever the countdown is reloaded by a reset or a phase switch.
    run: u64,
    /// Remote session record for the current work phase. Owned by the host.
    session_id: Option<String>,
}

impl TimerEngine {
    /// Create an engine in WORK with a full countdown.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            phase: Phase::Work,
            durations,
            remaining_seconds: durations.get(Phase::Work),
            running: false,
            completed_work_sessions: 0,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            run: 0,
            session_id: None,
        }
    }

    pub fn with_long_break_interval(mut self, interval: u32) -> Result<Self, TimerError> {
        if interval == 0 {
            return Err(TimerError::ZeroLongBreakInterval);
        }
        self.long_break_interval = interval;
        Ok(self)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub fn duration(&self) -> u64 {
        self.durations.get(self.phase)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn long_break_interval(&self) -> u32 {
        self.long_break_interval
    }

    /// Identifies the current countdown run. A session opened for one run
    /// must not be attached to another.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// 0.0 at a full countdown, 1.0 at zero.
    pub fn progress(&self) -> f64 {
        let total = self.duration();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        self.running = true;
        Some(TimerEvent::Started {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            run: self.run,
        })
    }

    pub fn pause(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(TimerEvent::Paused {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
        })
    }

    /// Stop and rewind the current phase. Phase and session count are kept.
    pub fn reset(&mut self) -> TimerEvent {
        self.pause();
        self.remaining_seconds = self.duration();
        self.run += 1;
        TimerEvent::Reset {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Advance the countdown by one second.
    ///
    /// At zero this completes the phase instead of going negative, so the
    /// last second of a phase is visible for a full tick before the switch.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            return vec![TimerEvent::Tick {
                phase: self.phase,
                remaining_seconds: self.remaining_seconds,
            }];
        }
        self.complete()
    }

    /// Finish the current phase and load the next one.
    ///
    /// Returns a `Tick` carrying the reloaded countdown followed by exactly
    /// one `Completed`.
    pub fn complete(&mut self) -> Vec<TimerEvent> {
        self.pause();

        let finished = self.phase;
        self.phase = match finished {
            Phase::Work => {
                self.completed_work_sessions += 1;
                if self.completed_work_sessions % self.long_break_interval == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.remaining_seconds = self.duration();
        self.run += 1;

        vec![
            TimerEvent::Tick {
                phase: self.phase,
                remaining_seconds: self.remaining_seconds,
            },
            TimerEvent::Completed {
                finished,
                next_phase: self.phase,
                remaining_seconds: self.remaining_seconds,
                completed_work_sessions: self.completed_work_sessions,
            },
        ]
    }

    /// Change a phase's duration.
    ///
    /// A paused engine in that phase reloads the countdown. A running one
    /// keeps counting, clamped so it never exceeds the new duration.
    pub fn set_duration(&mut self, phase: Phase, seconds: u64) -> Result<TimerEvent, TimerError> {
        self.durations.set(phase, seconds)?;
        if phase == self.phase {
            if self.running {
                self.remaining_seconds = self.remaining_seconds.min(seconds);
            } else {
                self.remaining_seconds = seconds;
            }
        }
        Ok(TimerEvent::DurationChanged { phase, seconds })
    }

    /// Force the countdown value for the current phase.
    pub fn set_time_remaining(&mut self, seconds: u64) -> Result<(), TimerError> {
        let duration = self.duration();
        if seconds > duration {
            return Err(TimerError::RemainingOutOfRange {
                phase: self.phase,
                requested: seconds,
                duration,
            });
        }
        self.remaining_seconds = seconds;
        Ok(())
    }

    pub fn set_session_id(&mut self, id: Option<String>) {
        self.session_id = id;
    }

    pub fn take_session_id(&mut self) -> Option<String> {
        self.session_id.take()
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PhaseDurations::default())
    }
}
