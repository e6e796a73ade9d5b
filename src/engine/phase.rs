//! Pomodoro phases and their duration table

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Default WORK length in seconds (25 minutes)
pub const DEFAULT_WORK_SECONDS: u64 = 25 * 60;
/// Default SHORT_BREAK length in seconds (5 minutes)
pub const DEFAULT_SHORT_BREAK_SECONDS: u64 = 5 * 60;
/// Default LONG_BREAK length in seconds (15 minutes)
pub const DEFAULT_LONG_BREAK_SECONDS: u64 = 15 * 60;

/// The countdown's current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short break",
            Phase::LongBreak => "long break",
        })
    }
}

/// Phase → duration in seconds. Every entry is at least one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    work: u64,
    short_break: u64,
    long_break: u64,
}

impl PhaseDurations {
    /// Build a duration table, rejecting zero-length phases
    pub fn new(work: u64, short_break: u64, long_break: u64) -> Result<Self, TimerError> {
        let mut durations = Self::default();
        durations.set(Phase::Work, work)?;
        durations.set(Phase::ShortBreak, short_break)?;
        durations.set(Phase::LongBreak, long_break)?;
        Ok(durations)
    }

    /// Build a duration table from whole minutes
    pub fn from_minutes(work: u64, short_break: u64, long_break: u64) -> Result<Self, TimerError> {
        let seconds = |phase, minutes: u64| {
            minutes
                .checked_mul(60)
                .ok_or(TimerError::DurationOverflow { phase, minutes })
        };
        Self::new(
            seconds(Phase::Work, work)?,
            seconds(Phase::ShortBreak, short_break)?,
            seconds(Phase::LongBreak, long_break)?,
        )
    }

    pub fn get(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }

    pub fn set(&mut self, phase: Phase, seconds: u64) -> Result<(), TimerError> {
        if seconds == 0 {
            return Err(TimerError::ZeroDuration { phase });
        }
        match phase {
            Phase::Work => self.work = seconds,
            Phase::ShortBreak => self.short_break = seconds,
            Phase::LongBreak => self.long_break = seconds,
        }
        Ok(())
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_SECONDS,
            short_break: DEFAULT_SHORT_BREAK_SECONDS,
            long_break: DEFAULT_LONG_BREAK_SECONDS,
        }
    }
}
