//! Timer engine module
//!
//! The rendering-agnostic pomodoro state machine and the notifications it emits.

pub mod events;
pub mod phase;
pub mod timer;

pub use events::TimerEvent;
pub use phase::{Phase, PhaseDurations};
pub use timer::{TimerEngine, DEFAULT_LONG_BREAK_INTERVAL};
