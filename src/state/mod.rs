//! State management module
//! 
//! The host context that owns the timer engine, the snapshot it hands out,
//! and the remote data cached alongside it.

pub mod app_state;
pub mod remote_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use remote_state::RemoteSummary;
pub use timer_state::{format_clock, ProgressBand, TimerSnapshot};
