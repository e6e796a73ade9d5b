//! Pomodoro Timer - a pomodoro countdown engine with an HTTP control surface
//! 
//! The [`engine`] module holds the rendering-agnostic phase state machine.
//! Everything else hosts it: a one-second ticker, event fan-out, remote
//! session bookkeeping and the HTTP endpoints renderers talk to.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Phase, PhaseDurations, TimerEngine, TimerEvent};
pub use error::{SessionApiError, TimerError};
pub use state::{AppState, RemoteSummary, TimerSnapshot};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
