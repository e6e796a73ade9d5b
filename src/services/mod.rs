//! External service module
//! 
//! Clients for the remote session API that records completed work phases.

pub mod session_api;

// Re-export main types
pub use session_api::{CompletionOutcome, HttpSessionApi, OfflineSessionApi, SessionApi};
