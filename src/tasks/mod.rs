//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod session_sync;
pub mod ticker;

// Re-export main functions
pub use session_sync::session_sync_task;
pub use ticker::ticker_task;
