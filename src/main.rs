//! Pomodoro Timer - a pomodoro countdown engine with an HTTP control surface
//! 
//! This is the main entry point for the pomodoro-timer server.

use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use pomodoro_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    services::{HttpSessionApi, OfflineSessionApi},
    tasks::session_sync_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomodoro-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, work={}min, short_break={}min, long_break={}min every {}",
          config.host, config.port, config.work, config.short_break, config.long_break,
          config.long_break_interval);

    // Create application state
    let engine = config.engine()?;
    let state = Arc::new(AppState::new(config.port, config.host.clone(), engine));

    // Start the session sync background task
    let sync_state = Arc::clone(&state);
    match &config.session_api {
        Some(url) => {
            let api = HttpSessionApi::new(url, config.api_timeout())?;
            info!("Recording sessions at {}", api.base_url());
            tokio::spawn(session_sync_task(sync_state, api));
        }
        None => {
            info!("No session API configured, sessions will not be recorded");
            tokio::spawn(session_sync_task(sync_state, OfflineSessionApi));
        }
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;
    
    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start    - Start or resume the countdown");
    info!("  POST /timer/pause    - Pause the countdown");
    info!("  POST /timer/reset    - Rewind the current phase");
    info!("  PUT  /timer/duration - Change a phase duration");
    info!("  GET  /settings       - Phase durations");
    info!("  GET  /status         - Current timer state");
    info!("  GET  /events         - Server-sent timer events");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app).into_future();
    
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Failed to listen for shutdown signals: {}", e),
            }
        }
    }

    match state.pause() {
        Ok(timer) => info!("Timer stopped at {} in {} ({} work sessions done)",
                           timer.display, timer.phase, timer.completed_work_sessions),
        Err(e) => error!("Failed to stop timer: {}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}
