//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

use crate::{
    engine::{PhaseDurations, TimerEngine, DEFAULT_LONG_BREAK_INTERVAL},
    error::TimerError,
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomodoro-timer")]
#[command(about = "A pomodoro countdown served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8025")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work phase length in minutes
    #[arg(short, long, default_value = "25", value_parser = clap::value_parser!(u64).range(1..))]
    pub work: u64,

    /// Short break length in minutes
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub short_break: u64,

    /// Long break length in minutes
    #[arg(short, long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    pub long_break: u64,

    /// Completed work phases per long break
    #[arg(long, default_value_t = DEFAULT_LONG_BREAK_INTERVAL, value_parser = clap::value_parser!(u32).range(1..))]
    pub long_break_interval: u32,

    /// Base URL of the remote session API (e.g. http://localhost:5000/api).
    /// Sessions are not recorded when omitted.
    #[arg(long)]
    pub session_api: Option<String>,

    /// Session API request timeout in seconds
    #[arg(long, default_value = "5")]
    pub api_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    /// Build the engine described by these arguments
    pub fn engine(&self) -> Result<TimerEngine, TimerError> {
        let durations = PhaseDurations::from_minutes(self.work, self.short_break, self.long_break)?;
        TimerEngine::new(durations).with_long_break_interval(self.long_break_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Phase;

    #[test]
    fn defaults_build_classic_engine() {
        let config = Config::try_parse_from(["pomodoro-timer"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:8025");
        assert_eq!(config.log_level(), "info");
        assert!(config.session_api.is_none());

        let engine = config.engine().unwrap();
        assert_eq!(engine.durations().get(Phase::Work), 1500);
        assert_eq!(engine.durations().get(Phase::ShortBreak), 300);
        assert_eq!(engine.durations().get(Phase::LongBreak), 900);
        assert_eq!(engine.long_break_interval(), 4);
    }

    #[test]
    fn durations_are_given_in_minutes() {
        let config = Config::try_parse_from([
            "pomodoro-timer",
            "--work", "50",
            "--short-break", "10",
            "--long-break-interval", "3",
            "--session-api", "http://localhost:5000/api",
            "-v",
        ])
        .unwrap();
        let engine = config.engine().unwrap();
        assert_eq!(engine.remaining_seconds(), 3000);
        assert_eq!(engine.durations().get(Phase::ShortBreak), 600);
        assert_eq!(engine.long_break_interval(), 3);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn zero_minutes_are_refused() {
        assert!(Config::try_parse_from(["pomodoro-timer", "--work", "0"]).is_err());
        assert!(Config::try_parse_from(["pomodoro-timer", "--long-break-interval", "0"]).is_err());
    }

    #[test]
    fn oversized_minutes_fail_to_build_an_engine() {
        let config = Config::try_parse_from(["pomodoro-timer", "--work", "307445734561825862"]).unwrap();
        let err = config.engine().unwrap_err();
        assert!(matches!(err, TimerError::DurationOverflow { phase: Phase::Work, .. }));
        assert!(err.is_invalid_input());
    }
}
