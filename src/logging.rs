// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The effective level is decided by, in order: the `--log-level` CLI flag,
//! the `THEMEDEV_LOG` environment variable, then a default of `info`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// Must only be called once, at startup; `fmt().init()` panics on a second
/// call.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level.map(Level::from).unwrap_or_else(env_level);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
            LogLevel::Info => Level::INFO,
        }
    }
}

fn env_level() -> Level {
    let Ok(raw) = std::env::var("THEMEDEV_LOG") else {
        return Level::INFO;
    };

    match raw.trim().to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
