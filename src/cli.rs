// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `themedev`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "themedev",
    version,
    about = "Watch theme assets, rebuild on change, and live-reload a proxied site.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Themedev.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Themedev.toml")]
    pub config: String,

    /// Force-enable hot module replacement for the scripts pipeline.
    #[arg(long)]
    pub hmr: bool,

    /// Force-disable hot module replacement (wins over --hmr and over
    /// auto-detection from package.json).
    #[arg(long)]
    pub disable_hmr: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `THEMEDEV_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved setup, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
