// src/logging.rs

//! Logging setup for `fanout` using `tracing` + `tracing-subscriber`.
//!
//! The level is resolved from, in order: the `--log-level` CLI flag, the
//! `FANOUT_LOG` environment variable, and finally `info`. Logs go to STDERR
//! so stdout stays free for task output.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(tracing::Level::from)
        .or_else(|| std::env::var("FANOUT_LOG").ok()?.trim().parse().ok())
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
