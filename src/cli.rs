// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `fanout`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fanout",
    version,
    about = "Run a file of shell tasks across a fixed pool of workers, honoring dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (one shell command per line, optional
    /// `[#1,3-5#]` dependency annotations referring to task line numbers).
    #[arg(value_name = "TASKFILE")]
    pub taskfile: String,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Fanout.toml` in the current working directory is used
    /// when it exists; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Number of workers.
    ///
    /// Overrides the config file. If neither is given, the count is derived
    /// from the reserved CPUs of the allocation.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Maximum retries for a failing task before it is marked failed.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FANOUT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task list, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Where to write the restart file when the run leaves unfinished tasks.
    ///
    /// Default: `<TASKFILE>.rst`.
    #[arg(long, value_name = "PATH")]
    pub restart_file: Option<String>,
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

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
