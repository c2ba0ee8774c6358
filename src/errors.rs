// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("no workers available; rerun fanout with more resources")]
    NoWorkers,

    #[error("worker backend error: {0}")]
    Backend(String),

    #[error("scheduler invariant violated: {0}")]
    InvariantViolation(String),

    #[error("cycle detected in dependency graph involving the task on line {0}")]
    DependencyCycle(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FanoutError>;
