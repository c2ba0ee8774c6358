// src/config/mod.rs

//! Configuration loading for `fanout`.
//!
//! - [`model`] defines the TOML-facing structures and the worker-count
//!   heuristic.
//! - [`loader`] reads a config file from disk and applies defaults.

pub mod loader;
pub mod model;

pub use loader::{default_config_path, load_from_path, load_or_default};
pub use model::{default_worker_count, reserved_cpus, ConfigFile, Settings};
