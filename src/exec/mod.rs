// src/exec/mod.rs

//! Worker execution layer.
//!
//! The scheduler talks to a [`WorkerBackend`] instead of spawning processes
//! itself. This keeps the core single-threaded and makes it easy to swap in
//! a fake backend in tests while keeping the production fork backend in
//! [`local`].
//!
//! - [`backend`] provides the `WorkerBackend` trait and the records that
//!   cross it.
//! - [`local`] runs tasks as local child processes with
//!   `tokio::process::Command`.

pub mod backend;
pub mod local;

pub use backend::{Completion, TaskSpec, WorkerBackend};
pub use local::LocalBackend;
