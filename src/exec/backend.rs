// src/exec/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The capability set the scheduler requires of any launcher: start a
//! command on an idle worker, wait for any worker to finish, and name the
//! node a worker lives on. Workers are opaque slot ids; the backend owns the
//! actual OS resources. Variants beyond the local fork backend (a
//! message-passing cluster, remote shells) implement the same trait.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;
use crate::sched::{Task, TaskId, WorkerId};

/// Trait abstracting how dispatched tasks are executed.
///
/// Production code uses [`LocalBackend`](super::LocalBackend); tests provide
/// their own implementation that doesn't spawn real processes.
pub trait WorkerBackend: Send {
    /// Start `task.command` on `worker`. Returns as soon as the command has
    /// been handed off; must not wait for the task to finish.
    fn dispatch(
        &mut self,
        worker: WorkerId,
        task: TaskSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Block until at least one worker completes and return its result.
    fn wait_any(&mut self) -> Pin<Box<dyn Future<Output = Result<Completion>> + Send + '_>>;

    /// Human-readable node name for a worker, for logging.
    fn worker_node(&self, worker: WorkerId) -> String;
}

/// What a backend needs to know to run one task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    /// 1-based task-file line, for messages.
    pub line: usize,
    pub command: String,
}

impl TaskSpec {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            line: task.line,
            command: task.command.clone(),
        }
    }
}

/// Result of one finished task, as reported by the backend.
#[derive(Debug, Clone)]
pub struct Completion {
    pub worker: WorkerId,
    pub task: TaskId,
    pub return_code: i32,
    pub hostname: String,
    pub elapsed: Duration,
}
