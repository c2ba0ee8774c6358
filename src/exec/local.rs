// src/exec/local.rs

//! Local fork backend.
//!
//! Runs each dispatched task as a child process on the local node. A
//! dispatch spawns the process on a Tokio task and returns immediately;
//! completions are queued on an mpsc channel that `wait_any` drains one at
//! a time. Since at most one task runs per worker slot, the channel never
//! holds more than the worker count.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{FanoutError, Result};
use crate::sched::WorkerId;

use super::backend::{Completion, TaskSpec, WorkerBackend};

/// Worker backend forking local child processes.
pub struct LocalBackend {
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    hostname: String,
}

impl LocalBackend {
    pub fn new(n_workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Completion>(n_workers.max(1));
        Self {
            tx,
            rx,
            hostname: local_hostname(),
        }
    }
}

impl WorkerBackend for LocalBackend {
    fn dispatch(
        &mut self,
        worker: WorkerId,
        task: TaskSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        let hostname = self.hostname.clone();

        Box::pin(async move {
            tokio::spawn(run_command(worker, task, hostname, tx));
            Ok(())
        })
    }

    fn wait_any(&mut self) -> Pin<Box<dyn Future<Output = Result<Completion>> + Send + '_>> {
        Box::pin(async move {
            self.rx
                .recv()
                .await
                .ok_or_else(|| FanoutError::Backend("completion channel closed".into()))
        })
    }

    fn worker_node(&self, _worker: WorkerId) -> String {
        // All workers of the fork backend live on the local node.
        self.hostname.clone()
    }
}

/// Run one task process to completion and queue its result.
async fn run_command(
    worker: WorkerId,
    task: TaskSpec,
    hostname: String,
    tx: mpsc::Sender<Completion>,
) {
    info!(
        task = task.id,
        line = task.line,
        worker,
        cmd = %task.command,
        "starting task process"
    );

    let started = Instant::now();

    // Build a shell command appropriate for the platform. Task stdout and
    // stderr pass straight through; fanout's own logs go to stderr.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.command);
        c
    };

    let return_code = match cmd.status().await {
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            debug!(
                task = task.id,
                worker,
                exit_code = code,
                success = status.success(),
                "task process exited"
            );
            code
        }
        Err(err) => {
            error!(
                task = task.id,
                worker,
                error = %err,
                "failed to run task process"
            );
            -1
        }
    };

    let done = Completion {
        worker,
        task: task.id,
        return_code,
        hostname,
        elapsed: started.elapsed(),
    };

    // The receiver only disappears when the run is abandoned.
    if tx.send(done).await.is_err() {
        debug!(task = task.id, worker, "scheduler gone; dropping completion");
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
