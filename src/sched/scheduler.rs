// src/sched/scheduler.rs

//! The scheduling loop.
//!
//! The scheduler owns all mutable state (task map, reverse index, ready and
//! blocked partitions, worker pool) and drives it single-threaded. Workers
//! run tasks out-of-process behind the [`WorkerBackend`] seam; the only
//! suspension point where the loop waits on them is
//! [`Scheduler::wait_for_any_worker`].

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::errors::{FanoutError, Result};
use crate::exec::{TaskSpec, WorkerBackend};
use crate::taskfile::TaskList;

use super::graph::ReverseDeps;
use super::state::PoolState;
use super::task::{TaskMap, TaskState};
use super::TaskId;

/// Final tally of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Task-file lines the parser rejected.
    pub invalid: usize,
    /// Wall-clock time of the scheduling loop.
    pub elapsed: Duration,
    pub interrupted: bool,
}

/// Dependency-aware scheduler, generic over the worker backend.
pub struct Scheduler<B: WorkerBackend> {
    tasks: TaskMap,
    /// Ids to execute, in input order.
    valid: Vec<TaskId>,
    rev_deps: ReverseDeps,
    pool: PoolState,
    max_retries: u32,
    backend: B,
    elapsed: Option<Duration>,
}

impl<B: WorkerBackend> std::fmt::Debug for Scheduler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pool", &self.pool)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<B: WorkerBackend> Scheduler<B> {
    pub fn new(
        list: TaskList,
        rev_deps: ReverseDeps,
        pool: PoolState,
        max_retries: u32,
        backend: B,
    ) -> Self {
        Self {
            tasks: list.tasks,
            valid: list.valid,
            rev_deps,
            pool,
            max_retries,
            backend,
            elapsed: None,
        }
    }

    /// Execute every valid task, honoring dependencies, retry policy, and
    /// failure propagation. On return all valid tasks are in a terminal
    /// state.
    ///
    /// Per-task failures are data, recorded on the tasks; only structural
    /// problems (no workers, backend failure) surface as errors.
    pub async fn run_scheduler(&mut self) -> Result<()> {
        if self.pool.worker_count() == 0 {
            return Err(FanoutError::NoWorkers);
        }

        let started = Instant::now();
        self.classify_initial();

        while self.pool.has_ready() || self.pool.has_blocked() {
            while self.pool.has_ready() {
                if self.pool.has_free_worker() {
                    if let Some(id) = self.pool.pop_ready() {
                        self.allocate(id).await?;
                    }
                } else {
                    // All workers busy; a completion may also enqueue more
                    // ready tasks.
                    self.wait_for_any_worker().await?;
                }
            }

            if self.pool.has_blocked() {
                // Nothing schedulable right now, but unfinished parents
                // still hold blocks on the remaining tasks.
                self.wait_for_any_worker().await?;
            }
        }

        // Everything is allocated or finished; reap the last generation.
        while self.pool.free_worker_count() < self.pool.worker_count() {
            self.wait_for_any_worker().await?;
        }

        self.elapsed = Some(started.elapsed());
        Ok(())
    }

    /// Seed the ready queue and blocked set from the parsed task states, in
    /// input order.
    fn classify_initial(&mut self) {
        for id in self.valid.clone() {
            match self.tasks.get(&id).map(|t| t.state) {
                Some(TaskState::Waiting) => self.pool.push_ready(id),
                Some(TaskState::Blocked) => self.pool.block(id),
                other => debug_assert!(false, "task {id} in unexpected initial state {other:?}"),
            }
        }
    }

    /// Bind a ready task to the head of the free-worker FIFO and hand its
    /// command to the backend. Does not wait for the task.
    async fn allocate(&mut self, id: TaskId) -> Result<()> {
        let worker = self.pool.take_free_worker().ok_or_else(|| {
            FanoutError::InvariantViolation(format!("allocate of task {id} with no free workers"))
        })?;

        let spec = {
            let task = self.tasks.get_mut(&id).ok_or_else(|| {
                FanoutError::InvariantViolation(format!("allocate of unknown task {id}"))
            })?;
            debug_assert!(task.deps.is_empty(), "task {id} allocated with unsatisfied deps");
            task.set_state(TaskState::Running);
            TaskSpec::from_task(task)
        };

        debug!(
            task = id,
            line = spec.line,
            worker,
            node = %self.backend.worker_node(worker),
            "allocating task"
        );

        self.pool.bind(worker, id);
        self.backend.dispatch(worker, spec).await
    }

    /// Block until one running task completes, then record its result and
    /// run the epilogue.
    async fn wait_for_any_worker(&mut self) -> Result<()> {
        if self.pool.busy_count() == 0 {
            return Err(FanoutError::InvariantViolation(
                "wait_for_any_worker with no busy workers".into(),
            ));
        }

        let done = self.backend.wait_any().await?;

        let bound = self.pool.release(done.worker).ok_or_else(|| {
            FanoutError::InvariantViolation(format!(
                "completion from worker {} which has no bound task",
                done.worker
            ))
        })?;
        if bound != done.task {
            return Err(FanoutError::InvariantViolation(format!(
                "worker {} reported task {} but was bound to task {}",
                done.worker, done.task, bound
            )));
        }

        if let Some(task) = self.tasks.get_mut(&done.task) {
            task.return_code = Some(done.return_code);
            task.hostname = Some(done.hostname);
            task.elapsed = Some(done.elapsed);
        }

        self.task_epilogue(done.task).await
    }

    /// Classify a just-completed task and propagate the consequences.
    async fn task_epilogue(&mut self, id: TaskId) -> Result<()> {
        let Some(task) = self.tasks.get(&id) else {
            return Err(FanoutError::InvariantViolation(format!(
                "epilogue for unknown task {id}"
            )));
        };
        let line = task.line;
        let rc = task.return_code.unwrap_or(-1);
        let retries = task.retries;
        let node = task.hostname.clone().unwrap_or_default();
        let elapsed_secs = task.elapsed.unwrap_or_default().as_secs_f64();

        if rc == 0 {
            info!(task = id, line, node = %node, elapsed_secs, "task completed successfully");
            if let Some(task) = self.tasks.get_mut(&id) {
                task.set_state(TaskState::Completed);
            }
            self.update_dependencies(id);
            return Ok(());
        }

        error!(
            task = id,
            line,
            exit_code = rc,
            node = %node,
            elapsed_secs,
            "task failed"
        );

        if retries < self.max_retries {
            warn!(
                task = id,
                line,
                retry = retries + 1,
                max_retries = self.max_retries,
                "retrying failed task"
            );
            if let Some(task) = self.tasks.get_mut(&id) {
                task.retries += 1;
            }
            // Retrying on the spot keeps the logical slot away from
            // dependents until the retry budget is exhausted. The worker
            // that just completed is back in the free pool; `allocate`
            // errors out if that ever stops holding.
            self.allocate(id).await
        } else {
            if let Some(task) = self.tasks.get_mut(&id) {
                task.set_state(TaskState::Failed);
            }
            self.update_dependencies(id);
            Ok(())
        }
    }

    /// Propagate a terminal parent state to every dependent.
    ///
    /// A completed parent drains forward dep sets and promotes children that
    /// become free; a failed or cancelled parent cancels children
    /// transitively. Children already in a terminal state are skipped, which
    /// makes multi-parent cancellation idempotent.
    fn update_dependencies(&mut self, parent: TaskId) {
        let parent_state = match self.tasks.get(&parent) {
            Some(t) => t.state,
            None => return,
        };
        debug_assert!(parent_state.is_terminal());

        let Some(children) = self.rev_deps.get(&parent) else {
            debug!(task = parent, "no dependent tasks; no update done");
            return;
        };
        // The reverse index is never mutated after load; only each child's
        // own forward dep set is touched below, so iterating a clone of this
        // entry stays sound while cancellations recurse.
        let children = children.clone();

        for child in children {
            match parent_state {
                TaskState::Completed => {
                    let newly_ready = {
                        let Some(c) = self.tasks.get_mut(&child) else {
                            warn!(task = child, "dependent task missing from task map");
                            continue;
                        };
                        if c.state.is_terminal() {
                            continue;
                        }
                        c.remove_dep(parent);
                        if c.has_deps() {
                            false
                        } else {
                            c.set_state(TaskState::Waiting);
                            true
                        }
                    };

                    if newly_ready {
                        self.pool.unblock(child);
                        self.pool.push_ready(child);
                        debug!(task = child, "all dependencies satisfied; moving to ready queue");
                    } else {
                        debug!(task = child, "still has unsatisfied dependencies; leaving blocked");
                    }
                }
                TaskState::Failed | TaskState::Cancelled => {
                    {
                        let Some(c) = self.tasks.get_mut(&child) else {
                            warn!(task = child, "dependent task missing from task map");
                            continue;
                        };
                        if c.state.is_terminal() {
                            continue;
                        }
                        warn!(
                            task = child,
                            line = c.line,
                            parent,
                            "cancelling task because its parent failed"
                        );
                        c.set_state(TaskState::Cancelled);
                    }
                    self.pool.unblock(child);
                    self.update_dependencies(child);
                }
                _ => debug_assert!(false, "update_dependencies on non-terminal parent"),
            }
        }
    }

    /// Final tally over the valid set. `invalid` and `interrupted` are the
    /// caller's to fill in.
    pub fn report(&self) -> RunReport {
        let mut report = RunReport {
            elapsed: self.elapsed.unwrap_or_default(),
            ..RunReport::default()
        };

        for id in &self.valid {
            match self.tasks.get(id).map(|t| t.state) {
                Some(TaskState::Completed) => report.completed += 1,
                Some(TaskState::Failed) => report.failed += 1,
                Some(TaskState::Cancelled) => report.cancelled += 1,
                _ => {}
            }
        }

        report
    }

    /// Read-only view of the task map, e.g. for the restart writer.
    pub fn tasks(&self) -> &TaskMap {
        &self.tasks
    }

    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.tasks.get(&id).map(|t| t.state)
    }

    pub fn free_worker_count(&self) -> usize {
        self.pool.free_worker_count()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}
