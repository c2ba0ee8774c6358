// src/sched/state.rs

//! Ready/blocked partition and the free/busy worker pool.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{TaskId, WorkerId};

/// Mutable scheduler bookkeeping, maintained atomically per scheduler step.
///
/// Invariants:
/// - `free_workers.len() + busy.len()` equals the worker count for the run.
/// - A task id appears in at most one of {ready, blocked, busy}; terminal
///   tasks appear in none.
#[derive(Debug)]
pub struct PoolState {
    /// FIFO of task ids whose dependencies are satisfied, awaiting dispatch.
    ready: VecDeque<TaskId>,
    /// Task ids with at least one unsatisfied dependency.
    blocked: HashSet<TaskId>,
    /// FIFO of idle worker ids.
    free_workers: VecDeque<WorkerId>,
    /// Worker id -> the task it currently runs.
    busy: HashMap<WorkerId, TaskId>,
}

impl PoolState {
    /// Pool with plain worker ids `0..n_workers`.
    pub fn new(n_workers: usize) -> Self {
        Self::from_worker_ids((0..n_workers).collect())
    }

    /// Pool whose worker ids are evenly spaced CPU stride numbers.
    ///
    /// This is only desirable when CPU numbering is sequential by socket;
    /// even/odd socket numbering would give the worst possible split.
    pub fn with_cpu_strides(n_workers: usize, node_cpus: usize) -> Self {
        let ids = (0..n_workers)
            .map(|i| i * node_cpus / n_workers.max(1))
            .collect();
        Self::from_worker_ids(ids)
    }

    fn from_worker_ids(ids: VecDeque<WorkerId>) -> Self {
        Self {
            ready: VecDeque::new(),
            blocked: HashSet::new(),
            free_workers: ids,
            busy: HashMap::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.free_workers.len() + self.busy.len()
    }

    pub fn free_worker_count(&self) -> usize {
        self.free_workers.len()
    }

    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    pub fn has_free_worker(&self) -> bool {
        !self.free_workers.is_empty()
    }

    pub fn take_free_worker(&mut self) -> Option<WorkerId> {
        self.free_workers.pop_front()
    }

    /// Record that `worker` now runs `task`.
    pub fn bind(&mut self, worker: WorkerId, task: TaskId) {
        let previous = self.busy.insert(worker, task);
        debug_assert!(previous.is_none(), "worker {worker} double-bound");
    }

    /// Return `worker` to the free pool, yielding the task it was running.
    pub fn release(&mut self, worker: WorkerId) -> Option<TaskId> {
        let task = self.busy.remove(&worker)?;
        self.free_workers.push_back(worker);
        Some(task)
    }

    pub fn push_ready(&mut self, task: TaskId) {
        self.ready.push_back(task);
    }

    pub fn pop_ready(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn block(&mut self, task: TaskId) {
        self.blocked.insert(task);
    }

    pub fn unblock(&mut self, task: TaskId) -> bool {
        self.blocked.remove(&task)
    }

    pub fn has_blocked(&self) -> bool {
        !self.blocked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_conservation_across_bind_release() {
        let mut pool = PoolState::new(3);
        assert_eq!(pool.worker_count(), 3);

        let w = pool.take_free_worker().unwrap();
        pool.bind(w, 7);
        assert_eq!(pool.worker_count(), 3);
        assert_eq!(pool.busy_count(), 1);

        assert_eq!(pool.release(w), Some(7));
        assert_eq!(pool.worker_count(), 3);
        assert_eq!(pool.free_worker_count(), 3);
    }

    #[test]
    fn workers_are_handed_out_fifo() {
        let mut pool = PoolState::new(2);
        assert_eq!(pool.take_free_worker(), Some(0));
        assert_eq!(pool.take_free_worker(), Some(1));
        assert_eq!(pool.take_free_worker(), None);

        pool.bind(0, 0);
        pool.bind(1, 1);
        pool.release(1);
        pool.release(0);
        // Freed order, not numeric order.
        assert_eq!(pool.take_free_worker(), Some(1));
    }

    #[test]
    fn cpu_strides_are_evenly_spaced() {
        let mut pool = PoolState::with_cpu_strides(4, 16);
        let ids: Vec<_> = std::iter::from_fn(|| pool.take_free_worker()).collect();
        assert_eq!(ids, vec![0, 4, 8, 12]);
    }

    #[test]
    fn release_of_unknown_worker_is_none() {
        let mut pool = PoolState::new(1);
        assert_eq!(pool.release(42), None);
    }
}
