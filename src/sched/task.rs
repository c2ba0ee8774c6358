// src/sched/task.rs

//! Task record and per-task state machine.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::TaskId;

/// State a task traverses between parsing and the end of the run.
///
/// Allowed transitions:
/// - `Waiting → Running` (dispatch)
/// - `Blocked → Waiting` (last dependency completed)
/// - `Running → Running` (retry)
/// - `Running → Completed | Failed`
/// - `Blocked → Cancelled` (an ancestor failed or was cancelled)
///
/// `Completed`, `Failed`, and `Cancelled` are terminal; there is no
/// transition out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Dependencies satisfied, not yet dispatched.
    Waiting,
    /// At least one dependency unsatisfied.
    Blocked,
    /// Bound to a worker.
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// A single shell command with its dependencies and runtime state.
///
/// The forward `deps` set is drained as parents complete; the reverse index
/// in [`graph`](super::graph) is never touched after load.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    /// 1-based line number in the input, for human messages.
    pub line: usize,
    pub command: String,
    /// Ids of the tasks this one waits for.
    pub deps: HashSet<TaskId>,
    pub state: TaskState,
    pub retries: u32,
    pub return_code: Option<i32>,
    pub hostname: Option<String>,
    pub elapsed: Option<Duration>,
}

impl Task {
    pub fn new(id: TaskId, line: usize, command: String, deps: HashSet<TaskId>) -> Self {
        let state = if deps.is_empty() {
            TaskState::Waiting
        } else {
            TaskState::Blocked
        };
        Self {
            id,
            line,
            command,
            deps,
            state,
            retries: 0,
            return_code: None,
            hostname: None,
            elapsed: None,
        }
    }

    /// Transition to `next`, enforcing that terminal states are monotonic.
    pub fn set_state(&mut self, next: TaskState) {
        debug_assert!(
            !self.state.is_terminal() || self.state == next,
            "task {} would leave terminal state {:?} for {:?}",
            self.id,
            self.state,
            next
        );
        self.state = next;
    }

    pub fn has_deps(&self) -> bool {
        !self.deps.is_empty()
    }

    pub fn remove_dep(&mut self, parent: TaskId) {
        self.deps.remove(&parent);
    }
}

/// Id-indexed map owning every task; all other structures hold ids only.
pub type TaskMap = HashMap<TaskId, Task>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_task_without_deps_is_waiting() {
        let t = Task::new(0, 1, "echo hi".into(), HashSet::new());
        assert_eq!(t.state, TaskState::Waiting);
    }

    #[test]
    fn new_task_with_deps_is_blocked() {
        let t = Task::new(1, 2, "echo hi".into(), HashSet::from([0]));
        assert_eq!(t.state, TaskState::Blocked);
        assert!(t.has_deps());
    }

    #[test]
    fn draining_deps_does_not_change_state_by_itself() {
        let mut t = Task::new(1, 2, "echo hi".into(), HashSet::from([0]));
        t.remove_dep(0);
        assert!(!t.has_deps());
        assert_eq!(t.state, TaskState::Blocked);
    }

    #[test]
    fn terminal_states_are_terminal() {
        for s in [TaskState::Completed, TaskState::Failed, TaskState::Cancelled] {
            assert!(s.is_terminal());
        }
        for s in [TaskState::Waiting, TaskState::Blocked, TaskState::Running] {
            assert!(!s.is_terminal());
        }
    }
}
