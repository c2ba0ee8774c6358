#![allow(dead_code)]

use std::collections::HashSet;

use fanout::sched::{Task, TaskId, TaskMap};
use fanout::taskfile::TaskList;

/// Builder for `TaskList` to simplify test setup without going through the
/// task-file parser. Tasks get dense ids in insertion order; `line` is the
/// 1-based insertion position.
pub struct TaskListBuilder {
    entries: Vec<(String, Vec<TaskId>)>,
}

impl TaskListBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a task with no dependencies.
    pub fn task(self, cmd: &str) -> Self {
        self.task_after(cmd, &[])
    }

    /// Add a task depending on the given task ids.
    pub fn task_after(mut self, cmd: &str, deps: &[TaskId]) -> Self {
        self.entries.push((cmd.to_string(), deps.to_vec()));
        self
    }

    pub fn build(self) -> TaskList {
        let mut tasks = TaskMap::new();
        let mut valid = Vec::new();

        for (id, (cmd, deps)) in self.entries.into_iter().enumerate() {
            let deps: HashSet<TaskId> = deps.into_iter().collect();
            tasks.insert(id, Task::new(id, id + 1, cmd, deps));
            valid.push(id);
        }

        TaskList {
            tasks,
            valid,
            invalid: Vec::new(),
        }
    }
}

impl Default for TaskListBuilder {
    fn default() -> Self {
        Self::new()
    }
}
