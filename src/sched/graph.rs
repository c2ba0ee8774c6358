// src/sched/graph.rs

//! Reverse-dependency index and load-time graph validation.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{FanoutError, Result};
use crate::taskfile::TaskList;

use super::TaskId;

/// For each task id, the tasks that declared it as a dependency, in input
/// order. Built once at load time and never mutated afterwards; during the
/// run only the children's own forward `deps` sets are drained.
pub type ReverseDeps = HashMap<TaskId, Vec<TaskId>>;

/// Build the reverse index from the forward `deps` of each task.
///
/// Children are visited in `valid` (input) order, so each entry lists
/// dependents in insertion order.
pub fn build_reverse_deps(list: &TaskList) -> ReverseDeps {
    let mut rev: ReverseDeps = HashMap::new();

    for &id in &list.valid {
        let Some(task) = list.tasks.get(&id) else {
            continue;
        };
        for &parent in &task.deps {
            rev.entry(parent).or_default().push(id);
        }
    }

    // Each child's dep set is unordered; keep every dependent list in input
    // order regardless of which parent entry it landed in.
    for children in rev.values_mut() {
        children.sort_unstable();
    }

    rev
}

/// Validate that the dependency graph is acyclic.
///
/// Edge direction: parent -> child. A topological sort fails exactly when
/// there is a cycle.
pub fn validate_acyclic(list: &TaskList) -> Result<()> {
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for &id in &list.valid {
        graph.add_node(id);
    }

    for (&id, task) in &list.tasks {
        for &parent in &task.deps {
            graph.add_edge(parent, id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let id = cycle.node_id();
            let line = list.tasks.get(&id).map(|t| t.line).unwrap_or(0);
            Err(FanoutError::DependencyCycle(line))
        }
    }
}
