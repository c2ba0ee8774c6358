// tests/property_scheduler.rs

//! Property test: for any acyclic task list and any failure set, the
//! scheduler terminates with every task terminal and the final states
//! consistent with the dependency graph.

use std::collections::HashSet;

use proptest::prelude::*;

use fanout::sched::{build_reverse_deps, PoolState, Scheduler, TaskState};
use fanout_test_utils::builders::TaskListBuilder;
use fanout_test_utils::fake_backend::FakeBackend;

/// Generate per-task dependency lists. Acyclicity is guaranteed by only
/// allowing task `i` to depend on tasks `0..i`.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    if i == 0 {
                        return Vec::new();
                    }
                    let unique: HashSet<usize> = potential.into_iter().map(|d| d % i).collect();
                    let mut deps: Vec<usize> = unique.into_iter().collect();
                    deps.sort_unstable();
                    deps
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn final_states_are_terminal_and_consistent(
        deps in dag_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..4),
        n_workers in 1..4usize,
    ) {
        let n = deps.len();
        let failing: HashSet<usize> = failing_indices
            .into_iter()
            .filter(|&i| i < n)
            .collect();

        let mut builder = TaskListBuilder::new();
        for task_deps in &deps {
            builder = builder.task_after("cmd", task_deps);
        }
        let list = builder.build();
        let rev_deps = build_reverse_deps(&list);

        let mut backend = FakeBackend::new();
        for &f in &failing {
            backend.script(f, [1]);
        }

        let mut scheduler = Scheduler::new(
            list,
            rev_deps,
            PoolState::new(n_workers),
            0,
            backend,
        );

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(scheduler.run_scheduler()).unwrap();

        for id in 0..n {
            let state = scheduler.task_state(id).unwrap();
            prop_assert!(state.is_terminal(), "task {} ended non-terminal: {:?}", id, state);

            match state {
                TaskState::Completed => {
                    prop_assert!(!failing.contains(&id));
                    // Every parent of a completed task completed first.
                    for &p in &deps[id] {
                        prop_assert_eq!(scheduler.task_state(p), Some(TaskState::Completed));
                    }
                }
                TaskState::Failed => {
                    prop_assert!(failing.contains(&id));
                }
                TaskState::Cancelled => {
                    // Cancellation always traces back to a direct parent that
                    // failed or was itself cancelled.
                    let has_bad_parent = deps[id].iter().any(|&p| {
                        matches!(
                            scheduler.task_state(p),
                            Some(TaskState::Failed) | Some(TaskState::Cancelled)
                        )
                    });
                    prop_assert!(has_bad_parent, "task {} cancelled without a failed parent", id);
                }
                _ => unreachable!(),
            }
        }

        // All workers are back in the pool.
        prop_assert_eq!(scheduler.free_worker_count(), n_workers);
    }
}
