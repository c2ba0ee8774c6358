// tests/local_backend.rs

//! End-to-end runs through the real fork backend with real shell commands.

#![cfg(unix)]

use fanout::exec::LocalBackend;
use fanout::sched::{build_reverse_deps, PoolState, Scheduler, TaskState};
use fanout::taskfile::parse_str;
use fanout_test_utils::{init_tracing, with_timeout};

fn local_scheduler(
    source: &str,
    n_workers: usize,
    max_retries: u32,
) -> Scheduler<LocalBackend> {
    let list = parse_str(source);
    let rev_deps = build_reverse_deps(&list);
    Scheduler::new(
        list,
        rev_deps,
        PoolState::new(n_workers),
        max_retries,
        LocalBackend::new(n_workers),
    )
}

#[tokio::test]
async fn shell_chain_completes() {
    init_tracing();

    let mut scheduler = local_scheduler("true\n[#1#] true\n[#2#] true\n", 2, 0);
    with_timeout(scheduler.run_scheduler()).await.unwrap();

    for id in 0..3 {
        assert_eq!(scheduler.task_state(id), Some(TaskState::Completed));
    }

    let task = &scheduler.tasks()[&0];
    assert_eq!(task.return_code, Some(0));
    assert!(task.elapsed.is_some());
    assert!(task.hostname.as_deref().is_some_and(|h| !h.is_empty()));
}

#[tokio::test]
async fn exit_code_is_recorded_and_cascades() {
    init_tracing();

    let mut scheduler = local_scheduler("exit 3\n[#1#] true\n", 2, 0);
    with_timeout(scheduler.run_scheduler()).await.unwrap();

    assert_eq!(scheduler.task_state(0), Some(TaskState::Failed));
    assert_eq!(scheduler.tasks()[&0].return_code, Some(3));
    assert_eq!(scheduler.task_state(1), Some(TaskState::Cancelled));
}

#[tokio::test]
async fn deterministic_failure_exhausts_retries() {
    init_tracing();

    let mut scheduler = local_scheduler("exit 1\n", 1, 1);
    with_timeout(scheduler.run_scheduler()).await.unwrap();

    assert_eq!(scheduler.task_state(0), Some(TaskState::Failed));
    assert_eq!(scheduler.tasks()[&0].retries, 1);
    assert_eq!(scheduler.tasks()[&0].return_code, Some(1));
}

#[tokio::test]
async fn independent_commands_fan_out() {
    init_tracing();

    let mut scheduler = local_scheduler("true\ntrue\ntrue\ntrue\n", 4, 0);
    with_timeout(scheduler.run_scheduler()).await.unwrap();

    for id in 0..4 {
        assert_eq!(scheduler.task_state(id), Some(TaskState::Completed));
    }
    assert_eq!(scheduler.free_worker_count(), 4);
}
