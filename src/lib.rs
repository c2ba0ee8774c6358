// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod restart;
pub mod sched;
pub mod taskfile;

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::errors::Result;
use crate::exec::LocalBackend;
use crate::sched::{PoolState, RunReport, Scheduler};
use crate::taskfile::TaskList;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - task-file parsing and graph validation
/// - the worker pool and the local fork backend
/// - the scheduler loop
/// - restart-file writing and the final summary
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let cfg = config::load_or_default(args.config.as_deref())?;
    let mut settings = cfg.scheduler;

    // CLI flags win over the config file.
    if let Some(workers) = args.workers {
        settings.workers = Some(workers);
    }
    if let Some(max_retries) = args.max_retries {
        settings.max_retries = max_retries;
    }

    let source = fs::read_to_string(&args.taskfile)
        .with_context(|| format!("reading task file {:?}", args.taskfile))?;
    let list = taskfile::parse_str(&source);

    let invalid = list.invalid.len();
    if invalid > 0 {
        warn!(
            rejected = invalid,
            lines = ?list.invalid,
            "some task lines were rejected and will not run"
        );
    }

    if args.dry_run {
        print_dry_run(&list);
        return Ok(RunReport {
            invalid,
            ..RunReport::default()
        });
    }

    sched::validate_acyclic(&list)?;
    let rev_deps = sched::build_reverse_deps(&list);

    let n_workers = settings.effective_workers();
    info!(
        workers = n_workers,
        max_retries = settings.max_retries,
        tasks = list.valid.len(),
        "starting run"
    );

    let pool = if settings.cpu_binding {
        let node_cpus = settings.effective_node_cpus();
        info!(
            workers = n_workers,
            node_cpus, "creating CPU binding workers with strides"
        );
        PoolState::with_cpu_strides(n_workers, node_cpus)
    } else {
        PoolState::new(n_workers)
    };

    let backend = LocalBackend::new(n_workers);
    let mut scheduler = Scheduler::new(list, rev_deps, pool, settings.max_retries, backend);

    // Ctrl-C abandons the run; all state is in memory, so the restart file
    // below still reflects everything that finished.
    let interrupted = tokio::select! {
        res = scheduler.run_scheduler() => {
            res?;
            false
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received; abandoning the run");
            true
        }
    };

    let mut report = scheduler.report();
    report.invalid = invalid;
    report.interrupted = interrupted;

    info!(
        completed = report.completed,
        failed = report.failed,
        cancelled = report.cancelled,
        invalid = report.invalid,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "run finished"
    );

    if interrupted || restart::has_unfinished(scheduler.tasks()) {
        let path = args
            .restart_file
            .clone()
            .unwrap_or_else(|| format!("{}.rst", args.taskfile));
        restart::write_restart(Path::new(&path), &source, scheduler.tasks())?;
    }

    Ok(report)
}

/// Simple dry-run output: print tasks, deps and commands.
fn print_dry_run(list: &TaskList) {
    println!("fanout dry-run");
    println!("tasks ({}):", list.valid.len());

    for id in &list.valid {
        let Some(task) = list.tasks.get(id) else {
            continue;
        };
        println!("  - task {} (line {})", id, task.line);
        println!("      cmd: {}", task.command);
        if !task.deps.is_empty() {
            let mut deps: Vec<_> = task.deps.iter().copied().collect();
            deps.sort_unstable();
            println!("      after: {deps:?}");
        }
    }

    if !list.invalid.is_empty() {
        println!("rejected lines: {:?}", list.invalid);
    }

    debug!("dry-run complete (no execution)");
}
