// src/restart.rs

//! Restart-file writer.
//!
//! After a run that leaves unfinished work, the original task file is
//! rewritten so it can be fed back to `fanout`: completed tasks are
//! commented out, every other line keeps its exact position. Line numbers
//! never shift, so `[#N#]` annotations remain valid; per-task outcome notes
//! go into a trailing comment block instead.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::errors::Result;
use crate::sched::{Task, TaskMap, TaskState};

/// Write a restart file for `source` reflecting the final task states.
pub fn write_restart(path: &Path, source: &str, tasks: &TaskMap) -> Result<()> {
    let contents = render_restart(source, tasks);
    fs::write(path, contents).with_context(|| format!("writing restart file {path:?}"))?;
    info!(path = %path.display(), "restart file written");
    Ok(())
}

/// Render the restart file contents.
pub fn render_restart(source: &str, tasks: &TaskMap) -> String {
    let by_line: HashMap<usize, &Task> = tasks.values().map(|t| (t.line, t)).collect();

    let mut out = String::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        match by_line.get(&line) {
            Some(task) if task.state == TaskState::Completed => {
                out.push_str("# done: ");
                out.push_str(raw);
            }
            _ => out.push_str(raw),
        }
        out.push('\n');
    }

    // Outcome notes go after the body so line numbers stay untouched.
    let mut notes: Vec<(usize, String)> = Vec::new();
    for task in tasks.values() {
        match task.state {
            TaskState::Failed => {
                let rc = task.return_code.unwrap_or(-1);
                notes.push((task.line, format!("# line {}: failed (exit {rc})", task.line)));
            }
            TaskState::Cancelled => {
                notes.push((task.line, format!("# line {}: cancelled", task.line)));
            }
            _ => {}
        }
    }

    if !notes.is_empty() {
        notes.sort_unstable();
        out.push_str("#\n# previous run:\n");
        for (_, note) in notes {
            out.push_str(&note);
            out.push('\n');
        }
    }

    out
}

/// Whether a restart file is worth writing: any valid task not completed.
pub fn has_unfinished(tasks: &TaskMap) -> bool {
    tasks.values().any(|t| t.state != TaskState::Completed)
}
