// src/taskfile/parser.rs

//! Task-file parser producing the loader interface the scheduler consumes.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::sched::{Task, TaskId, TaskMap};

/// Parsed task file: the task map, the ids accepted for execution in input
/// order, and the lines the parser rejected.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    pub tasks: TaskMap,
    /// Accepted task ids, in input order.
    pub valid: Vec<TaskId>,
    /// 1-based line numbers of rejected entries.
    pub invalid: Vec<usize>,
}

impl TaskList {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// One syntactically accepted line, before dependency resolution.
struct RawEntry {
    line: usize,
    command: String,
    dep_lines: Vec<usize>,
}

/// Parse a task file.
///
/// Malformed lines, references to lines that hold no valid task, and
/// self-references reject the referring entry with a warning; the rest of
/// the file still runs. Rejection cascades: a task depending on a rejected
/// line is itself rejected.
pub fn parse_str(source: &str) -> TaskList {
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut rejected: Vec<usize> = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();

        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        match split_annotation(text) {
            Ok((_, command)) if command.is_empty() => {
                warn!(line, "rejecting task line with empty command");
                rejected.push(line);
            }
            Ok((dep_lines, command)) => entries.push(RawEntry {
                line,
                command: command.to_string(),
                dep_lines,
            }),
            Err(reason) => {
                warn!(line, %reason, "rejecting malformed task line");
                rejected.push(line);
            }
        }
    }

    // Resolve dependency references against the accepted lines, cascading
    // rejection until a fixpoint: dropping one entry can invalidate others
    // that point at it.
    let mut valid_lines: HashSet<usize> = entries.iter().map(|e| e.line).collect();
    loop {
        let mut changed = false;
        for entry in &entries {
            if !valid_lines.contains(&entry.line) {
                continue;
            }
            let bad_dep = entry
                .dep_lines
                .iter()
                .find(|&&d| d == entry.line || !valid_lines.contains(&d));
            if let Some(&dep) = bad_dep {
                warn!(
                    line = entry.line,
                    dep,
                    "rejecting task with unresolvable dependency reference"
                );
                valid_lines.remove(&entry.line);
                rejected.push(entry.line);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Assign dense ids over the surviving entries, in input order.
    let id_by_line: HashMap<usize, TaskId> = entries
        .iter()
        .filter(|e| valid_lines.contains(&e.line))
        .enumerate()
        .map(|(id, e)| (e.line, id))
        .collect();

    let mut tasks = TaskMap::new();
    let mut valid = Vec::new();

    for entry in entries.iter().filter(|e| valid_lines.contains(&e.line)) {
        let Some(&id) = id_by_line.get(&entry.line) else {
            continue;
        };
        let deps: HashSet<TaskId> = entry
            .dep_lines
            .iter()
            .filter_map(|l| id_by_line.get(l).copied())
            .collect();

        tasks.insert(id, Task::new(id, entry.line, entry.command.clone(), deps));
        valid.push(id);
    }

    rejected.sort_unstable();
    rejected.dedup();

    TaskList {
        tasks,
        valid,
        invalid: rejected,
    }
}

/// Split an optional leading `[# ... #]` annotation off a task line.
fn split_annotation(text: &str) -> std::result::Result<(Vec<usize>, &str), String> {
    let Some(rest) = text.strip_prefix("[#") else {
        return Ok((Vec::new(), text));
    };

    let Some(end) = rest.find("#]") else {
        return Err("unterminated dependency annotation (missing `#]`)".into());
    };

    let deps = parse_dep_spec(&rest[..end])?;
    let command = rest[end + 2..].trim();
    Ok((deps, command))
}

/// Parse a dependency spec: comma-separated line numbers and `N-M` ranges.
fn parse_dep_spec(spec: &str) -> std::result::Result<Vec<usize>, String> {
    let mut deps = Vec::new();

    for item in spec.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        if let Some((lo, hi)) = item.split_once('-') {
            let lo = parse_line_number(lo)?;
            let hi = parse_line_number(hi)?;
            if lo > hi {
                return Err(format!("descending range {lo}-{hi}"));
            }
            deps.extend(lo..=hi);
        } else {
            deps.push(parse_line_number(item)?);
        }
    }

    Ok(deps)
}

fn parse_line_number(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid line number {s:?}"))?;
    if n == 0 {
        return Err("line numbers are 1-based".into());
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::TaskState;

    #[test]
    fn plain_commands_parse_in_order() {
        let list = parse_str("echo a\necho b\n");
        assert_eq!(list.valid, vec![0, 1]);
        assert_eq!(list.tasks[&0].command, "echo a");
        assert_eq!(list.tasks[&0].line, 1);
        assert_eq!(list.tasks[&1].line, 2);
        assert!(list.invalid.is_empty());
    }

    #[test]
    fn comments_and_blanks_keep_line_numbering() {
        let list = parse_str("# preamble\n\necho a\n[#3#] echo b\n");
        assert_eq!(list.valid.len(), 2);
        assert_eq!(list.tasks[&0].line, 3);
        assert_eq!(list.tasks[&1].line, 4);
        assert!(list.tasks[&1].deps.contains(&0));
    }

    #[test]
    fn dependency_ranges_expand() {
        let list = parse_str("echo a\necho b\necho c\n[#1-3#] echo d\n");
        let deps = &list.tasks[&3].deps;
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&0) && deps.contains(&1) && deps.contains(&2));
        assert_eq!(list.tasks[&3].state, TaskState::Blocked);
    }

    #[test]
    fn self_reference_is_rejected() {
        let list = parse_str("[#1#] echo a\necho b\n");
        assert_eq!(list.valid.len(), 1);
        assert_eq!(list.invalid, vec![1]);
    }

    #[test]
    fn reference_to_comment_line_is_rejected() {
        let list = parse_str("# not a task\n[#1#] echo a\n");
        assert!(list.valid.is_empty());
        assert_eq!(list.invalid, vec![2]);
    }

    #[test]
    fn rejection_cascades_to_dependents() {
        // Line 1 is malformed; line 2 depends on it; line 3 depends on 2.
        let list = parse_str("[#oops#] echo a\n[#1#] echo b\n[#2#] echo c\n");
        assert!(list.valid.is_empty());
        assert_eq!(list.invalid, vec![1, 2, 3]);
    }

    #[test]
    fn unterminated_annotation_is_rejected() {
        let list = parse_str("[#1 echo a\necho b\n");
        assert_eq!(list.valid.len(), 1);
        assert_eq!(list.invalid, vec![1]);
    }

    #[test]
    fn empty_annotation_means_no_deps() {
        let list = parse_str("[##] echo a\n");
        assert_eq!(list.valid.len(), 1);
        assert_eq!(list.tasks[&0].state, TaskState::Waiting);
    }

    #[test]
    fn empty_input_yields_empty_list() {
        let list = parse_str("");
        assert!(list.is_empty());
        assert!(list.invalid.is_empty());
    }
}
