// src/taskfile/mod.rs

//! Task-file parsing.
//!
//! A task file holds one shell command per line. Lines may carry a leading
//! `[# ... #]` annotation naming the task lines this command waits for,
//! with ranges: `[#1,3-5#] ./postprocess.sh`. `#` comment lines and blank
//! lines are skipped but still count for line numbering, so annotations in
//! restart files stay valid.

pub mod parser;

pub use parser::{parse_str, TaskList};
