//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: views, the container and the event loop run on the loop task
//! and must not touch the filesystem, the network or child processes.
//! Views that need data get it through a command that reports back as a
//! message.
//!
//! Configuration loading happens before the session starts and is exempt.

use std::path::Path;

use architectural_enforcement::{core_src, count_sources, report, scan_tree};

const BLOCKING_PATTERNS: &[&str] = &[
    "std::fs",
    "std::net",
    "std::process",
    "File::open",
    "File::create",
    "read_to_string(",
    "read_line(",
    "block_on(",
];

fn on_loop_task(path: &Path) -> bool {
    path.starts_with("views")
        || path == Path::new("container.rs")
        || path == Path::new("program.rs")
        || path == Path::new("view.rs")
}

#[test]
fn test_loop_code_is_scanned() {
    assert!(count_sources(&core_src().join("views")) >= 6);
}

#[test]
fn test_no_blocking_io_on_loop_task() {
    let violations = scan_tree(&core_src(), BLOCKING_PATTERNS, on_loop_task);
    report(
        "blocking I/O in view / container / loop code (use a Cmd)",
        &violations,
    );
}
