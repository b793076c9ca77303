//! Integration Test: Sleep Prohibition
//!
//! **Policy**: nothing on the loop task may sleep. Delays are expressed as
//! commands (`Cmd::after`, `Cmd::tick`) or delayed sends, and those are the
//! only places allowed to await a timer.
//!
//! Blocking `std::thread::sleep` is forbidden everywhere in the library.

use std::path::Path;

use architectural_enforcement::{core_src, report, scan_tree};

/// Files whose spawned tasks may await `tokio::time::sleep`
const TIMER_OWNERS: &[&str] = &["command.rs", "program.rs"];

#[test]
fn test_no_async_sleep_outside_timer_owners() {
    let violations = scan_tree(
        &core_src(),
        &["::sleep(", ".sleep(", "sleep_until("],
        |path: &Path| !TIMER_OWNERS.iter().any(|owner| path == Path::new(owner)),
    );
    report(
        "sleep outside command.rs / program.rs (return a Cmd instead)",
        &violations,
    );
}

#[test]
fn test_no_thread_sleep_anywhere() {
    let violations = scan_tree(&core_src(), &["thread::sleep"], |_| true);
    report("std::thread::sleep blocks the runtime", &violations);
}
