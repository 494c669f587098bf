//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep. Receivers wait on their
//! queue, senders wait on their producer; there is nothing to wait on a timer
//! for.
//! **Exceptions**: test code

use architectural_enforcement::{production_lines, report};

#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<String> = production_lines()
        .iter()
        .filter(|line| {
            line.code.contains("thread::sleep")
                || line.code.contains("time::sleep")
                || line.code.contains("sleep_until")
        })
        .map(|line| line.violation("Sleep call"))
        .collect();

    report(
        "Sleep calls found in production code",
        &violations,
        &[
            "await the next message on a channel",
            "await the next item of the producer stream",
        ],
    );
}
