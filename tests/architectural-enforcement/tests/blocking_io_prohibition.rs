//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions MUST NOT use blocking I/O.
//! **Required**: Use `tokio::io`, `tokio::net`, `tokio::fs` inside async code.
//! **Acceptable**: blocking calls in non-async functions, such as config
//! loading before the runtime starts.

use architectural_enforcement::{production_lines, report};

const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("std::io::Read", "Blocking read trait"),
    ("std::io::Write", "Blocking write trait"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for line in production_lines().iter().filter(|l| l.in_async) {
        for (pattern, label) in BLOCKING_PATTERNS {
            if line.code.contains(pattern) {
                violations.push(line.violation(label));
            }
        }
    }

    report(
        "Blocking I/O found in async production code",
        &violations,
        &[
            "tokio::io::AsyncReadExt / AsyncWriteExt",
            "tokio::fs::read_to_string().await",
            "move the call into a non-async function that runs before the runtime",
        ],
    );
}
