//! Integration Test: Panicking Unwrap Prohibition
//!
//! **Policy**: Production code propagates errors. A malformed frame or a
//! failing producer must surface as a `ChannelError`, never as a panic.
//! **Exceptions**: test code

use architectural_enforcement::{production_lines, report};

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations: Vec<String> = production_lines()
        .iter()
        .filter(|line| line.code.contains(".unwrap()") || line.code.contains(".expect("))
        .map(|line| line.violation("Panicking call"))
        .collect();

    report(
        "unwrap()/expect() found in production code",
        &violations,
        &[
            "return a Result and use `?`",
            "map the failure into ChannelError / TransportError / ConfigError",
            "use unwrap_or / unwrap_or_else with a real fallback",
        ],
    );
}

#[test]
fn test_no_panic_macros_in_production_code() {
    let violations: Vec<String> = production_lines()
        .iter()
        .filter(|line| {
            line.code.contains("panic!(")
                || line.code.contains("todo!(")
                || line.code.contains("unimplemented!(")
        })
        .map(|line| line.violation("Panic macro"))
        .collect();

    report(
        "panic macros found in production code",
        &violations,
        &["return an error variant"],
    );
}
