//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the channel crates:
//! - No sleep() calls in production code (wait on I/O, never on time)
//! - No panicking unwrap()/expect() in production code
//! - No blocking I/O inside async functions or async blocks
//!
//! The helpers here load production source with test modules stripped so each
//! rule only has to look at lines that ship.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories checked by every rule
pub const PRODUCTION_DIRS: &[&str] = &["channel/core/src"];

/// One line of production source
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Line text with trailing comment removed
    pub code: String,
    /// Whether the line runs in async context: an `async fn` body or an
    /// `async { }` / `async move { }` block
    pub in_async: bool,
}

impl SourceLine {
    /// `path:line - <label>: <code>` for failure output
    pub fn violation(&self, label: &str) -> String {
        format!(
            "{}:{} - {}: {}",
            self.path.display(),
            self.number,
            label,
            self.code.trim()
        )
    }
}

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("../.."))
}

/// Every non-comment production line under [`PRODUCTION_DIRS`]
pub fn production_lines() -> Vec<SourceLine> {
    let root = workspace_root();
    let mut lines = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        assert!(path.exists(), "production dir missing: {}", path.display());

        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
                collect_file(entry.path(), &mut lines);
            }
        }
    }

    lines
}

fn collect_file(path: &Path, out: &mut Vec<SourceLine>) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    out.extend(scan_source(path, &content));
}

fn scan_source(path: &Path, content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut in_async_fn = false;
    let mut depth = 0usize;
    // Brace depth at which each enclosing async block opened
    let mut async_blocks: Vec<usize> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();

        // Test modules sit at the bottom of each file
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }

        if let Some(fn_kind) = fn_declaration(trimmed) {
            in_async_fn = fn_kind == FnKind::Async;
        }

        let code = line.split("//").next().unwrap_or(line).to_string();
        if opens_async_block(&code) {
            async_blocks.push(depth);
        }
        let in_async = in_async_fn || !async_blocks.is_empty();

        depth = brace_depth_after(depth, &code);
        while async_blocks.last().is_some_and(|&opened| depth <= opened) {
            async_blocks.pop();
        }

        lines.push(SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code,
            in_async,
        });
    }

    lines
}

fn opens_async_block(code: &str) -> bool {
    code.contains("async move {") || code.contains("async {")
}

fn brace_depth_after(depth: usize, code: &str) -> usize {
    code.chars().fold(depth, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth.saturating_sub(1),
        _ => depth,
    })
}

#[derive(Debug, PartialEq, Eq)]
enum FnKind {
    Sync,
    Async,
}

fn fn_declaration(line: &str) -> Option<FnKind> {
    let is_fn = line.starts_with("fn ")
        || line.starts_with("pub fn ")
        || line.starts_with("pub(crate) fn ")
        || line.contains(" fn ");
    if !is_fn {
        return None;
    }
    if line.contains("async fn ") {
        Some(FnKind::Async)
    } else {
        Some(FnKind::Sync)
    }
}

/// Print violations and fail the test if there are any
pub fn report(rule: &str, violations: &[String], remedies: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!("\n✅ Instead:");
    for remedy in remedies {
        eprintln!("  - {remedy}");
    }

    panic!(
        "\nFound {} violation(s) of: {}\nFix these before merging!",
        violations.len(),
        rule
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_declaration_kinds() {
        assert_eq!(fn_declaration("pub async fn send("), Some(FnKind::Async));
        assert_eq!(fn_declaration("fn poll_next("), Some(FnKind::Sync));
        assert_eq!(fn_declaration("let x = 1;"), None);
    }

    #[test]
    fn test_async_block_in_sync_fn_is_async_context() {
        let source = r#"pub fn ingest() -> JoinHandle<()> {
    let setup = std::fs::read("config");
    tokio::spawn(async move {
        let bytes = std::fs::read("/nonexistent");
    })
}

fn after() {
    let fine = std::fs::read("x");
}
"#;
        let lines = scan_source(Path::new("bridge.rs"), source);
        let in_async: Vec<(usize, bool)> = lines.iter().map(|l| (l.number, l.in_async)).collect();
        assert_eq!(
            in_async,
            vec![
                (1, false),
                (2, false),
                (3, true),
                (4, true),
                (5, true),
                (6, false),
                (7, false),
                (8, false),
                (9, false),
                (10, false),
            ]
        );
    }

    #[test]
    fn test_single_line_async_block_closes() {
        let source = "fn spawn_it() {\n    tokio::spawn(async { work() });\n    let x = 1;\n}\n";
        let lines = scan_source(Path::new("x.rs"), source);
        let flags: Vec<bool> = lines.iter().map(|l| l.in_async).collect();
        assert_eq!(flags, vec![false, true, false, false]);
    }

    #[test]
    fn test_async_fn_body_is_async_context() {
        let source = "pub async fn finish(self) {\n    std::fs::read(\"x\");\n}\n";
        let lines = scan_source(Path::new("x.rs"), source);
        assert!(lines.iter().all(|l| l.in_async));
    }

    #[test]
    fn test_production_lines_found() {
        let lines = production_lines();
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| !l.code.trim_start().starts_with("#[cfg(test)]")));
    }
}
