//! Architectural Enforcement
//!
//! Source scanners shared by the policy tests in `tests/`:
//! - No sleeping in the loop or view code (timers belong to commands)
//! - No blocking file, network or process I/O on the loop task
//!
//! Only production code is scanned: a file is read up to its first
//! `#[cfg(test)]`, and `//` comments are ignored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// `core/src` of the stagehand library
pub fn core_src() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("core")
        .join("src")
}

/// Numbered code lines before the test module, comments stripped
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, strip_comment(line)))
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// `line` up to its `//` comment; a `//` inside a string literal is code
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            // '"' is a char literal, not the start of a string
            b'\'' if !in_string && bytes[i + 1..].starts_with(b"\"'") => i += 2,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

/// Lines of `content` containing any of `patterns`
pub fn scan_source(path: &Path, content: &str, patterns: &[&str]) -> Vec<Violation> {
    production_lines(content)
        .into_iter()
        .filter(|(_, code)| patterns.iter().any(|p| code.contains(p)))
        .map(|(line, code)| Violation {
            path: path.to_path_buf(),
            line,
            text: code.trim().to_string(),
        })
        .collect()
}

/// Scan every `.rs` file under `root` for which `include` holds.
///
/// `include` receives the path relative to `root`.
pub fn scan_tree(
    root: &Path,
    patterns: &[&str],
    include: impl Fn(&Path) -> bool,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !include(relative) {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        violations.extend(scan_source(relative, &content, patterns));
    }
    violations
}

/// Number of `.rs` files under `root`, so policies can tell an empty scan
/// from a wrong path
pub fn count_sources(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .count()
}

/// Panic with a readable report if `violations` is not empty
pub fn report(policy: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {policy}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s) of: {policy}",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_at_test_module() {
        let src = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { std::thread::sleep(x); } }";
        assert!(scan_source(Path::new("a.rs"), src, &["sleep("]).is_empty());
    }

    #[test]
    fn test_ignores_comments() {
        let src = "// tokio::time::sleep(d)\nlet x = 1; // sleep(d)";
        assert!(scan_source(Path::new("a.rs"), src, &["sleep("]).is_empty());
    }

    #[test]
    fn test_slashes_inside_strings_are_code() {
        let src = "let u = \"https://x\"; std::fs::read(p);";
        let found = scan_source(Path::new("a.rs"), src, &["std::fs"]);
        assert_eq!(found.len(), 1);
        assert_eq!(strip_comment("let s = \"a\\\"//b\"; // note"), "let s = \"a\\\"//b\"; ");
        assert_eq!(strip_comment("let q = '\"'; // x"), "let q = '\"'; ");
    }

    #[test]
    fn test_reports_line_numbers() {
        let src = "fn a() {}\n\nfn b() { std::fs::read(p); }";
        let found = scan_source(Path::new("b.rs"), src, &["std::fs"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[0].to_string(), "b.rs:3 - fn b() { std::fs::read(p); }");
    }

    #[test]
    fn test_core_sources_are_found() {
        assert!(count_sources(&core_src()) > 0);
    }
}
