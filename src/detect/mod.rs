//! A small pluggable secret-detection contract. The exact ruleset is out of
//! scope; this only needs to be good enough to drive the pipeline and its
//! tests end to end.

pub mod rules;

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSecret {
    pub secret: String,
    pub start_line: i64,
    pub end_line: i64,
    pub file: String,
    pub rule_id: String,
}

pub trait SecretDetector: Send + Sync {
    /// Scans a single in-memory fragment (e.g. one file's contents at one
    /// commit).
    fn detect(&self, file: &str, contents: &str) -> Vec<DetectedSecret>;

    /// Walks a directory tree and scans every regular file it contains.
    fn detect_dir(&self, root: &Path) -> Vec<DetectedSecret> {
        let mut findings = Vec::new();
        walk(root, root, &mut |rel_path, contents| {
            findings.extend(self.detect(rel_path, contents));
        });
        findings
    }
}

fn walk(root: &Path, dir: &Path, visit: &mut impl FnMut(&str, &str)) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
                continue;
            }
            walk(root, &path, visit);
        } else if let Ok(contents) = std::fs::read_to_string(&path) {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            visit(&rel, &contents);
        }
    }
}

pub use rules::RegexDetector;
