//! Shared test helpers for testdex integration tests.
//!
//! All tests run against temp directories — no side effects on the real
//! tree. Each test builds its own fixture of source files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Create a temp tree with the given `(relative path, content)` files.
pub fn fixture_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    for (rel, content) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dirs");
        }
        fs::write(&path, content).expect("failed to write fixture file");
    }
    dir
}

/// Read a fixture file back.
#[allow(dead_code)]
pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).expect("failed to read fixture file")
}

/// Overwrite a fixture file.
#[allow(dead_code)]
pub fn write(root: &Path, rel: &str, content: &str) {
    fs::write(root.join(rel), content).expect("failed to write fixture file");
}
