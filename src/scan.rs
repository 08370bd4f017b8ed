//! File discovery and per-file extraction.
//!
//! Walks every file matching the scan pattern, parses it with the dialect
//! its extension selects, runs the chosen idiom adapter, and aggregates the
//! results into a [`Decorator`].
//!
//! Per-file trouble (unreadable file, parse failure) is logged and the file
//! skipped — no partial record list is emitted for it. An exclusivity marker
//! is fatal and aborts the whole run.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::adapter::{markdown, Framework};
use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::lang::{self, Dialect};
use crate::model::{Decorator, TestRecord};

/// Scan every file matching `pattern` under `work_dir`.
pub fn scan(
    pattern: &str,
    work_dir: &Path,
    framework: Framework,
    opts: &ScanOptions,
) -> Result<Decorator, TestdexError> {
    let mut decorator = Decorator::new();

    for file in discover(pattern, work_dir)? {
        let path = work_dir.join(&file);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %file, error = %err, "unreadable file, skipping");
                continue;
            }
        };

        match scan_source(framework, &file, &source, opts) {
            Ok(records) => {
                debug!(file = %file, tests = records.len(), "scanned");
                decorator.append(records);
            }
            Err(err @ TestdexError::ExclusiveTests { .. }) => return Err(err),
            Err(err) => warn!(file = %file, error = %err, "skipping file"),
        }
    }

    Ok(decorator)
}

/// Run one framework's adapter over a single source text.
pub fn scan_source(
    framework: Framework,
    file: &str,
    source: &str,
    opts: &ScanOptions,
) -> Result<Vec<TestRecord>, TestdexError> {
    if !framework.is_tree_based() {
        return markdown::adapt(file, source, opts);
    }
    let dialect = Dialect::from_path(Path::new(file)).unwrap_or(Dialect::JavaScript);
    let tree = lang::parse(source, dialect, file)?;
    framework.adapt(&tree, file, source, opts)
}

/// Expand the glob pattern into sorted work-dir-relative paths.
fn discover(pattern: &str, work_dir: &Path) -> Result<Vec<String>, TestdexError> {
    let rooted = work_dir.join(pattern);
    let entries =
        glob::glob(&rooted.to_string_lossy()).map_err(|e| TestdexError::BadPattern {
            pattern: pattern.to_owned(),
            detail: e.to_string(),
        })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                let rel = path.strip_prefix(work_dir).unwrap_or(&path);
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "unreadable path in glob expansion"),
        }
    }
    files.sort();
    Ok(files)
}
