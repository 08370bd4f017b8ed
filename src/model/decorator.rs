//! Whole-run aggregation of test records.
//!
//! [`Decorator`] combines per-file record lists into run-level views: full
//! qualified names, skip lists, deduplicated suite names, and hierarchical
//! text/markdown renderings. Rendering performs a stateful walk that diffs
//! each record's suite path against the previously rendered one, so ancestor
//! suite headers are printed once, not per test.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Offender, TestdexError};
use crate::model::record::TestRecord;

// ---------------------------------------------------------------------------
// Decorator
// ---------------------------------------------------------------------------

/// Aggregated view over every record the scan produced.
#[derive(Clone, Debug, Default)]
pub struct Decorator {
    records: Vec<TestRecord>,
}

impl Decorator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append one file's records, in the order the adapter emitted them.
    pub fn append(&mut self, records: Vec<TestRecord>) {
        self.records.extend(records);
    }

    #[must_use]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Records grouped per file — the synchronizer's input shape.
    #[must_use]
    pub fn records_by_file(&self) -> BTreeMap<String, Vec<TestRecord>> {
        let mut by_file: BTreeMap<String, Vec<TestRecord>> = BTreeMap::new();
        for record in &self.records {
            by_file
                .entry(record.file.clone())
                .or_default()
                .push(record.clone());
        }
        by_file
    }

    /// Full qualified names of every non-skipped test.
    #[must_use]
    pub fn full_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.skipped)
            .map(TestRecord::full_name)
            .collect()
    }

    /// Full qualified names of every skipped test.
    #[must_use]
    pub fn skipped_full_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.skipped)
            .map(TestRecord::full_name)
            .collect()
    }

    /// Deduplicated suite titles in order of first appearance.
    ///
    /// Nested paths count as distinct suites per level.
    #[must_use]
    pub fn suite_names(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            for title in &record.suites {
                if !seen.iter().any(|s| s == title) {
                    seen.push(title.clone());
                }
            }
        }
        seen
    }

    /// Plain-text tree of suites and tests.
    #[must_use]
    pub fn text_list(&self) -> String {
        self.render(|depth, title| format!("{}{title}", "  ".repeat(depth)), |depth, name| {
            format!("{}{name}", "  ".repeat(depth))
        })
    }

    /// Markdown bullet tree of suites and tests.
    #[must_use]
    pub fn markdown_list(&self) -> String {
        self.render(
            |depth, title| format!("{}- **{title}**", "  ".repeat(depth)),
            |depth, name| format!("{}- {name}", "  ".repeat(depth)),
        )
    }

    /// Shared rendering walk: re-render only the suite-path suffix that
    /// changed since the previous record.
    fn render(
        &self,
        suite_line: impl Fn(usize, &str) -> String,
        test_line: impl Fn(usize, &str) -> String,
    ) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut prev: Vec<String> = Vec::new();

        for record in &self.records {
            let common = prev
                .iter()
                .zip(&record.suites)
                .take_while(|(a, b)| a == b)
                .count();
            for (depth, title) in record.suites.iter().enumerate().skip(common) {
                out.push(suite_line(depth, title));
            }
            out.push(test_line(record.suites.len(), &record.name));
            prev.clone_from(&record.suites);
        }

        out.join("\n")
    }

    /// Reject the aggregation if any non-skipped test's name is empty once
    /// tag tokens are stripped. All offenders are reported together.
    pub fn validate(&self) -> Result<(), TestdexError> {
        let offenders: Vec<Offender> = self
            .records
            .iter()
            .filter(|r| !r.skipped && r.stripped_name().trim().is_empty())
            .map(|r| Offender {
                file: r.file.clone(),
                line: r.line,
            })
            .collect();

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(TestdexError::EmptyTitles { offenders })
        }
    }

    /// Serializable summary for JSON output.
    #[must_use]
    pub fn report(&self) -> ScanReport {
        ScanReport {
            total: self.count(),
            tests: self.full_names(),
            skipped: self.skipped_full_names(),
            suites: self.suite_names(),
        }
    }
}

/// Run summary, serialized for `--format json`.
#[derive(Clone, Debug, Serialize)]
pub struct ScanReport {
    pub total: usize,
    pub tests: Vec<String>,
    pub skipped: Vec<String>,
    pub suites: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
