//! The canonical test record.
//!
//! One [`TestRecord`] per discovered test, emitted by an idiom adapter in a
//! single traversal pass over one file. Records are plain data: adapters are
//! the only writers, and only two fields mutate after emission — `name`
//! (tag-appending idioms) and `code` (retroactive after-hook backfill).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::loc::UpdatePoint;

/// One discovered test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    /// Display name; may carry appended ` @tag` markers.
    pub name: String,
    /// Name before any tag mutation — the stable lookup key for idioms that
    /// resolve trailing annotations back to their owner.
    pub raw_name: String,
    /// Enclosing suite titles, outermost first. Empty for suite-less tests.
    pub suites: Vec<String>,
    /// Path relative to the working root, forward slashes.
    pub file: String,
    /// 1-based first line of the declaration.
    pub line: usize,
    /// 1-based last line, inclusive.
    pub end_line: usize,
    /// Source snippet: before-hook code + the test's own lines + backfilled
    /// after-hook code, per scan options.
    pub code: String,
    /// Own skip flag OR any enclosing suite's skip flag.
    pub skipped: bool,
    /// Normalized tags (leading `@` stripped).
    pub tags: BTreeSet<String>,
    /// Where an ID token may be inserted; `None` for idioms without
    /// in-place tagging for this record.
    pub update_point: Option<UpdatePoint>,
}

impl TestRecord {
    /// Full qualified name: `suite1: suite2: name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.suites.is_empty() {
            return self.name.clone();
        }
        format!("{}: {}", self.suites.join(": "), self.name)
    }

    /// The name with all `@…` tag tokens stripped and whitespace collapsed.
    #[must_use]
    pub fn stripped_name(&self) -> String {
        strip_tag_tokens(&self.name)
    }
}

/// Remove whitespace-delimited `@…` tokens from a title and collapse the
/// remaining whitespace.
#[must_use]
pub fn strip_tag_tokens(title: &str) -> String {
    title
        .split_whitespace()
        .filter(|word| !word.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ")
}
