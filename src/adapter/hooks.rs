//! Hook-code aggregation.
//!
//! "Before"-class hooks (`before`, `beforeEach`, `beforeAll`, …) are
//! collected as the traversal encounters them and prepended to the code of
//! every test emitted afterwards while their scope is still active.
//!
//! "After"-class hooks attach retroactively: when the traversal reaches the
//! hook node, its snippet is appended to every already-emitted record of the
//! file — guarded by a substring containment check so revisits never
//! concatenate the same snippet twice.

use crate::model::TestRecord;

/// A collected before-class hook snippet, scoped to the suite frame that was
/// active when it was declared.
#[derive(Clone, Debug)]
struct BeforeHook {
    snippet: String,
    /// End byte of the enclosing scope; the hook stops applying past it.
    scope_end_byte: usize,
}

/// Before-hook snippets active at the current traversal position.
#[derive(Clone, Debug, Default)]
pub(crate) struct HookSet {
    before: Vec<BeforeHook>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_before(&mut self, snippet: String, scope_end_byte: usize) {
        if snippet.is_empty() {
            return;
        }
        self.before.push(BeforeHook {
            snippet,
            scope_end_byte,
        });
    }

    /// Drop hooks whose scope ended before `start_byte`.
    pub fn evict_before(&mut self, start_byte: usize) {
        self.before.retain(|h| h.scope_end_byte >= start_byte);
    }

    /// Concatenated snippets to prepend to the next emitted test, outermost
    /// declaration first.
    pub fn prelude(&self) -> String {
        self.before
            .iter()
            .map(|h| h.snippet.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Retroactively append an after-class hook snippet to already-emitted
/// records.
///
/// The guard is a substring containment check: two distinct hooks with
/// byte-identical source will skip the second attachment. Kept as-is; the
/// alternative (tracking hook node identity) buys little for real suites.
pub(crate) fn backfill_after(records: &mut [TestRecord], snippet: &str) {
    if snippet.is_empty() {
        return;
    }
    for record in records.iter_mut().rev() {
        if record.code.contains(snippet) {
            continue;
        }
        if record.code.is_empty() {
            record.code = snippet.to_owned();
        } else {
            record.code.push('\n');
            record.code.push_str(snippet);
        }
    }
}
