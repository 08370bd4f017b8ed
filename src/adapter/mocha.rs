//! Nested-suite idiom: `describe`/`context`/`suite` blocks with `it`/
//! `specify`/`test` leaves, `.skip`/`.only` modifiers, `x`-prefixed skip
//! aliases, and `before`/`after`(`Each`) hooks.

use tree_sitter::Tree;

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::loc;
use crate::model::TestRecord;

use super::hooks::{backfill_after, HookSet};
use super::stack::SuiteStack;
use super::{
    dotted_chain, exclusive_error, first_string_arg, leaf_record, preorder, CallKind,
};

/// Resolve one call chain into this idiom's vocabulary.
fn classify(chain: &[String]) -> Option<CallKind> {
    match chain {
        [verb] => match verb.as_str() {
            "describe" | "context" | "suite" => Some(CallKind::Suite { skipped: false }),
            "xdescribe" | "xcontext" => Some(CallKind::Suite { skipped: true }),
            "it" | "specify" | "test" => Some(CallKind::Test { skipped: false }),
            "xit" | "xspecify" => Some(CallKind::Test { skipped: true }),
            "before" | "beforeEach" | "setup" | "suiteSetup" => Some(CallKind::HookBefore),
            "after" | "afterEach" | "teardown" | "suiteTeardown" => Some(CallKind::HookAfter),
            _ => None,
        },
        [base, modifier] => {
            let is_suite = matches!(base.as_str(), "describe" | "context" | "suite");
            let is_test = matches!(base.as_str(), "it" | "specify" | "test");
            match modifier.as_str() {
                "skip" if is_suite => Some(CallKind::Suite { skipped: true }),
                "skip" if is_test => Some(CallKind::Test { skipped: true }),
                "only" if is_suite || is_test => Some(CallKind::Exclusive),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Walk one file's tree and emit its test records.
pub fn adapt(
    tree: &Tree,
    file: &str,
    source: &str,
    opts: &ScanOptions,
) -> Result<Vec<TestRecord>, TestdexError> {
    let mut records: Vec<TestRecord> = Vec::new();
    let mut stack = SuiteStack::new();
    let mut hooks = HookSet::new();

    for node in preorder(tree.root_node()) {
        if node.kind() != "call_expression" {
            continue;
        }
        stack.evict_before(node.start_byte());
        hooks.evict_before(node.start_byte());

        let Some(callee) = node.child_by_field_name("function") else {
            continue;
        };
        let Some(chain) = dotted_chain(callee, source) else {
            continue;
        };
        let Some(kind) = classify(&chain) else {
            continue;
        };

        match kind {
            CallKind::Exclusive => return Err(exclusive_error(file, node)),
            CallKind::Suite { skipped } => {
                let Some((title, _)) = first_string_arg(node, source) else {
                    continue;
                };
                stack.push(title, skipped, node.end_byte());
            }
            CallKind::Test { skipped } => {
                let Some((title, title_node)) = first_string_arg(node, source) else {
                    continue;
                };
                let prelude = if opts.include_hooks {
                    hooks.prelude()
                } else {
                    String::new()
                };
                records.push(leaf_record(
                    node, title, title_node, file, source, opts, &stack, &prelude, skipped,
                ));
            }
            CallKind::HookBefore if opts.include_hooks => {
                let snippet = loc::snippet(source, loc::line_range(node));
                hooks.push_before(snippet, stack.scope_end_byte(source.len()));
            }
            CallKind::HookAfter if opts.include_hooks => {
                let snippet = loc::snippet(source, loc::line_range(node));
                backfill_after(&mut records, &snippet);
            }
            _ => {}
        }
    }

    Ok(records)
}
