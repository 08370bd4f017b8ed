//! Data-driven idiom: `describe`/`test`/`it` plus `.each` data tables.
//!
//! An `.each` combination — data table call followed by a templated
//! declaration — is one leaf: a single record per templated declaration
//! (never per data row; row expansion happens downstream), spanning from the
//! table through the declaration.

use tree_sitter::{Node, Tree};

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::loc;
use crate::model::TestRecord;

use super::hooks::{backfill_after, HookSet};
use super::stack::SuiteStack;
use super::{
    dotted_chain, exclusive_error, first_string_arg, leaf_record, preorder, CallKind,
};

/// Resolve a plain (non-`each`) call chain.
fn classify(chain: &[String]) -> Option<CallKind> {
    match chain {
        [verb] => match verb.as_str() {
            "describe" => Some(CallKind::Suite { skipped: false }),
            "xdescribe" => Some(CallKind::Suite { skipped: true }),
            "fdescribe" | "fit" => Some(CallKind::Exclusive),
            "test" | "it" => Some(CallKind::Test { skipped: false }),
            "xtest" | "xit" => Some(CallKind::Test { skipped: true }),
            "beforeAll" | "beforeEach" => Some(CallKind::HookBefore),
            "afterAll" | "afterEach" => Some(CallKind::HookAfter),
            _ => None,
        },
        [base, modifier] => {
            let is_suite = base == "describe";
            let is_test = matches!(base.as_str(), "test" | "it");
            match modifier.as_str() {
                "skip" if is_suite => Some(CallKind::Suite { skipped: true }),
                "skip" if is_test => Some(CallKind::Test { skipped: true }),
                "todo" if is_test => Some(CallKind::Test { skipped: true }),
                "failing" if is_test => Some(CallKind::Test { skipped: false }),
                "only" if is_suite || is_test => Some(CallKind::Exclusive),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Resolve the chain of an `.each` table call (everything before the final
/// `each` segment). `None` when the head is outside the vocabulary.
fn classify_each(head: &[String]) -> Option<CallKind> {
    let (base, modifier) = match head {
        [base] => (base.as_str(), None),
        [base, modifier] => (base.as_str(), Some(modifier.as_str())),
        _ => return None,
    };
    let is_suite = base == "describe" || base == "fdescribe";
    let is_test = matches!(base, "test" | "it" | "fit" | "xtest" | "xit");
    if !is_suite && !is_test {
        return None;
    }
    if base.starts_with('f') || modifier == Some("only") {
        return Some(CallKind::Exclusive);
    }
    let skipped = base.starts_with('x') || modifier == Some("skip");
    if is_suite {
        Some(CallKind::Suite { skipped })
    } else {
        Some(CallKind::DataTest { skipped })
    }
}

/// Classify one call node, looking through an `.each(table)` wrapper.
fn classify_call(node: Node<'_>, source: &str) -> Option<CallKind> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() == "call_expression" {
        // `test.each(table)(name, fn)` — the callee is the table call.
        let inner = callee.child_by_field_name("function")?;
        let chain = dotted_chain(inner, source)?;
        let (last, head) = chain.split_last()?;
        if last == "each" {
            return classify_each(head);
        }
        return None;
    }
    let chain = dotted_chain(callee, source)?;
    if chain.last().is_some_and(|s| s == "each") {
        // The bare table call; the wrapping invocation emits the record.
        return None;
    }
    classify(&chain)
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

        let Some(kind) = classify_call(node, source) else {
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
            CallKind::Test { skipped } | CallKind::DataTest { skipped } => {
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
