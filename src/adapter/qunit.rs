//! Plain call-style idiom: `QUnit.module` / `QUnit.test`.
//!
//! Module registration is usually flat — `QUnit.module('X')` names every
//! test that follows until the next registration, so the suite title lives
//! on a different node than any block. The scoped form with a callback
//! (`QUnit.module('X', function (hooks) { … })`) nests like a block suite.

use tree_sitter::Tree;

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::model::TestRecord;

use super::stack::SuiteStack;
use super::{
    dotted_chain, exclusive_error, first_string_arg, has_function_arg, leaf_record, preorder,
    CallKind,
};

fn classify(chain: &[String]) -> Option<CallKind> {
    let segments: Vec<&str> = chain.iter().map(String::as_str).collect();
    match segments.as_slice() {
        ["QUnit", "module"] | ["module"] => Some(CallKind::FlatSuite { skipped: false }),
        ["QUnit", "module", "skip"] => Some(CallKind::FlatSuite { skipped: true }),
        ["QUnit", "module", "only"] => Some(CallKind::Exclusive),
        ["QUnit", "test"] | ["test"] | ["QUnit", "todo"] => {
            Some(CallKind::Test { skipped: false })
        }
        ["QUnit", "skip"] => Some(CallKind::Test { skipped: true }),
        ["QUnit", "only"] | ["QUnit", "test", "only"] => Some(CallKind::Exclusive),
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

    for node in preorder(tree.root_node()) {
        if node.kind() != "call_expression" {
            continue;
        }
        stack.evict_before(node.start_byte());

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
            CallKind::FlatSuite { skipped } => {
                let Some((title, _)) = first_string_arg(node, source) else {
                    continue;
                };
                if has_function_arg(node) {
                    stack.push(title, skipped, node.end_byte());
                } else {
                    stack.push_flat(title, skipped);
                }
            }
            CallKind::Test { skipped } => {
                let Some((title, title_node)) = first_string_arg(node, source) else {
                    continue;
                };
                records.push(leaf_record(
                    node, title, title_node, file, source, opts, &stack, "", skipped,
                ));
            }
            _ => {}
        }
    }

    Ok(records)
}
