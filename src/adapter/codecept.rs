//! Annotation/tag idiom: `Feature`/`Scenario` with trailing `.tag()` chains.
//!
//! `Feature('X')` registers a flat suite running to the next registration.
//! Trailing `.tag('@x')` calls are seen before their owner in document order
//! (the tag call wraps the declaration), so they land on a pending list and
//! are resolved against emitted records by `raw_name` once the walk ends.
//! `Data(table).Scenario(...)` is the idiom's data-driven form: one record
//! spanning the table through the scenario.

use tree_sitter::{Node, Tree};

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::loc;
use crate::model::TestRecord;

use super::hooks::{backfill_after, HookSet};
use super::stack::SuiteStack;
use super::{
    dotted_chain, exclusive_error, first_string_arg, leaf_record, node_text, preorder, CallKind,
};

/// Which kind of declaration a pending tag belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagOwner {
    Feature,
    Scenario,
}

fn classify_chain(chain: &[String]) -> Option<CallKind> {
    let segments: Vec<&str> = chain.iter().map(String::as_str).collect();
    match segments.as_slice() {
        ["Feature"] => Some(CallKind::FlatSuite { skipped: false }),
        ["xFeature"] | ["Feature", "skip"] => Some(CallKind::FlatSuite { skipped: true }),
        ["Feature", "only"] => Some(CallKind::Exclusive),
        ["Scenario"] => Some(CallKind::Test { skipped: false }),
        ["xScenario"] | ["Scenario", "skip"] => Some(CallKind::Test { skipped: true }),
        ["Scenario", "only"] => Some(CallKind::Exclusive),
        ["Before"] | ["BeforeSuite"] => Some(CallKind::HookBefore),
        ["After"] | ["AfterSuite"] => Some(CallKind::HookAfter),
        _ => None,
    }
}

/// Innermost callee identifier of a call chain (`Data(t).Scenario` → `Data`).
fn innermost_base<'s>(mut call: Node<'_>, source: &'s str) -> Option<&'s str> {
    loop {
        let callee = call.child_by_field_name("function")?;
        match callee.kind() {
            "identifier" => return Some(node_text(callee, source)),
            "member_expression" => {
                let object = callee.child_by_field_name("object")?;
                match object.kind() {
                    "identifier" => return Some(node_text(object, source)),
                    "call_expression" => call = object,
                    _ => return None,
                }
            }
            "call_expression" => call = callee,
            _ => return None,
        }
    }
}

fn classify_call(node: Node<'_>, source: &str) -> Option<CallKind> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() == "member_expression" {
        let object = callee.child_by_field_name("object")?;
        if object.kind() == "call_expression" {
            let prop = callee.child_by_field_name("property")?;
            return match node_text(prop, source) {
                "tag" => Some(CallKind::Tag),
                "Scenario" if innermost_base(object, source) == Some("Data") => {
                    Some(CallKind::DataTest { skipped: false })
                }
                _ => None,
            };
        }
    }
    classify_chain(&dotted_chain(callee, source)?)
}

/// Walk backward through a `.tag()` chain to the owning declaration call.
fn tag_owner<'t>(tag_call: Node<'t>, source: &str) -> Option<(TagOwner, Node<'t>)> {
    let mut call = tag_call.child_by_field_name("function")?.child_by_field_name("object")?;
    loop {
        if call.kind() != "call_expression" {
            return None;
        }
        let callee = call.child_by_field_name("function")?;
        match callee.kind() {
            "identifier" => {
                return match node_text(callee, source) {
                    "Feature" | "xFeature" => Some((TagOwner::Feature, call)),
                    "Scenario" | "xScenario" => Some((TagOwner::Scenario, call)),
                    _ => None,
                };
            }
            "member_expression" => {
                let object = callee.child_by_field_name("object")?;
                let prop = node_text(callee.child_by_field_name("property")?, source);
                match object.kind() {
                    // A further `.tag(...)` link in the chain.
                    "call_expression" if prop == "tag" => call = object,
                    // `Data(t).Scenario(...)` — the scenario owns the tag.
                    "call_expression" if prop == "Scenario" => {
                        return Some((TagOwner::Scenario, call));
                    }
                    // `Feature.skip(...)` / `Scenario.skip(...)`.
                    "identifier" => {
                        return match node_text(object, source) {
                            "Feature" => Some((TagOwner::Feature, call)),
                            "Scenario" => Some((TagOwner::Scenario, call)),
                            _ => None,
                        };
                    }
                    _ => return None,
                }
            }
            _ => return None,
        }
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
    // (owner, raw title, normalized tag) in visitation order — outermost tag
    // of a chain first.
    let mut pending_tags: Vec<(TagOwner, String, String)> = Vec::new();

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
            CallKind::FlatSuite { skipped } => {
                let Some((title, _)) = first_string_arg(node, source) else {
                    continue;
                };
                stack.push_flat(title, skipped);
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
            CallKind::Tag => {
                let Some((tag, _)) = first_string_arg(node, source) else {
                    continue;
                };
                let Some((owner, owner_call)) = tag_owner(node, source) else {
                    continue;
                };
                let Some((raw, _)) = first_string_arg(owner_call, source) else {
                    continue;
                };
                let normalized = tag.trim_start_matches('@').to_owned();
                pending_tags.push((owner, raw, normalized));
            }
            _ => {}
        }
    }

    apply_pending_tags(&mut records, &pending_tags);
    Ok(records)
}

/// Resolve pending tags against emitted records. Reversed iteration turns
/// outermost-first visitation into source order per owner chain.
fn apply_pending_tags(records: &mut [TestRecord], pending: &[(TagOwner, String, String)]) {
    for (owner, raw, tag) in pending.iter().rev() {
        match owner {
            TagOwner::Scenario => {
                if let Some(record) = records.iter_mut().rev().find(|r| r.raw_name == *raw) {
                    record.name.push_str(&format!(" @{tag}"));
                    record.tags.insert(tag.clone());
                }
            }
            TagOwner::Feature => {
                for record in records.iter_mut() {
                    for suite in &mut record.suites {
                        if suite == raw || suite.starts_with(&format!("{raw} @")) {
                            suite.push_str(&format!(" @{tag}"));
                        }
                    }
                }
            }
        }
    }
}
