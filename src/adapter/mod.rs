//! Idiom adapters.
//!
//! One adapter per supported test-authoring framework. Each walks one file's
//! syntax tree (or, for the tabular idiom, its lines) exactly once, in
//! document order, and emits a flat ordered list of [`TestRecord`]s.
//!
//! Call sites are classified once per node into the closed [`CallKind`]
//! enum; the traversal bodies match on that enum rather than comparing
//! identifier strings inline.

pub mod codecept;
pub mod hooks;
pub mod jest;
pub mod markdown;
pub mod mocha;
pub mod qunit;
pub mod stack;

use std::collections::BTreeSet;
use std::str::FromStr;

use tree_sitter::{Node, Tree};

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::loc;
use crate::model::TestRecord;

use stack::SuiteStack;

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

/// Supported authoring frameworks, one idiom each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Nested-suite idiom: `describe`/`it` closures.
    Mocha,
    /// Plain-call idiom: `QUnit.module`/`QUnit.test`, flat suites.
    Qunit,
    /// Data-driven idiom: `describe`/`test` plus `test.each` tables.
    Jest,
    /// Annotation idiom: `Feature`/`Scenario` with trailing `.tag()` chains.
    Codecept,
    /// Tabular-spec idiom: heading-scoped markdown, no syntax tree.
    Markdown,
}

impl Framework {
    /// Whether this idiom parses a syntax tree (vs. scanning lines).
    #[must_use]
    pub const fn is_tree_based(self) -> bool {
        !matches!(self, Self::Markdown)
    }

    /// Run this framework's adapter over a parsed tree.
    ///
    /// For [`Framework::Markdown`] call [`markdown::adapt`] directly — it
    /// has no tree to walk.
    pub fn adapt(
        self,
        tree: &Tree,
        file: &str,
        source: &str,
        opts: &ScanOptions,
    ) -> Result<Vec<TestRecord>, TestdexError> {
        match self {
            Self::Mocha => mocha::adapt(tree, file, source, opts),
            Self::Qunit => qunit::adapt(tree, file, source, opts),
            Self::Jest => jest::adapt(tree, file, source, opts),
            Self::Codecept => codecept::adapt(tree, file, source, opts),
            Self::Markdown => markdown::adapt(file, source, opts),
        }
    }
}

impl FromStr for Framework {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mocha" => Ok(Self::Mocha),
            "qunit" => Ok(Self::Qunit),
            "jest" => Ok(Self::Jest),
            "codecept" | "codeceptjs" => Ok(Self::Codecept),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => anyhow::bail!(
                "unknown framework '{s}'. Use: mocha, qunit, jest, codecept, or markdown"
            ),
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mocha => write!(f, "mocha"),
            Self::Qunit => write!(f, "qunit"),
            Self::Jest => write!(f, "jest"),
            Self::Codecept => write!(f, "codecept"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

// ---------------------------------------------------------------------------
// CallKind — closed classification of recognized call sites
// ---------------------------------------------------------------------------

/// What a recognized call site means in its idiom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallKind {
    /// Suite-opening call with a lexical block (`describe(...)`).
    Suite { skipped: bool },
    /// Suite registration without a block — scope runs to the next
    /// registration or end of file (`QUnit.module`, `Feature`).
    FlatSuite { skipped: bool },
    /// Leaf test declaration.
    Test { skipped: bool },
    /// Data-driven leaf: data table plus templated declaration, emitted as
    /// one record spanning both.
    DataTest { skipped: bool },
    /// An `.only`/focus-style marker on a suite or leaf. Always fatal.
    Exclusive,
    /// Before-class hook: snippet prepended to subsequently emitted records.
    HookBefore,
    /// After-class hook: snippet appended retroactively to emitted records.
    HookAfter,
    /// Trailing tag annotation (`.tag('@x')`).
    Tag,
}

// ---------------------------------------------------------------------------
// Shared tree helpers
// ---------------------------------------------------------------------------

/// All named nodes of the tree in document (pre-order) order.
pub(crate) fn preorder(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        out.push(node);
        for i in (0..node.named_child_count()).rev() {
            if let Some(child) = node.named_child(i) {
                pending.push(child);
            }
        }
    }
    out
}

/// Raw source text of a node.
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Flatten a callee expression into its dotted identifier chain:
/// `it` → `["it"]`, `describe.skip` → `["describe", "skip"]`,
/// `QUnit.module` → `["QUnit", "module"]`.
///
/// Returns `None` when any link is not a plain identifier — computed callees
/// are outside every idiom's vocabulary.
pub(crate) fn dotted_chain(callee: Node<'_>, source: &str) -> Option<Vec<String>> {
    let mut reversed = Vec::new();
    let mut node = callee;
    loop {
        match node.kind() {
            "identifier" => {
                reversed.push(node_text(node, source).to_owned());
                break;
            }
            "member_expression" => {
                let prop = node.child_by_field_name("property")?;
                if prop.kind() != "property_identifier" {
                    return None;
                }
                reversed.push(node_text(prop, source).to_owned());
                node = node.child_by_field_name("object")?;
            }
            _ => return None,
        }
    }
    reversed.reverse();
    Some(reversed)
}

/// The literal string value of a `string`/`template_string` node, with its
/// delimiters stripped. Template strings carrying substitutions are not
/// literals and yield `None`.
pub(crate) fn literal_value(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = node_text(node, source);
            Some(text.get(1..text.len().saturating_sub(1))?.to_owned())
        }
        "template_string" => {
            for i in 0..node.named_child_count() {
                if node.named_child(i)?.kind() == "template_substitution" {
                    return None;
                }
            }
            let text = node_text(node, source);
            Some(text.get(1..text.len().saturating_sub(1))?.to_owned())
        }
        _ => None,
    }
}

/// First argument of a call, when it is a string/template literal.
///
/// Returns the literal value together with its node (for the update point).
/// A non-literal first argument means the declaration has no stable name —
/// the caller emits no record.
pub(crate) fn first_string_arg<'t>(
    call: Node<'t>,
    source: &str,
) -> Option<(String, Node<'t>)> {
    let args = call.child_by_field_name("arguments")?;
    if args.kind() == "template_string" {
        // Tagged-template call: the template itself is the sole argument.
        return literal_value(args, source).map(|v| (v, args));
    }
    for i in 0..args.named_child_count() {
        let arg = args.named_child(i)?;
        if arg.kind() == "comment" {
            continue;
        }
        return literal_value(arg, source).map(|v| (v, arg));
    }
    None
}

/// Whether a call carries a function-valued argument (used to distinguish
/// block-scoped from flat suite registrations).
pub(crate) fn has_function_arg(call: Node<'_>) -> bool {
    let Some(args) = call.child_by_field_name("arguments") else {
        return false;
    };
    (0..args.named_child_count()).any(|i| {
        args.named_child(i).is_some_and(|arg| {
            matches!(
                arg.kind(),
                "arrow_function" | "function_expression" | "function" | "generator_function"
            )
        })
    })
}

/// Fatal exclusivity error for a marked node.
pub(crate) fn exclusive_error(file: &str, node: Node<'_>) -> TestdexError {
    TestdexError::ExclusiveTests {
        file: file.to_owned(),
        line: node.start_position().row + 1,
    }
}

/// Assemble a leaf record at the current traversal state.
#[allow(clippy::too_many_arguments)]
pub(crate) fn leaf_record(
    span_node: Node<'_>,
    title: String,
    title_node: Node<'_>,
    file: &str,
    source: &str,
    opts: &ScanOptions,
    stack: &SuiteStack,
    prelude: &str,
    skipped: bool,
) -> TestRecord {
    let range = loc::line_range(span_node);
    let own = if opts.line_numbers {
        loc::snippet_numbered(source, range)
    } else {
        loc::snippet(source, range)
    };
    let code = if prelude.is_empty() {
        own
    } else if own.is_empty() {
        prelude.to_owned()
    } else {
        format!("{prelude}\n{own}")
    };
    let (line, end_line) = range.unwrap_or((1, 1));

    TestRecord {
        name: title.clone(),
        raw_name: title,
        suites: stack.titles(),
        file: file.to_owned(),
        line,
        end_line,
        code,
        skipped: skipped || stack.any_skipped(),
        tags: BTreeSet::new(),
        update_point: Some(loc::update_point(title_node)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
