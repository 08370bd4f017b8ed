//! Position and text utilities.
//!
//! Pure, stateless helpers shared by the idiom adapters and the identifier
//! synchronizer: line-range extraction, source snippet slicing, update-point
//! computation, and position-exact insertion/removal of ID tokens.
//!
//! All line numbers are 1-based and inclusive. Columns are byte offsets
//! within a line, as reported by tree-sitter.

use tree_sitter::Node;

// ---------------------------------------------------------------------------
// UpdatePoint
// ---------------------------------------------------------------------------

/// Exact position in the *original* source where an ID token may be inserted:
/// immediately after the last character of a title string, before its closing
/// delimiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct UpdatePoint {
    /// 1-based line.
    pub line: usize,
    /// Byte offset within the line.
    pub column: usize,
}

// ---------------------------------------------------------------------------
// Line ranges and snippets
// ---------------------------------------------------------------------------

/// 1-based inclusive line range of a node.
///
/// Returns `None` for a degenerate range — callers must treat `None` as
/// "no snippet" rather than slicing the whole file.
#[must_use]
pub fn line_range(node: Node<'_>) -> Option<(usize, usize)> {
    let start = node.start_position().row + 1;
    let end = node.end_position().row + 1;
    if start > end {
        return None;
    }
    Some((start, end))
}

/// Join an inclusive line range of `source` into a snippet.
///
/// A missing range yields `""`. Lines outside the file are simply absent
/// from the output.
#[must_use]
pub fn snippet(source: &str, range: Option<(usize, usize)>) -> String {
    let Some((start, end)) = range else {
        return String::new();
    };
    if start == 0 || end == 0 || start > end {
        return String::new();
    }
    source
        .split('\n')
        .skip(start - 1)
        .take(end - start + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`snippet`], with each line prefixed by its 1-based number (`N: `).
#[must_use]
pub fn snippet_numbered(source: &str, range: Option<(usize, usize)>) -> String {
    let Some((start, end)) = range else {
        return String::new();
    };
    if start == 0 || end == 0 || start > end {
        return String::new();
    }
    source
        .split('\n')
        .skip(start - 1)
        .take(end - start + 1)
        .enumerate()
        .map(|(i, line)| format!("{}: {line}", start + i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Update point for a title literal: the node's end position with the column
/// pulled back by one, so insertion lands just inside the closing delimiter.
#[must_use]
pub fn update_point(title_node: Node<'_>) -> UpdatePoint {
    let end = title_node.end_position();
    UpdatePoint {
        line: end.row + 1,
        column: end.column.saturating_sub(1),
    }
}

// ---------------------------------------------------------------------------
// Surgical text mutation
// ---------------------------------------------------------------------------

/// Insert `insertion` into `text` at `point`.
///
/// If the target line carries a table-row delimiter (`|`) at or after the
/// column, the insertion lands before that delimiter (backing over padding
/// spaces) so tabular formatting survives. Otherwise the insertion lands at
/// the byte column, clamped to the line.
///
/// Never de-duplicates — the synchronizer's conflict checks decide whether
/// an insertion should happen at all.
#[must_use]
pub fn insert_at(text: &str, point: UpdatePoint, insertion: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    let Some(line) = lines.get_mut(point.line.saturating_sub(1)) else {
        return text.to_owned();
    };

    let mut col = point.column.min(line.len());
    while col > 0 && !line.is_char_boundary(col) {
        col -= 1;
    }

    let pos = match line[col..].find('|') {
        Some(rel) => {
            let mut p = col + rel;
            while p > col && line.as_bytes()[p - 1] == b' ' {
                p -= 1;
            }
            p
        }
        None => col,
    };

    line.insert_str(pos, insertion);
    lines.join("\n")
}

/// Remove the first occurrence of `" " + token` on the target line.
#[must_use]
pub fn remove_at(text: &str, point: UpdatePoint, token: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    if let Some(line) = lines.get_mut(point.line.saturating_sub(1)) {
        *line = line.replacen(&format!(" {token}"), "", 1);
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{parse, Dialect};

    fn first_call_title(source: &str) -> UpdatePoint {
        let tree = parse(source, Dialect::JavaScript, "t.js").unwrap();
        let root = tree.root_node();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "string" {
                return update_point(node);
            }
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
        panic!("no string literal in {source}");
    }

    #[test]
    fn snippet_joins_inclusive_range() {
        let src = "a\nb\nc\nd";
        assert_eq!(snippet(src, Some((2, 3))), "b\nc");
    }

    #[test]
    fn snippet_guards_falsy_bounds() {
        let src = "a\nb";
        assert_eq!(snippet(src, None), "");
        assert_eq!(snippet(src, Some((0, 2))), "");
        assert_eq!(snippet(src, Some((2, 0))), "");
    }

    #[test]
    fn snippet_numbered_prefixes_lines() {
        let src = "a\nb\nc";
        assert_eq!(snippet_numbered(src, Some((2, 3))), "2: b\n3: c");
    }

    #[test]
    fn update_point_lands_inside_closing_quote() {
        let src = "it('adds', () => {});";
        let point = first_call_title(src);
        assert_eq!(point.line, 1);
        // Column of the closing quote of 'adds'.
        assert_eq!(&src[point.column..=point.column], "'");
        let mutated = insert_at(src, point, " @Tabc12345");
        assert_eq!(mutated, "it('adds @Tabc12345', () => {});");
    }

    #[test]
    fn insert_then_remove_is_identity() {
        let src = "  it('multiplies values', () => {});";
        let point = first_call_title(src);
        let inserted = insert_at(src, point, " @T0a1b2c3d");
        let removed = remove_at(&inserted, point, "@T0a1b2c3d");
        assert_eq!(removed, src);
    }

    #[test]
    fn insert_respects_table_row_delimiter() {
        let src = "| adds numbers | high |";
        let point = UpdatePoint { line: 1, column: 14 };
        let mutated = insert_at(src, point, " @Tabc12345");
        assert_eq!(mutated, "| adds numbers @Tabc12345 | high |");
    }

    #[test]
    fn insert_out_of_range_line_is_noop() {
        let src = "it('x', f);";
        let point = UpdatePoint { line: 9, column: 0 };
        assert_eq!(insert_at(src, point, " @T1"), src);
    }

    #[test]
    fn remove_only_first_occurrence() {
        let src = "it('a @T11111111 @T11111111', f);";
        let point = UpdatePoint { line: 1, column: 0 };
        let out = remove_at(src, point, "@T11111111");
        assert_eq!(out, "it('a @T11111111', f);");
    }
}
