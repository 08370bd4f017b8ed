//! Tabular-spec idiom: line-oriented markup, no syntax tree.
//!
//! A level-1 heading (`# Title` or `Title` over `===`) opens a suite scope;
//! a level-2 heading (`## Title` or `Title` over `---`) opens a leaf scope
//! running to the next heading or end of file. A metadata line immediately
//! following a heading is parsed as `|`-separated `key: value` pairs and
//! merged into the record (`tags`, `skip`, `only`).

use std::collections::BTreeSet;

use crate::config::ScanOptions;
use crate::error::TestdexError;
use crate::loc::{self, UpdatePoint};
use crate::model::TestRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Heading {
    /// 1 = suite, 2 = leaf.
    level: u8,
    title: String,
    /// 1-based line carrying the title text.
    title_line: usize,
    /// Byte column just past the title's last character.
    title_end: usize,
    /// 1-based first line after the heading (and its underline, if any).
    content_start: usize,
}

#[derive(Clone, Debug, Default)]
struct Meta {
    tags: Vec<String>,
    skipped: bool,
    only: bool,
}

fn is_underline(line: &str, ch: char) -> bool {
    let trimmed = line.trim_end();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == ch)
}

/// Collect headings in document order.
fn headings(lines: &[&str]) -> Vec<Heading> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let (level, title) = if let Some(rest) = line.strip_prefix("## ") {
            (Some(2), rest)
        } else if let Some(rest) = line.strip_prefix("# ") {
            (Some(1), rest)
        } else {
            (None, "")
        };

        if let Some(level) = level {
            out.push(Heading {
                level,
                title: title.trim().to_owned(),
                title_line: i + 1,
                title_end: line.trim_end().len(),
                content_start: i + 2,
            });
            i += 1;
            continue;
        }

        // Underline-style headings: a non-empty title line over === or ---.
        let underlined = !line.trim().is_empty()
            && !line.starts_with('#')
            && i + 1 < lines.len();
        if underlined && is_underline(lines[i + 1], '=') {
            out.push(Heading {
                level: 1,
                title: line.trim().to_owned(),
                title_line: i + 1,
                title_end: line.trim_end().len(),
                content_start: i + 3,
            });
            i += 2;
            continue;
        }
        if underlined && is_underline(lines[i + 1], '-') {
            out.push(Heading {
                level: 2,
                title: line.trim().to_owned(),
                title_line: i + 1,
                title_end: line.trim_end().len(),
                content_start: i + 3,
            });
            i += 2;
            continue;
        }

        i += 1;
    }
    out
}

/// Parse the line at `content_start` as metadata when it has the
/// `key: value | key: value` shape.
fn metadata(lines: &[&str], heading: &Heading) -> Meta {
    let mut meta = Meta::default();
    let Some(line) = lines.get(heading.content_start - 1) else {
        return meta;
    };
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return meta;
    }
    let parts: Vec<&str> = trimmed.split('|').collect();
    if !parts.iter().all(|p| p.contains(':')) {
        return meta;
    }

    for part in parts {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "tags" => {
                meta.tags = value
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .map(|t| t.trim_start_matches('@').to_owned())
                    .collect();
            }
            "skip" | "skipped" => meta.skipped = truthy(value),
            "only" => meta.only = truthy(value),
            _ => {}
        }
    }
    meta
}

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1")
}

/// Scan one file's lines and emit its test records.
pub fn adapt(
    file: &str,
    source: &str,
    opts: &ScanOptions,
) -> Result<Vec<TestRecord>, TestdexError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let all = headings(&lines);
    let mut records = Vec::new();

    let mut suite: Option<(String, bool)> = None;

    for (idx, heading) in all.iter().enumerate() {
        let meta = metadata(&lines, heading);
        if meta.only {
            return Err(TestdexError::ExclusiveTests {
                file: file.to_owned(),
                line: heading.title_line,
            });
        }

        if heading.level == 1 {
            suite = Some((heading.title.clone(), meta.skipped));
            continue;
        }

        // Leaf scope runs until the next heading of any level, or EOF.
        let end_line = all
            .get(idx + 1)
            .map_or(lines.len(), |next| next.title_line - 1);
        let range = Some((heading.title_line, end_line));
        let code = if opts.line_numbers {
            loc::snippet_numbered(source, range)
        } else {
            loc::snippet(source, range)
        };

        let (suites, suite_skipped) = match &suite {
            Some((title, skipped)) => (vec![title.clone()], *skipped),
            None => (Vec::new(), false),
        };

        records.push(TestRecord {
            name: heading.title.clone(),
            raw_name: heading.title.clone(),
            suites,
            file: file.to_owned(),
            line: heading.title_line,
            end_line,
            code,
            skipped: suite_skipped || meta.skipped,
            tags: meta.tags.into_iter().collect::<BTreeSet<_>>(),
            update_point: Some(UpdatePoint {
                line: heading.title_line,
                column: heading.title_end,
            }),
        });
    }

    Ok(records)
}
