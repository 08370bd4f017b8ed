//! Identifier synchronization.
//!
//! Maps canonical test/suite identities to externally issued ID tokens
//! (`@T` + 8 alphanumerics for tests, `@S` + 8 for suites) and rewrites the
//! original source files in place: [`update_ids`] inserts tokens at the
//! recorded update points, [`clean_ids`] removes them.
//!
//! The map is consumed destructively — a matched key is deleted so no second
//! test can claim the same ID. Within a file, edits are applied bottom-to-top
//! so no insertion invalidates another record's update point. Conflicts
//! (a title already carrying a *different* well-formed token) are counted
//! and reported, never overwritten and never thrown.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TestdexError;
use crate::loc;
use crate::model::{strip_tag_tokens, TestRecord};

pub const TEST_ID_PREFIX: &str = "@T";
pub const SUITE_ID_PREFIX: &str = "@S";
const ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// IdMap
// ---------------------------------------------------------------------------

/// Externally supplied identifier map. Not cached between runs.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdMap {
    /// Canonical test lookup key → `@T…` token.
    #[serde(default)]
    pub tests: BTreeMap<String, String>,
    /// Canonical suite lookup key → `@S…` token.
    #[serde(default)]
    pub suites: BTreeMap<String, String>,
}

impl IdMap {
    /// Load the map from a JSON file (`{"tests": {...}, "suites": {...}}`).
    pub fn from_json_file(path: &Path) -> Result<Self, TestdexError> {
        let text = fs::read_to_string(path).map_err(|e| TestdexError::IdMap {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| TestdexError::IdMap {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Synchronizer behaviour switches.
#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Clean mode: remove any well-formed token, recognized or not — the
    /// escape hatch for orphaned IDs.
    pub dangerous: bool,
    /// Keywords whose adjacency identifies a suite-title line.
    pub suite_keywords: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dangerous: false,
            suite_keywords: [
                "describe",
                "context",
                "suite",
                "Feature",
                "QUnit.module",
                "module",
                "#",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

/// What a synchronization run did.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    /// Files whose text actually changed, in deterministic order.
    pub updated_files: Vec<PathBuf>,
    /// Entities skipped because their title carried a different ID.
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

/// Candidate lookup keys for a record, most qualified first, each followed by
/// its tag-stripped variant.
///
/// Known limitation, kept from the source behaviour: when the qualified keys
/// are absent, the bare `{name}` key can match a same-named test from a
/// different suite.
fn key_candidates(record: &TestRecord) -> Vec<String> {
    let name = record.name.as_str();
    let stripped = strip_tag_tokens(name);
    let suite = record.suites.join(": ");
    let suite_stripped = record
        .suites
        .iter()
        .map(|s| strip_tag_tokens(s))
        .collect::<Vec<_>>()
        .join(": ");

    let mut keys = Vec::new();
    let mut push = |key: String| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    if suite.is_empty() {
        push(format!("{}#{name}", record.file));
        push(format!("{}#{stripped}", record.file));
    } else {
        push(format!("{}#{suite}#{name}", record.file));
        push(format!("{}#{suite_stripped}#{stripped}", record.file));
        push(format!("{suite}#{name}"));
        push(format!("{suite_stripped}#{stripped}"));
    }
    push(name.to_owned());
    push(stripped);
    keys
}

/// Candidate lookup keys for one suite title within a file.
fn suite_key_candidates(file: &str, title: &str) -> Vec<String> {
    let stripped = strip_tag_tokens(title);
    let mut keys = vec![format!("{file}#{title}")];
    for key in [
        format!("{file}#{stripped}"),
        title.to_owned(),
        stripped,
    ] {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// First candidate present in the map, if any.
fn lookup(map: &BTreeMap<String, String>, candidates: &[String]) -> Option<(String, String)> {
    candidates
        .iter()
        .find(|key| map.contains_key(*key))
        .map(|key| (key.clone(), map[key].clone()))
}

// ---------------------------------------------------------------------------
// Token scanning
// ---------------------------------------------------------------------------

/// First well-formed ID token with `prefix` in `text`: the prefix followed by
/// exactly eight alphanumerics.
fn find_token(text: &str, prefix: &str) -> Option<String> {
    let mut from = 0;
    while let Some(rel) = text[from..].find(prefix) {
        let abs = from + rel;
        let rest = &text[abs + prefix.len()..];
        let id: String = rest
            .chars()
            .take(ID_LEN + 1)
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        if id.len() == ID_LEN {
            return Some(format!("{prefix}{id}"));
        }
        from = abs + prefix.len();
    }
    None
}

/// Remove one token occurrence from a line, preferring the space-prefixed
/// form so title spacing heals.
fn remove_token_from_line(line: &str, token: &str) -> String {
    let spaced = format!(" {token}");
    if line.contains(&spaced) {
        line.replacen(&spaced, "", 1)
    } else {
        line.replacen(token, "", 1)
    }
}

// ---------------------------------------------------------------------------
// update_ids
// ---------------------------------------------------------------------------

/// Insert issued IDs into source titles.
///
/// Tests are rewritten at their recorded update points, bottom of file first.
/// Suites have no single call-node target; their titles are located by
/// keyword-adjacency search and rewritten by text replacement.
pub fn update_ids(
    records_by_file: &BTreeMap<String, Vec<TestRecord>>,
    id_map: &mut IdMap,
    work_dir: &Path,
    opts: &SyncOptions,
) -> Result<SyncReport, TestdexError> {
    let mut report = SyncReport::default();

    for (file, records) in records_by_file {
        let path = work_dir.join(file);
        let original = fs::read_to_string(&path)?;
        let mut text = original.clone();

        // Bottom-to-top so earlier update points stay position-exact.
        let mut ordered: Vec<&TestRecord> =
            records.iter().filter(|r| r.update_point.is_some()).collect();
        ordered.sort_by(|a, b| {
            let (pa, pb) = (a.update_point, b.update_point);
            pb.cmp(&pa)
        });

        for record in ordered {
            let Some(point) = record.update_point else {
                continue;
            };
            let Some((key, id)) = lookup(&id_map.tests, &key_candidates(record)) else {
                continue;
            };
            match find_token(&record.name, TEST_ID_PREFIX) {
                Some(existing) if existing == id => {
                    // Already tagged with this ID — consume the key, no edit.
                    id_map.tests.remove(&key);
                }
                Some(_) => {
                    report.duplicates += 1;
                }
                None => {
                    id_map.tests.remove(&key);
                    text = loc::insert_at(&text, point, &format!(" {id}"));
                }
            }
        }

        // Suite titles, in order of first appearance.
        for title in suite_titles(records) {
            let candidates = suite_key_candidates(file, &title);
            let Some((key, id)) = lookup(&id_map.suites, &candidates) else {
                continue;
            };
            let Some(line_idx) = find_suite_line(&text, &title, &opts.suite_keywords) else {
                continue;
            };
            let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
            let line = lines[line_idx].clone();
            match find_token(&line, SUITE_ID_PREFIX) {
                Some(existing) if existing == id => {
                    id_map.suites.remove(&key);
                }
                Some(_) => {
                    report.duplicates += 1;
                }
                None => {
                    let search = strip_tag_tokens(&title);
                    let needle = if line.contains(&title) { &title } else { &search };
                    lines[line_idx] = line.replacen(needle, &format!("{needle} {id}"), 1);
                    id_map.suites.remove(&key);
                    text = lines.join("\n");
                }
            }
        }

        if text != original {
            fs::write(&path, &text)?;
            report.updated_files.push(path);
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// clean_ids
// ---------------------------------------------------------------------------

/// Remove ID tokens from source titles.
///
/// A token is removed when it appears in the supplied map's value set, or
/// unconditionally under `dangerous` mode (which also sweeps lines no record
/// points at, catching orphaned tokens).
pub fn clean_ids(
    records_by_file: &BTreeMap<String, Vec<TestRecord>>,
    id_map: &IdMap,
    work_dir: &Path,
    opts: &SyncOptions,
) -> Result<SyncReport, TestdexError> {
    let known_tests: BTreeSet<&str> = id_map.tests.values().map(String::as_str).collect();
    let known_suites: BTreeSet<&str> = id_map.suites.values().map(String::as_str).collect();
    let mut report = SyncReport::default();

    for (file, records) in records_by_file {
        let path = work_dir.join(file);
        let original = fs::read_to_string(&path)?;
        let mut text = original.clone();

        for record in records.iter().rev() {
            let Some(point) = record.update_point else {
                continue;
            };
            loop {
                let Some(line) = text.split('\n').nth(point.line.saturating_sub(1)) else {
                    break;
                };
                let Some(token) = find_token(line, TEST_ID_PREFIX) else {
                    break;
                };
                if !opts.dangerous && !known_tests.contains(token.as_str()) {
                    break;
                }
                let cleaned = loc::remove_at(&text, point, &token);
                if cleaned == text {
                    break;
                }
                text = cleaned;
            }
        }

        // Suite tokens on keyword-adjacent lines.
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        for line in &mut lines {
            if !opts.suite_keywords.iter().any(|k| line.contains(k.as_str())) {
                continue;
            }
            while let Some(token) = find_token(line, SUITE_ID_PREFIX) {
                if !opts.dangerous && !known_suites.contains(token.as_str()) {
                    break;
                }
                *line = remove_token_from_line(line, &token);
            }
        }
        text = lines.join("\n");

        // Dangerous mode sweeps every line for orphaned tokens of both kinds.
        if opts.dangerous {
            let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
            for line in &mut lines {
                for prefix in [TEST_ID_PREFIX, SUITE_ID_PREFIX] {
                    while let Some(token) = find_token(line, prefix) {
                        *line = remove_token_from_line(line, &token);
                    }
                }
            }
            text = lines.join("\n");
        }

        if text != original {
            fs::write(&path, &text)?;
            report.updated_files.push(path);
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Suite location helpers
// ---------------------------------------------------------------------------

/// Unique suite titles across a file's records, first appearance first.
fn suite_titles(records: &[TestRecord]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for record in records {
        for title in &record.suites {
            if !titles.contains(title) {
                titles.push(title.clone());
            }
        }
    }
    titles
}

/// 0-based index of the first line containing a suite keyword next to the
/// title (raw or tag-stripped form).
fn find_suite_line(text: &str, title: &str, keywords: &[String]) -> Option<usize> {
    let stripped = strip_tag_tokens(title);
    text.split('\n').position(|line| {
        keywords.iter().any(|k| line.contains(k.as_str()))
            && (line.contains(title) || line.contains(&stripped))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mocha;
    use crate::config::ScanOptions;
    use crate::lang::{parse, Dialect};
    use tempfile::TempDir;

    fn write_and_scan(dir: &TempDir, file: &str, source: &str) -> BTreeMap<String, Vec<TestRecord>> {
        fs::write(dir.path().join(file), source).unwrap();
        let tree = parse(source, Dialect::JavaScript, file).unwrap();
        let records = mocha::adapt(&tree, file, source, &ScanOptions::default()).unwrap();
        let mut by_file = BTreeMap::new();
        by_file.insert(file.to_owned(), records);
        by_file
    }

    fn read(dir: &TempDir, file: &str) -> String {
        fs::read_to_string(dir.path().join(file)).unwrap()
    }

    fn test_map(pairs: &[(&str, &str)]) -> IdMap {
        IdMap {
            tests: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            suites: BTreeMap::new(),
        }
    }

    #[test]
    fn update_inserts_test_id_at_title() {
        let dir = TempDir::new().unwrap();
        let source = "describe('Math', () => {\n  it('adds', () => {});\n});\n";
        let by_file = write_and_scan(&dir, "math.test.js", source);
        let mut map = test_map(&[("Math#adds", "@Tabc12345")]);

        let report =
            update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        assert_eq!(report.updated_files.len(), 1);
        assert_eq!(report.duplicates, 0);
        assert!(read(&dir, "math.test.js").contains("it('adds @Tabc12345', () => {});"));
        assert!(map.tests.is_empty(), "matched key is consumed");
    }

    #[test]
    fn update_then_clean_restores_original_titles() {
        let dir = TempDir::new().unwrap();
        let source = "describe('Math', () => {\n  it('adds', () => {});\n});\n";
        let by_file = write_and_scan(&dir, "math.test.js", source);

        let mut map = test_map(&[("Math#adds", "@Tabc12345")]);
        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

        // Re-scan the mutated file, then clean with the same map.
        let mutated = read(&dir, "math.test.js");
        let by_file = write_and_scan(&dir, "math.test.js", &mutated);
        let map = test_map(&[("Math#adds", "@Tabc12345")]);
        clean_ids(&by_file, &map, dir.path(), &SyncOptions::default()).unwrap();

        assert_eq!(read(&dir, "math.test.js"), source);
    }

    #[test]
    fn update_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = "it('adds', () => {});\n";
        let by_file = write_and_scan(&dir, "a.test.js", source);
        let mut map = test_map(&[("adds", "@T0a1b2c3d")]);
        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        let first = read(&dir, "a.test.js");

        // Second run over the already-tagged file, fresh map.
        let by_file = write_and_scan(&dir, "a.test.js", &first);
        let mut map = test_map(&[("adds", "@T0a1b2c3d")]);
        let report =
            update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

        assert!(report.updated_files.is_empty(), "no second mutation");
        assert_eq!(report.duplicates, 0);
        assert_eq!(read(&dir, "a.test.js"), first);
        assert!(map.tests.is_empty(), "key still consumed by the match");
    }

    #[test]
    fn conflicting_id_is_counted_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let source = "it('adds @Tdeadbeef', () => {});\n";
        let by_file = write_and_scan(&dir, "a.test.js", source);
        let mut map = test_map(&[("adds @Tdeadbeef", "@Tabc12345")]);

        let report =
            update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        assert_eq!(report.duplicates, 1);
        assert!(report.updated_files.is_empty());
        assert!(read(&dir, "a.test.js").contains("@Tdeadbeef"));
        assert!(!read(&dir, "a.test.js").contains("@Tabc12345"));
    }

    #[test]
    fn fallback_chain_prefers_qualified_keys() {
        let dir = TempDir::new().unwrap();
        let source = "describe('Math', () => {\n  it('adds', () => {});\n});\n";
        let by_file = write_and_scan(&dir, "math.test.js", source);
        let mut map = test_map(&[
            ("adds", "@Tbare0000"),
            ("Math#adds", "@Tsuite000"),
            ("math.test.js#Math#adds", "@Tfull0000"),
        ]);

        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        assert!(read(&dir, "math.test.js").contains("adds @Tfull0000"));
        assert!(!map.tests.contains_key("math.test.js#Math#adds"));
        assert!(map.tests.contains_key("adds"), "unmatched keys survive");
    }

    #[test]
    fn consumed_key_cannot_be_claimed_twice() {
        let dir = TempDir::new().unwrap();
        let source = "it('adds', () => {});\nit('adds', () => {});\n";
        let by_file = write_and_scan(&dir, "a.test.js", source);
        let mut map = test_map(&[("adds", "@T11112222")]);

        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        let text = read(&dir, "a.test.js");
        assert_eq!(
            text.matches("@T11112222").count(),
            1,
            "destructive map consumption guards double application"
        );
    }

    #[test]
    fn multiple_records_apply_bottom_up() {
        let dir = TempDir::new().unwrap();
        let source = "it('first', f);\nit('second', f);\nit('third', f);\n";
        let by_file = write_and_scan(&dir, "a.test.js", source);
        let mut map = test_map(&[
            ("first", "@Taaaa1111"),
            ("second", "@Tbbbb2222"),
            ("third", "@Tcccc3333"),
        ]);

        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        let text = read(&dir, "a.test.js");
        assert!(text.contains("it('first @Taaaa1111', f);"));
        assert!(text.contains("it('second @Tbbbb2222', f);"));
        assert!(text.contains("it('third @Tcccc3333', f);"));
    }

    #[test]
    fn suite_id_inserted_by_keyword_adjacency() {
        let dir = TempDir::new().unwrap();
        let source = "describe('Math', () => {\n  it('adds', () => {});\n});\n";
        let by_file = write_and_scan(&dir, "math.test.js", source);
        let mut map = IdMap {
            tests: BTreeMap::new(),
            suites: [("Math".to_owned(), "@S99998888".to_owned())]
                .into_iter()
                .collect(),
        };

        update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
        assert!(read(&dir, "math.test.js").contains("describe('Math @S99998888',"));
        assert!(map.suites.is_empty());
    }

    #[test]
    fn clean_leaves_unknown_tokens_unless_dangerous() {
        let dir = TempDir::new().unwrap();
        let source = "it('adds @Tffff0000', () => {});\n";
        let by_file = write_and_scan(&dir, "a.test.js", source);

        let map = test_map(&[("whatever", "@Tother000")]);
        clean_ids(&by_file, &map, dir.path(), &SyncOptions::default()).unwrap();
        assert!(read(&dir, "a.test.js").contains("@Tffff0000"), "unknown token kept");

        let opts = SyncOptions {
            dangerous: true,
            ..SyncOptions::default()
        };
        clean_ids(&by_file, &map, dir.path(), &opts).unwrap();
        assert!(!read(&dir, "a.test.js").contains("@Tffff0000"));
    }

    #[test]
    fn clean_removes_suite_tokens_on_keyword_lines() {
        let dir = TempDir::new().unwrap();
        let source = "describe('Math @S99998888', () => {\n  it('adds', () => {});\n});\n";
        let by_file = write_and_scan(&dir, "math.test.js", source);
        let map = IdMap {
            tests: BTreeMap::new(),
            suites: [("Math".to_owned(), "@S99998888".to_owned())]
                .into_iter()
                .collect(),
        };

        clean_ids(&by_file, &map, dir.path(), &SyncOptions::default()).unwrap();
        assert!(read(&dir, "math.test.js").contains("describe('Math',"));
    }

    #[test]
    fn find_token_requires_exactly_eight_alnums() {
        assert_eq!(
            find_token("it('a @Tabc12345', f)", "@T"),
            Some("@Tabc12345".to_owned())
        );
        assert_eq!(find_token("short @Tabc123 end", "@T"), None);
        assert_eq!(find_token("long @Tabc123456 end", "@T"), None);
        assert_eq!(
            find_token("two @Tabc123 @Tdef45678", "@T"),
            Some("@Tdef45678".to_owned())
        );
    }

    #[test]
    fn key_candidates_order_and_stripping() {
        use std::collections::BTreeSet;
        let record = TestRecord {
            name: "adds @smoke".to_owned(),
            raw_name: "adds".to_owned(),
            suites: vec!["Math @e2e".to_owned()],
            file: "math.test.js".to_owned(),
            line: 1,
            end_line: 1,
            code: String::new(),
            skipped: false,
            tags: BTreeSet::new(),
            update_point: None,
        };
        let keys = key_candidates(&record);
        assert_eq!(keys[0], "math.test.js#Math @e2e#adds @smoke");
        assert_eq!(keys[1], "math.test.js#Math#adds");
        assert_eq!(keys[2], "Math @e2e#adds @smoke");
        assert_eq!(keys[3], "Math#adds");
        assert_eq!(keys[4], "adds @smoke");
        assert_eq!(keys[5], "adds");
    }
}
