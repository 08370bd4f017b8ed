//! Identifier synchronization round-trips on real fixture trees.

mod common;

use std::collections::BTreeMap;

use common::{fixture_tree, read};

use testdex::adapter::Framework;
use testdex::config::ScanOptions;
use testdex::scan::scan;
use testdex::sync::{clean_ids, update_ids, IdMap, SyncOptions};

fn id_map(tests: &[(&str, &str)], suites: &[(&str, &str)]) -> IdMap {
    IdMap {
        tests: tests
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        suites: suites
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
    }
}

fn scan_records(
    dir: &std::path::Path,
    pattern: &str,
    framework: Framework,
) -> BTreeMap<String, Vec<testdex::model::TestRecord>> {
    scan(pattern, dir, framework, &ScanOptions::default())
        .unwrap()
        .records_by_file()
}

#[test]
fn mocha_update_then_clean_round_trips() {
    let original = "describe('Math', () => {\n  it('adds', () => {});\n  it('subs', () => {});\n});\n";
    let dir = fixture_tree(&[("math.test.js", original)]);

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let mut map = id_map(
        &[("Math#adds", "@Tadd00001"), ("Math#subs", "@Tsub00002")],
        &[("Math", "@Smath0001")],
    );

    let report = update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
    assert_eq!(report.updated_files.len(), 1);
    assert_eq!(report.duplicates, 0);

    let tagged = read(dir.path(), "math.test.js");
    assert!(tagged.contains("describe('Math @Smath0001',"));
    assert!(tagged.contains("it('adds @Tadd00001',"));
    assert!(tagged.contains("it('subs @Tsub00002',"));

    // Clean with the same map restores the original bytes.
    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let map = id_map(
        &[("Math#adds", "@Tadd00001"), ("Math#subs", "@Tsub00002")],
        &[("Math", "@Smath0001")],
    );
    clean_ids(&by_file, &map, dir.path(), &SyncOptions::default()).unwrap();
    assert_eq!(read(dir.path(), "math.test.js"), original);
}

#[test]
fn second_update_with_same_map_changes_nothing() {
    let dir = fixture_tree(&[(
        "a.test.js",
        "describe('M', () => {\n  it('adds', () => {});\n});\n",
    )]);

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let mut map = id_map(&[("M#adds", "@T12345678")], &[]);
    update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();
    let first_pass = read(dir.path(), "a.test.js");

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let mut map = id_map(&[("M#adds", "@T12345678")], &[]);
    let report = update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

    assert!(report.updated_files.is_empty());
    assert_eq!(report.duplicates, 0);
    assert_eq!(read(dir.path(), "a.test.js"), first_pass);
}

#[test]
fn conflicting_operator_set_id_survives_update() {
    let dir = fixture_tree(&[("a.test.js", "it('adds @Toperat01', () => {});\n")]);

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let mut map = id_map(&[("adds", "@Tmachine9")], &[]);
    let report = update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

    assert_eq!(report.duplicates, 1);
    let text = read(dir.path(), "a.test.js");
    assert!(text.contains("@Toperat01"));
    assert!(!text.contains("@Tmachine9"));
}

#[test]
fn codecept_tagged_titles_match_via_stripped_keys() {
    let dir = fixture_tree(&[(
        "login_test.js",
        "Feature('Auth');\nScenario('logs in', ({ I }) => {}).tag('@smoke');\n",
    )]);

    let by_file = scan_records(dir.path(), "*_test.js", Framework::Codecept);
    // The scanned name is "logs in @smoke"; the registry issued the ID
    // against the tag-stripped identity.
    let mut map = id_map(&[("Auth#logs in", "@Tlogin001")], &[]);
    update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

    assert!(read(dir.path(), "login_test.js").contains("Scenario('logs in @Tlogin001',"));
}

#[test]
fn markdown_headings_update_and_clean() {
    let original = "# Checkout\n\n## pays with card\n\n- open cart\n- pay\n";
    let dir = fixture_tree(&[("checkout.md", original)]);

    let by_file = scan_records(dir.path(), "*.md", Framework::Markdown);
    let mut map = id_map(
        &[("Checkout#pays with card", "@Tcard0001")],
        &[("Checkout", "@Sflow0001")],
    );
    update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

    let tagged = read(dir.path(), "checkout.md");
    assert!(tagged.contains("## pays with card @Tcard0001"));
    assert!(tagged.contains("# Checkout @Sflow0001"));

    let by_file = scan_records(dir.path(), "*.md", Framework::Markdown);
    let map = id_map(
        &[("Checkout#pays with card", "@Tcard0001")],
        &[("Checkout", "@Sflow0001")],
    );
    clean_ids(&by_file, &map, dir.path(), &SyncOptions::default()).unwrap();
    assert_eq!(read(dir.path(), "checkout.md"), original);
}

#[test]
fn update_points_stay_valid_across_many_edits() {
    let original = "it('one', f);\nit('two', f);\nit('three', f);\nit('four', f);\n";
    let dir = fixture_tree(&[("many.test.js", original)]);

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let mut map = id_map(
        &[
            ("one", "@T00000001"),
            ("two", "@T00000002"),
            ("three", "@T00000003"),
            ("four", "@T00000004"),
        ],
        &[],
    );
    update_ids(&by_file, &mut map, dir.path(), &SyncOptions::default()).unwrap();

    assert_eq!(
        read(dir.path(), "many.test.js"),
        "it('one @T00000001', f);\nit('two @T00000002', f);\nit('three @T00000003', f);\nit('four @T00000004', f);\n"
    );
    assert!(map.tests.is_empty());
}

#[test]
fn dangerous_clean_sweeps_orphaned_tokens() {
    let dir = fixture_tree(&[(
        "a.test.js",
        "it('adds @Torphaned', () => {});\n// stray note @Sorphans1\n",
    )]);

    let by_file = scan_records(dir.path(), "*.test.js", Framework::Mocha);
    let empty = id_map(&[], &[]);

    // Normal clean knows none of these tokens — nothing happens.
    clean_ids(&by_file, &empty, dir.path(), &SyncOptions::default()).unwrap();
    assert!(read(dir.path(), "a.test.js").contains("@Torphaned"));

    let opts = SyncOptions {
        dangerous: true,
        ..SyncOptions::default()
    };
    clean_ids(&by_file, &empty, dir.path(), &opts).unwrap();
    let text = read(dir.path(), "a.test.js");
    assert!(!text.contains("@Torphaned"));
    assert!(!text.contains("@Sorphans1"));
}
