//! Property tests for the surgical text-mutation utilities.
//!
//! The synchronizer's safety story rests on `insert_at`/`remove_at` being
//! exact inverses at a recorded update point and never disturbing any other
//! line. These properties pin that down over generated titles and tokens.

use proptest::prelude::*;

use testdex::loc::{insert_at, remove_at, UpdatePoint};

fn title() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,30}[a-z0-9]"
}

fn token() -> impl Strategy<Value = String> {
    "[a-z0-9]{8}".prop_map(|id| format!("@T{id}"))
}

proptest! {
    #[test]
    fn insert_then_remove_is_identity(
        title in title(),
        token in token(),
        indent in 0usize..8,
    ) {
        let line = format!("{}it('{}', () => {{}});", " ".repeat(indent), title);
        let source = format!("// header\n{line}\nit('other', f);\n");
        // Byte offset of the title's closing quote.
        let point = UpdatePoint {
            line: 2,
            column: indent + 4 + title.len(),
        };

        let inserted = insert_at(&source, point, &format!(" {token}"));
        prop_assert_ne!(&inserted, &source);
        let needle = format!("'{} {}'", title, token);
        prop_assert!(inserted.contains(&needle));

        let removed = remove_at(&inserted, point, &token);
        prop_assert_eq!(removed, source);
    }

    #[test]
    fn insert_never_touches_other_lines(
        title in title(),
        token in token(),
        before in "[a-z ()';=]{0,40}",
        after in "[a-z ()';=]{0,40}",
    ) {
        let line = format!("it('{title}', f);");
        let source = format!("{before}\n{line}\n{after}");
        let point = UpdatePoint {
            line: 2,
            column: 4 + title.len(),
        };

        let inserted = insert_at(&source, point, &format!(" {token}"));
        let lines: Vec<&str> = inserted.split('\n').collect();
        prop_assert_eq!(lines[0], before.as_str());
        prop_assert_eq!(lines[2], after.as_str());
    }

    #[test]
    fn remove_without_token_is_identity(title in title(), token in token()) {
        let source = format!("it('{title}', f);\n");
        let point = UpdatePoint {
            line: 1,
            column: 4 + title.len(),
        };
        prop_assert_eq!(remove_at(&source, point, &token), source);
    }

    #[test]
    fn out_of_range_points_never_panic(
        source in "[ -~\n]{0,120}",
        line in 0usize..20,
        column in 0usize..200,
    ) {
        let point = UpdatePoint { line, column };
        let _ = insert_at(&source, point, " @Tabc12345");
        let _ = remove_at(&source, point, "@Tabc12345");
    }
}
