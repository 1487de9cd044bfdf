//! Property tests for the structural invariants every parsed arena upholds.

use javelin_syntax::{parse, NodeArena, ParseResult};
use proptest::prelude::*;

/// Descendant containment and sibling ordering, for every node.
fn check_structure(arena: &NodeArena, source: &str) {
    let root = arena.root().expect("non-empty arena has a root");
    let root_range = arena.range(root);
    assert_eq!(u32::from(root_range.start()), 0);
    assert_eq!(u32::from(root_range.end()), source.len() as u32);

    for node in arena.nodes() {
        let range = arena.range(node);
        assert!(range.start() <= range.end(), "inverted range on {node:?}");

        let mut prev_start = None;
        for child in arena.children(node) {
            let child_range = arena.range(child);
            assert!(
                range.contains_range(child_range),
                "child {child:?} escapes parent {node:?}"
            );
            if let Some(prev) = prev_start {
                assert!(
                    child_range.start() > prev,
                    "sibling starts not strictly ascending under {node:?}"
                );
            }
            prev_start = Some(child_range.start());
        }
    }
}

fn java_class(body: &str) -> String {
    format!("class Fixture {{\n{body}\n}}\n")
}

/// A small pool of statement shapes to combine into method bodies.
fn statement_pool() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("int a = 1;".to_string()),
        Just("a += 2;".to_string()),
        Just("if (a > 0) { a--; } else { a++; }".to_string()),
        Just("while (a < 100) a *= 2;".to_string()),
        Just("for (int i = 0; i < 3; i++) { use(i); }".to_string()),
        Just("return;".to_string()),
        Just("try { run(); } catch (Exception e) { log(e); }".to_string()),
        Just("Object o = new java.util.ArrayList<String>();".to_string()),
        "[a-z]{1,8}" .prop_map(|name| format!("int {name} = compute();")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_method_bodies_keep_arena_invariants(
        stmts in proptest::collection::vec(statement_pool(), 0..8)
    ) {
        let body = format!("  void m() {{\n    {}\n  }}", stmts.join("\n    "));
        let source = java_class(&body);
        match parse(&source) {
            ParseResult::Success { arena, errors } => {
                prop_assert!(errors.is_empty(), "errors in {source}: {errors:#?}");
                check_structure(&arena, &source);
            }
            ParseResult::Failure { errors } => {
                prop_assert!(false, "unexpected failure: {errors:#?}");
            }
        }
    }

    #[test]
    fn arbitrary_input_never_panics_and_is_deterministic(input in "\\PC{0,300}") {
        let first = parse(&input);
        let second = parse(&input);
        match (&first, &second) {
            (
                ParseResult::Success { arena: a, errors: ea },
                ParseResult::Success { arena: b, errors: eb },
            ) => {
                prop_assert_eq!(a, b);
                prop_assert_eq!(ea, eb);
                check_structure(a, &input);
            }
            (ParseResult::Failure { errors: ea }, ParseResult::Failure { errors: eb }) => {
                prop_assert_eq!(ea, eb);
            }
            _ => prop_assert!(false, "parse was not deterministic"),
        }
    }

    #[test]
    fn identifier_soup_still_produces_an_arena(
        words in proptest::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,10}", 1..30)
    ) {
        let input = words.join(" ");
        if let ParseResult::Success { arena, .. } = parse(&input) {
            check_structure(&arena, &input);
        }
    }
}
