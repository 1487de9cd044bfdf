//! End-to-end parse -> lint -> rewrite runs: the engine applied twice
//! must equal the engine applied once.

use std::path::Path;

use javelin_config::FormatConfig;
use javelin_core::SourceText;
use javelin_rewrite::{rewrite, RewriteError};
use javelin_rules::lint;
use javelin_syntax::parse;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// One full engine pass; conflicts fall back to the unrewritten source.
fn engine_pass(source: &str, config: &FormatConfig) -> String {
    let text = SourceText::new(source);
    let arena = match parse(source).into_arena() {
        Some(arena) => arena,
        None => return source.to_string(),
    };
    let violations = lint(&text, &arena, Path::new("Test.java"), config);
    match rewrite(source, &violations, config) {
        Ok(outcome) => outcome.text,
        Err(RewriteError::Conflict { .. }) => source.to_string(),
        Err(other) => panic!("unexpected rewrite failure: {other}"),
    }
}

const DIRTY: &str = "\
package com.example;

import org.slf4j.Logger;
import java.util.Map;
import java.util.List;

class Dirty {
\tint tabbed = 1;
    int trailing = 2;   
    void m() {
        String text = \"one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen\";
    }
}";

#[test]
fn dirty_file_converges_in_one_pass() {
    let mut config = FormatConfig::default();
    config.max_line_length = 100;

    let once = engine_pass(DIRTY, &config);
    let twice = engine_pass(&once, &config);
    assert_eq!(once, twice);

    // The obvious defects are gone.
    assert!(!once.contains('\t'));
    assert!(!once.contains("   \n"));
    assert!(once.ends_with('\n'));
    let import_block: Vec<&str> = once
        .lines()
        .filter(|l| l.starts_with("import"))
        .collect();
    assert_eq!(
        import_block,
        vec![
            "import java.util.List;",
            "import java.util.Map;",
            "import org.slf4j.Logger;",
        ]
    );
    for line in once.lines() {
        assert!(line.chars().count() <= 100, "long line survived: {line:?}");
    }

    // The rewritten source still parses cleanly.
    let reparsed = parse(&once);
    assert!(reparsed.is_success());
    assert!(reparsed.errors().is_empty());
}

#[test]
fn clean_file_is_untouched() {
    let source = "class MyClass {}\n";
    let once = engine_pass(source, &FormatConfig::default());
    assert_eq!(once, source);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pipeline_is_idempotent_for_generated_sources(
        members in proptest::collection::vec(
            prop_oneof![
                Just("    int counter = 0;".to_string()),
                Just("    int counter = 0;   ".to_string()),
                Just("\tint tabbed = 1;".to_string()),
                Just("    void run() { work(); }".to_string()),
                "[a-z]{1,6}".prop_map(|n| format!("    int {n} = 42;  ")),
            ],
            0..6,
        ),
        final_newline in proptest::bool::ANY,
    ) {
        let mut source = String::from("class Fixture {\n");
        for member in &members {
            source.push_str(member);
            source.push('\n');
        }
        source.push('}');
        if final_newline {
            source.push('\n');
        }

        let config = FormatConfig::default();
        let once = engine_pass(&source, &config);
        let twice = engine_pass(&once, &config);
        prop_assert_eq!(&once, &twice);

        // Whatever the engine produced still parses.
        prop_assert!(parse(&once).is_success());
    }
}
