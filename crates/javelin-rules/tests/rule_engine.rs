use std::path::Path;

use javelin_config::FormatConfig;
use javelin_core::SourceText;
use javelin_rules::{lint, report_to_json, RuleRegistry};
use javelin_syntax::parse;
use pretty_assertions::assert_eq;

fn lint_source(source: &str, config: &FormatConfig) -> Vec<javelin_rules::Violation> {
    let text = SourceText::new(source);
    let arena = parse(source).into_arena().expect("source parses");
    lint(&text, &arena, Path::new("src/Test.java"), config)
}

#[test]
fn default_registry_lists_all_builtin_rules() {
    let registry = RuleRegistry::shared();
    let ids: Vec<_> = registry.rules().iter().map(|r| r.id()).collect();
    assert_eq!(
        ids,
        vec![
            "line-length",
            "import-organization",
            "indentation",
            "trailing-whitespace",
            "final-newline",
            "line-ending",
        ]
    );
}

#[test]
fn violations_are_ordered_by_position_then_rule_id() {
    // Trailing whitespace on line 1 and a tab-indent divergence plus
    // trailing whitespace on line 2.
    let source = "class A {   \n\tint x;  \n}\n";
    let config = FormatConfig::default();
    let violations = lint_source(source, &config);

    let keys: Vec<_> = violations
        .iter()
        .map(|v| (u32::from(v.range.start()), v.rule_id))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    // Same-position ties resolve lexicographically by rule id.
    let tab_position = violations
        .iter()
        .filter(|v| u32::from(v.range.start()) == 13)
        .map(|v| v.rule_id)
        .collect::<Vec<_>>();
    assert_eq!(tab_position, vec!["indentation"]);
}

#[test]
fn clean_file_produces_an_empty_well_formed_report() {
    let source = "class MyClass {}\n";
    let violations = lint_source(source, &FormatConfig::default());
    assert_eq!(violations, Vec::new());

    let json: serde_json::Value = serde_json::from_str(&report_to_json(&violations)).unwrap();
    assert_eq!(json["summary"]["total"], 0);
    assert!(json["violations"].as_array().unwrap().is_empty());
}

#[test]
fn rule_config_validation_rejects_bad_tables() {
    let registry = RuleRegistry::shared();
    let config = FormatConfig::from_toml_str(
        "[rules.import-organization]\nproject_prefixes = \"not-an-array\"\n",
    )
    .unwrap();
    let err = registry.validate_config(&config).unwrap_err();
    assert_eq!(err.rule, "import-organization");
    assert!(err.message.contains("array of strings"));
}

#[test]
fn rules_disabled_in_config_are_skipped() {
    let source = "class A {   \n}\n";
    let config =
        FormatConfig::from_toml_str("[rules.trailing-whitespace]\nenabled = false\n").unwrap();
    let violations = lint_source(source, &config);
    assert!(violations
        .iter()
        .all(|v| v.rule_id != "trailing-whitespace"));
}
