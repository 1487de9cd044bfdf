//! Machine-readable violation envelope.
//!
//! Downstream rendering (colors, grouping, editor integration) happens
//! elsewhere; this module only guarantees a well-formed JSON document, even
//! for zero violations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::Violation;

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub violations: Vec<ReportViolation<'a>>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportViolation<'a> {
    pub rule_id: &'a str,
    pub severity: &'static str,
    pub message: &'a str,
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<ReportFix<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFix<'a> {
    pub description: &'a str,
    pub auto_applicable: bool,
    pub replacement_start: u32,
    pub replacement_end: u32,
    pub replacement_text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub by_rule: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<&'static str, usize>,
}

/// Shape `violations` into the report envelope.
pub fn render_report(violations: &[Violation]) -> Report<'_> {
    let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_severity: BTreeMap<&'static str, usize> = BTreeMap::new();

    let rendered = violations
        .iter()
        .map(|v| {
            *by_rule.entry(v.rule_id.to_string()).or_default() += 1;
            *by_severity.entry(v.severity.as_str()).or_default() += 1;
            ReportViolation {
                rule_id: v.rule_id,
                severity: v.severity.as_str(),
                message: &v.message,
                file: v.file_path.display().to_string(),
                line: v.line,
                column: v.column,
                fixes: v
                    .suggested_fixes
                    .iter()
                    .map(|f| ReportFix {
                        description: &f.description,
                        auto_applicable: f.auto_applicable,
                        replacement_start: u32::from(f.range.start()),
                        replacement_end: u32::from(f.range.end()),
                        replacement_text: &f.replacement_text,
                    })
                    .collect(),
            }
        })
        .collect();

    Report {
        violations: rendered,
        summary: Summary {
            total: violations.len(),
            by_rule,
            by_severity,
        },
    }
}

/// Serialize the envelope; quotes and unicode are handled by the JSON
/// encoder, so messages and paths need no pre-escaping.
pub fn report_to_json(violations: &[Violation]) -> String {
    serde_json::to_string_pretty(&render_report(violations))
        .expect("report serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixStrategy, Severity};
    use javelin_core::TextRange;

    fn violation(message: &str) -> Violation {
        let mut v = Violation::new(
            "line-length",
            Severity::Warning,
            message,
            TextRange::new(0.into(), 4.into()),
        );
        v.file_path = "src/A.java".into();
        v.line = 3;
        v.column = 1;
        v
    }

    #[test]
    fn empty_report_is_well_formed() {
        let json = report_to_json(&[]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["violations"].as_array().unwrap().len(), 0);
        assert_eq!(value["summary"]["total"], 0);
    }

    #[test]
    fn quotes_and_unicode_survive_the_round_trip() {
        let v = violation("string \"mit Würze\" is too long");
        let json = report_to_json(&[v]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["violations"][0]["message"],
            "string \"mit Würze\" is too long"
        );
        assert_eq!(value["summary"]["byRule"]["line-length"], 1);
        assert_eq!(value["summary"]["bySeverity"]["warning"], 1);
    }

    #[test]
    fn fixes_are_listed_with_their_spans() {
        let v = violation("x").with_fix(FixStrategy::replace(
            "split the literal",
            TextRange::new(2.into(), 4.into()),
            "\"a\" +\n\"b\"",
        ));
        let value: serde_json::Value = serde_json::from_str(&report_to_json(&[v])).unwrap();
        let fix = &value["violations"][0]["fixes"][0];
        assert_eq!(fix["replacementStart"], 2);
        assert_eq!(fix["replacementEnd"], 4);
        assert_eq!(fix["autoApplicable"], true);
    }
}
