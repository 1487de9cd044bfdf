//! Trailing whitespace removal.

use javelin_core::{TextRange, TextSize};
use javelin_syntax::{NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleContext, Severity, Violation};

/// Deletes spaces and tabs that precede a line terminator. Active only
/// while the global `trim_trailing_whitespace` flag is on.
pub struct TrailingWhitespace;

impl Rule for TrailingWhitespace {
    fn id(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn describe(&self) -> &'static str {
        "lines must not end in spaces or tabs"
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
        if !ctx.config.trim_trailing_whitespace {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for line in 0..ctx.source.line_index().line_count() {
            let Some(text) = ctx.source.line_text(line) else {
                continue;
            };
            let trimmed_len = text.trim_end_matches([' ', '\t']).len();
            if trimmed_len == text.len() {
                continue;
            }

            let line_start = ctx.source.line_index().line_start(line).unwrap();
            let range = TextRange::new(
                line_start + TextSize::from(trimmed_len as u32),
                line_start + TextSize::from(text.len() as u32),
            );
            violations.push(
                Violation::new(
                    self.id(),
                    Severity::Info,
                    "trailing whitespace",
                    range,
                )
                .with_fix(FixStrategy::replace("remove trailing whitespace", range, "")),
            );
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run_rule;
    use javelin_config::FormatConfig;
    use std::sync::Arc;

    #[test]
    fn flags_and_deletes_trailing_blanks() {
        let source = "class A {   \n    int x; \t\n}\n";
        let violations = run_rule(
            Arc::new(TrailingWhitespace),
            source,
            &FormatConfig::default(),
        );
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| {
            v.suggested_fixes.len() == 1 && v.suggested_fixes[0].replacement_text.is_empty()
        }));
    }

    #[test]
    fn disabled_by_the_global_flag() {
        let mut config = FormatConfig::default();
        config.trim_trailing_whitespace = false;
        let violations = run_rule(Arc::new(TrailingWhitespace), "class A {  \n}\n", &config);
        assert!(violations.is_empty());
    }
}
