//! Final-newline insertion.

use javelin_core::TextRange;
use javelin_syntax::{NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleContext, Severity, Violation};

/// Requires the file to end with a line terminator. Active only while the
/// global `insert_final_newline` flag is on.
pub struct FinalNewline;

impl Rule for FinalNewline {
    fn id(&self) -> &'static str {
        "final-newline"
    }

    fn describe(&self) -> &'static str {
        "files end with a newline"
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
        if !ctx.config.insert_final_newline || ctx.source.is_empty() {
            return Vec::new();
        }
        let text = ctx.source.as_str();
        if text.ends_with('\n') || text.ends_with('\r') {
            return Vec::new();
        }

        let eof = ctx.source.len();
        let range = TextRange::new(eof, eof);
        vec![Violation::new(
            self.id(),
            Severity::Info,
            "file does not end with a newline",
            range,
        )
        .with_fix(FixStrategy::replace(
            "insert final newline",
            range,
            ctx.config.line_ending.as_str(),
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run_rule;
    use javelin_config::{FormatConfig, LineEnding};
    use std::sync::Arc;

    #[test]
    fn missing_newline_is_inserted() {
        let mut config = FormatConfig::default();
        config.line_ending = LineEnding::Lf;
        let violations = run_rule(Arc::new(FinalNewline), "class A {}", &config);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].suggested_fixes[0].replacement_text, "\n");
        assert_eq!(
            u32::from(violations[0].range.start()),
            "class A {}".len() as u32
        );
    }

    #[test]
    fn present_newline_passes() {
        let violations = run_rule(
            Arc::new(FinalNewline),
            "class A {}\n",
            &FormatConfig::default(),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn disabled_by_the_global_flag() {
        let mut config = FormatConfig::default();
        config.insert_final_newline = false;
        let violations = run_rule(Arc::new(FinalNewline), "class A {}", &config);
        assert!(violations.is_empty());
    }
}
