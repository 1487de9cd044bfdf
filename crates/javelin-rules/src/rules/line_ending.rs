//! Line-terminator normalization.

use javelin_config::LineEnding;
use javelin_core::{TextRange, TextSize};
use javelin_syntax::{NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleContext, Severity, Violation};

/// Rewrites line terminators that differ from the configured `line_ending`.
///
/// With `SYSTEM` (the default) the rule is inert: existing terminators are
/// left as the author wrote them.
pub struct LineEndings;

impl Rule for LineEndings {
    fn id(&self) -> &'static str {
        "line-ending"
    }

    fn describe(&self) -> &'static str {
        "line terminators match the configured style"
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
        if ctx.config.line_ending == LineEnding::System {
            return Vec::new();
        }
        let target = ctx.config.line_ending.as_str();
        let bytes = ctx.source.as_str().as_bytes();

        let mut violations = Vec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            let (len, actual) = match bytes[i] {
                b'\r' if i + 1 < bytes.len() && bytes[i + 1] == b'\n' => (2, "\r\n"),
                b'\r' => (1, "\r"),
                b'\n' => (1, "\n"),
                _ => {
                    i += 1;
                    continue;
                }
            };
            if actual != target {
                let range = TextRange::new(
                    TextSize::from(i as u32),
                    TextSize::from((i + len) as u32),
                );
                violations.push(
                    Violation::new(
                        self.id(),
                        Severity::Info,
                        format!(
                            "line ends with {} instead of {}",
                            escape(actual),
                            escape(target)
                        ),
                        range,
                    )
                    .with_fix(FixStrategy::replace("normalize line ending", range, target)),
                );
            }
            i += len;
        }
        violations
    }
}

fn escape(terminator: &str) -> String {
    terminator.escape_debug().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run_rule;
    use javelin_config::FormatConfig;
    use std::sync::Arc;

    fn config(line_ending: LineEnding) -> FormatConfig {
        let mut config = FormatConfig::default();
        config.line_ending = line_ending;
        config
    }

    #[test]
    fn system_leaves_terminators_alone() {
        let violations = run_rule(
            Arc::new(LineEndings),
            "class A {\r\n}\r\n",
            &FormatConfig::default(),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn crlf_is_rewritten_to_lf_on_demand() {
        let violations = run_rule(
            Arc::new(LineEndings),
            "class A {\r\n}\n",
            &config(LineEnding::Lf),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].suggested_fixes[0].replacement_text, "\n");
        assert_eq!(u32::from(violations[0].range.start()), 9);
        assert_eq!(u32::from(violations[0].range.end()), 11);
    }

    #[test]
    fn lf_to_crlf_counts_every_line() {
        let violations = run_rule(
            Arc::new(LineEndings),
            "class A {\n}\n",
            &config(LineEnding::Crlf),
        );
        assert_eq!(violations.len(), 2);
    }
}
