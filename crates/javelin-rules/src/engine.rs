//! Pre-order traversal dispatching rules over a file's arena.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use javelin_config::FormatConfig;
use javelin_core::{panic_message, SourceText};
use javelin_syntax::NodeArena;

use crate::{RuleContext, RuleRegistry, Violation};

pub struct RuleEngine {
    registry: Arc<RuleRegistry>,
}

impl RuleEngine {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run all enabled rules over `arena` and return violations ordered by
    /// source position, then rule id.
    ///
    /// A rule that panics is logged and skipped for the rest of this file;
    /// other rules keep running.
    pub fn lint(
        &self,
        source: &SourceText,
        arena: &NodeArena,
        path: &Path,
        config: &FormatConfig,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut faulted: HashSet<usize> = HashSet::new();

        let Some(root) = arena.root() else {
            return violations;
        };

        for node in arena.preorder(root) {
            let kind = arena.kind(node);
            for &rule_index in self.registry.rule_indices_for(kind) {
                if faulted.contains(&rule_index) {
                    continue;
                }
                let rule = &self.registry.rules()[rule_index];
                if !config.rule_enabled(rule.id()) {
                    continue;
                }

                let ctx = RuleContext {
                    source,
                    arena,
                    config,
                    options: config.rule_options(rule.id()),
                    path,
                };

                match catch_unwind(AssertUnwindSafe(|| rule.visit(&ctx, node))) {
                    Ok(mut found) => {
                        for violation in &mut found {
                            if violation.node.is_none() {
                                violation.node = node;
                            }
                        }
                        violations.append(&mut found);
                    }
                    Err(payload) => {
                        let range = arena.range(node);
                        tracing::warn!(
                            rule = rule.id(),
                            node_start = u32::from(range.start()),
                            node_end = u32::from(range.end()),
                            panic = %panic_message(payload.as_ref()),
                            "rule faulted; skipping it for this file"
                        );
                        faulted.insert(rule_index);
                    }
                }
            }
        }

        for violation in &mut violations {
            violation.file_path = path.to_path_buf();
            let lc = source.line_col(violation.range.start());
            violation.line = lc.line + 1;
            violation.column = lc.col + 1;
        }

        violations.sort_by(|a, b| {
            (a.range.start(), a.rule_id).cmp(&(b.range.start(), b.rule_id))
        });
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rule, RuleRegistry, Severity};
    use javelin_core::TextRange;
    use javelin_syntax::{parse, NodeIndex, NodeKind};
    use std::sync::Arc;

    struct PanickingRule;

    impl Rule for PanickingRule {
        fn id(&self) -> &'static str {
            "always-panics"
        }
        fn describe(&self) -> &'static str {
            "test rule that always panics"
        }
        fn applicable_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::CompilationUnit]
        }
        fn visit(&self, _ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
            panic!("boom");
        }
    }

    struct CountingRule;

    impl Rule for CountingRule {
        fn id(&self) -> &'static str {
            "counting"
        }
        fn describe(&self) -> &'static str {
            "reports one violation per compilation unit"
        }
        fn applicable_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::CompilationUnit]
        }
        fn visit(&self, _ctx: &RuleContext<'_>, node: NodeIndex) -> Vec<Violation> {
            vec![Violation::new(
                "counting",
                Severity::Info,
                "unit seen",
                TextRange::new(0.into(), 0.into()),
            )
            .with_node(node)]
        }
    }

    #[test]
    fn panicking_rule_is_isolated_from_others() {
        let mut builder = RuleRegistry::empty();
        builder.register(Arc::new(PanickingRule));
        builder.register(Arc::new(CountingRule));
        let registry = builder.build();

        let source = javelin_core::SourceText::new("class A {}\n");
        let arena = parse(source.as_str()).into_arena().unwrap();
        let config = javelin_config::FormatConfig::default();

        let engine = RuleEngine::new(registry);
        let violations = engine.lint(&source, &arena, Path::new("A.java"), &config);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "counting");
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].column, 1);
        assert_eq!(violations[0].file_path, Path::new("A.java"));
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut builder = RuleRegistry::empty();
        builder.register(Arc::new(CountingRule));
        let registry = builder.build();

        let source = javelin_core::SourceText::new("class A {}\n");
        let arena = parse(source.as_str()).into_arena().unwrap();
        let config = javelin_config::FormatConfig::from_toml_str(
            "[rules.counting]\nenabled = false\n",
        )
        .unwrap();

        let engine = RuleEngine::new(registry);
        let violations = engine.lint(&source, &arena, Path::new("A.java"), &config);
        assert!(violations.is_empty());
    }
}
