//! Import grouping and ordering.

use javelin_core::TextRange;
use javelin_syntax::{NodeAttr, NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleConfigError, RuleContext, Severity, Violation};

/// Groups imports into `java.*`, `javax.*`, third-party, and project
/// imports, separated by single blank lines, each group sorted
/// lexicographically.
///
/// Project packages are configured via the `project_prefixes` option; when
/// unset, the file's own package root counts as the project.
pub struct ImportOrganization;

#[derive(Debug, Clone)]
struct ImportLine {
    path: String,
    is_static: bool,
}

impl ImportLine {
    fn render(&self) -> String {
        if self.is_static {
            format!("import static {};", self.path)
        } else {
            format!("import {};", self.path)
        }
    }
}

impl Rule for ImportOrganization {
    fn id(&self) -> &'static str {
        "import-organization"
    }

    fn describe(&self) -> &'static str {
        "imports are grouped (java, javax, third-party, project) and sorted"
    }

    fn default_config(&self) -> toml::Value {
        let mut table = toml::map::Map::new();
        table.insert(
            "project_prefixes".to_string(),
            toml::Value::Array(Vec::new()),
        );
        toml::Value::Table(table)
    }

    fn validate_config(&self, config: &toml::Value) -> Result<(), RuleConfigError> {
        if let Some(prefixes) = config.get("project_prefixes") {
            let ok = prefixes
                .as_array()
                .is_some_and(|a| a.iter().all(|v| v.is_str()));
            if !ok {
                return Err(RuleConfigError {
                    rule: self.id(),
                    message: "`project_prefixes` must be an array of strings".to_string(),
                });
            }
        }
        Ok(())
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, node: NodeIndex) -> Vec<Violation> {
        let arena = ctx.arena;

        let mut package_root: Option<String> = None;
        let mut imports: Vec<(TextRange, ImportLine)> = Vec::new();
        for child in arena.children(node) {
            match arena.kind(child) {
                NodeKind::PackageDeclaration => {
                    package_root = arena
                        .name(child)
                        .map(|p| p.split('.').next().unwrap_or(p).to_string());
                }
                NodeKind::ImportDeclaration => {
                    if let Some(NodeAttr::Import {
                        path, is_static, ..
                    }) = arena.attr(child)
                    {
                        imports.push((
                            arena.range(child),
                            ImportLine {
                                path: path.clone(),
                                is_static: *is_static,
                            },
                        ));
                    }
                }
                _ => {}
            }
        }

        if imports.len() < 2 {
            return Vec::new();
        }

        let project_prefixes: Vec<String> = ctx
            .options
            .and_then(|o| o.get("project_prefixes"))
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_else(|| package_root.into_iter().collect());

        let mut groups: [Vec<ImportLine>; 4] = Default::default();
        for (_, import) in &imports {
            groups[group_of(&import.path, &project_prefixes)].push(import.clone());
        }
        for group in &mut groups {
            group.sort_by(|a, b| a.path.cmp(&b.path));
        }

        let desired = groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(|g| {
                g.iter()
                    .map(ImportLine::render)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let span = TextRange::new(
            imports.first().unwrap().0.start(),
            imports.last().unwrap().0.end(),
        );
        let current = ctx.source.slice(span);
        if current == desired {
            return Vec::new();
        }

        let mut violation = Violation::new(
            self.id(),
            Severity::Warning,
            "imports are not grouped and sorted",
            span,
        )
        .with_node(node);

        // Only rewrite a block that holds nothing but imports and blank
        // lines; comments in between would be destroyed.
        let clean = current.lines().all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.starts_with("import")
        });
        if clean {
            violation = violation.with_fix(FixStrategy::replace(
                "group and sort imports",
                span,
                desired,
            ));
        }

        vec![violation]
    }
}

fn group_of(path: &str, project_prefixes: &[String]) -> usize {
    if project_prefixes
        .iter()
        .any(|p| !p.is_empty() && (path == p || path.starts_with(&format!("{p}."))))
    {
        return 3;
    }
    if path == "java" || path.starts_with("java.") {
        return 0;
    }
    if path == "javax" || path.starts_with("javax.") {
        return 1;
    }
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run_rule;
    use javelin_config::FormatConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn sorted_grouped_imports_pass() {
        let source = "\
package com.example;

import java.util.List;
import java.util.Map;

import javax.annotation.Nullable;

import org.slf4j.Logger;

import com.example.util.Strings;

class A {}
";
        let violations = run_rule(
            Arc::new(ImportOrganization),
            source,
            &FormatConfig::default(),
        );
        assert_eq!(violations, Vec::new());
    }

    #[test]
    fn unsorted_imports_get_a_block_rewrite() {
        let source = "\
package com.example;

import org.slf4j.Logger;
import java.util.Map;
import com.example.util.Strings;
import java.util.List;
import javax.annotation.Nullable;

class A {}
";
        let violations = run_rule(
            Arc::new(ImportOrganization),
            source,
            &FormatConfig::default(),
        );
        assert_eq!(violations.len(), 1);
        let fix = &violations[0].suggested_fixes[0];
        assert_eq!(
            fix.replacement_text,
            "\
import java.util.List;
import java.util.Map;

import javax.annotation.Nullable;

import org.slf4j.Logger;

import com.example.util.Strings;"
        );
    }

    #[test]
    fn comments_inside_the_block_suppress_the_fix() {
        let source = "\
import org.slf4j.Logger;
// keep me
import java.util.Map;

class A {}
";
        let violations = run_rule(
            Arc::new(ImportOrganization),
            source,
            &FormatConfig::default(),
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].suggested_fixes.is_empty());
    }

    #[test]
    fn project_prefixes_override_the_package_heuristic() {
        let source = "\
import com.example.util.Strings;
import org.other.Thing;

class A {}
";
        let config = FormatConfig::from_toml_str(
            "[rules.import-organization]\nproject_prefixes = [\"com.example\"]\n",
        )
        .unwrap();
        let violations = run_rule(Arc::new(ImportOrganization), source, &config);
        // `com.example` is the project group, so it must come last.
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].suggested_fixes[0].replacement_text,
            "import org.other.Thing;\n\nimport com.example.util.Strings;"
        );
    }

    #[test]
    fn static_imports_keep_their_keyword() {
        let source = "\
import java.util.Map;
import static java.util.List.*;

class A {}
";
        let violations = run_rule(
            Arc::new(ImportOrganization),
            source,
            &FormatConfig::default(),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].suggested_fixes[0].replacement_text,
            "import static java.util.List.*;\nimport java.util.Map;"
        );
    }
}
