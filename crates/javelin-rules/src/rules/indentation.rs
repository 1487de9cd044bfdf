//! Leading-whitespace style checks.

use javelin_config::IndentationType;
use javelin_core::{TextRange, TextSize};
use javelin_syntax::{NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleContext, Severity, Violation};

use super::visual_width;

/// Compares each line's leading whitespace against the configured
/// indentation type and size, reporting the first column that diverges.
///
/// Block-comment continuation lines (leading `*`) are exempt, since their
/// one-space alignment is intentional.
pub struct Indentation;

impl Rule for Indentation {
    fn id(&self) -> &'static str {
        "indentation"
    }

    fn describe(&self) -> &'static str {
        "leading whitespace follows the configured indentation style"
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
        let config = ctx.config;
        let mut violations = Vec::new();

        for line in 0..ctx.source.line_index().line_count() {
            let Some(text) = ctx.source.line_text(line) else {
                continue;
            };
            let indent_len = text.len() - text.trim_start_matches([' ', '\t']).len();
            let rest = &text[indent_len..];
            if rest.is_empty() || rest.starts_with('*') {
                continue;
            }
            let leading = &text[..indent_len];
            if leading.is_empty() {
                continue;
            }

            let line_start = ctx.source.line_index().line_start(line).unwrap();
            let width = visual_width(leading, config.tab_width);

            match config.indentation_type {
                IndentationType::Spaces => {
                    if let Some(tab_at) = leading.find('\t') {
                        let mut violation = Violation::new(
                            self.id(),
                            Severity::Warning,
                            format!(
                                "tab in space-indented file at column {}",
                                tab_at + 1
                            ),
                            indent_range(line_start, tab_at, indent_len),
                        );
                        violation = violation.with_fix(FixStrategy::replace(
                            "replace leading whitespace with spaces",
                            TextRange::new(
                                line_start,
                                line_start + TextSize::from(indent_len as u32),
                            ),
                            " ".repeat(width as usize),
                        ));
                        violations.push(violation);
                    } else if width % u32::from(config.indentation_size) != 0 {
                        let aligned = width - width % u32::from(config.indentation_size);
                        violations.push(Violation::new(
                            self.id(),
                            Severity::Info,
                            format!(
                                "indentation of {width} is not a multiple of {}",
                                config.indentation_size
                            ),
                            indent_range(line_start, aligned as usize, indent_len),
                        ));
                    }
                }
                IndentationType::Tabs => {
                    if let Some(space_at) = leading.find(' ') {
                        let mut violation = Violation::new(
                            self.id(),
                            Severity::Warning,
                            format!(
                                "space in tab-indented file at column {}",
                                space_at + 1
                            ),
                            indent_range(line_start, space_at, indent_len),
                        );
                        if width % u32::from(config.tab_width) == 0 {
                            violation = violation.with_fix(FixStrategy::replace(
                                "replace leading whitespace with tabs",
                                TextRange::new(
                                    line_start,
                                    line_start + TextSize::from(indent_len as u32),
                                ),
                                "\t".repeat((width / u32::from(config.tab_width)) as usize),
                            ));
                        }
                        violations.push(violation);
                    }
                }
                IndentationType::Mixed => {
                    // Tabs first, then spaces; a tab after a space is the
                    // divergence point.
                    if let Some(bad) = first_tab_after_space(leading) {
                        violations.push(Violation::new(
                            self.id(),
                            Severity::Warning,
                            format!("tab after space in indentation at column {}", bad + 1),
                            indent_range(line_start, bad, indent_len),
                        ));
                    }
                }
            }
        }

        violations
    }
}

fn indent_range(line_start: TextSize, from: usize, indent_len: usize) -> TextRange {
    TextRange::new(
        line_start + TextSize::from(from as u32),
        line_start + TextSize::from(indent_len as u32),
    )
}

fn first_tab_after_space(leading: &str) -> Option<usize> {
    let mut seen_space = false;
    for (i, c) in leading.char_indices() {
        match c {
            ' ' => seen_space = true,
            '\t' if seen_space => return Some(i),
            _ => {}
        }
    }
    None
}
