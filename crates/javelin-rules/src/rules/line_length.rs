//! Physical line length, with string-literal splitting fixes.

use javelin_config::{FormatConfig, IndentationType};
use javelin_core::{TextRange, TextSize};
use javelin_syntax::{NodeIndex, NodeKind};

use crate::{FixStrategy, Rule, RuleConfigError, RuleContext, Severity, Violation};

use super::visual_width;

/// Flags every physical line longer than `max_line_length` characters.
///
/// When the overflow runs through an ordinary string literal, the suggested
/// fix splits the literal at word boundaries into a `+`-chain, one fragment
/// per continuation line. Literals that look like URLs or filesystem paths
/// are never split, and neither are text blocks.
pub struct LineLength;

/// Substrings that mark a literal as unsplittable.
const PROTECTED_FRAGMENTS: &[&str] = &["://", "http", "https", "/", "\\"];

impl Rule for LineLength {
    fn id(&self) -> &'static str {
        "line-length"
    }

    fn describe(&self) -> &'static str {
        "lines must not exceed the configured maximum length"
    }

    fn validate_config(&self, config: &toml::Value) -> Result<(), RuleConfigError> {
        if let Some(enabled) = config.get("enabled") {
            if !enabled.is_bool() {
                return Err(RuleConfigError {
                    rule: self.id(),
                    message: "`enabled` must be a boolean".to_string(),
                });
            }
        }
        Ok(())
    }

    fn applicable_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CompilationUnit]
    }

    fn visit(&self, ctx: &RuleContext<'_>, _node: NodeIndex) -> Vec<Violation> {
        let max = ctx.config.max_line_length;
        let mut violations = Vec::new();

        for line in 0..ctx.source.line_index().line_count() {
            let Some(text) = ctx.source.line_text(line) else {
                continue;
            };
            let width = text.chars().count() as u32;
            if width <= max {
                continue;
            }

            let line_start = ctx.source.line_index().line_start(line).unwrap();
            let line_end = ctx.source.line_index().line_end(line).unwrap();
            let overflow_start = byte_of_column(text, max);
            let range = TextRange::new(line_start + TextSize::from(overflow_start), line_end);

            let mut violation = Violation::new(
                self.id(),
                Severity::Warning,
                format!("line is {width} characters long, exceeding the limit of {max}"),
                range,
            );
            if let Some(fix) = split_string_fix(text, line_start, ctx.config) {
                violation = violation.with_fix(fix);
            }
            violations.push(violation);
        }

        violations
    }
}

/// Byte offset of the given char column (clamped to the line end).
fn byte_of_column(text: &str, column: u32) -> u32 {
    text.char_indices()
        .nth(column as usize)
        .map(|(idx, _)| idx as u32)
        .unwrap_or(text.len() as u32)
}

struct LiteralSpan {
    /// Byte offsets within the line, including the quotes.
    start: usize,
    end: usize,
}

/// Locate ordinary `"..."` literals in the line (text blocks excluded).
fn find_string_literals(text: &str) -> Vec<LiteralSpan> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => break,
            b'"' => {
                if bytes[i..].starts_with(b"\"\"\"") {
                    // Text blocks are never split.
                    break;
                }
                let start = i;
                i += 1;
                let mut closed = false;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            closed = true;
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                if closed {
                    out.push(LiteralSpan { start, end: i });
                }
            }
            _ => i += 1,
        }
    }
    out
}

/// Build the split fix, or `None` when no safe break exists.
fn split_string_fix(
    text: &str,
    line_start: TextSize,
    config: &FormatConfig,
) -> Option<FixStrategy> {
    let max = config.max_line_length;

    // Split the longest literal on the line; short ones cannot help.
    let literal = find_string_literals(text)
        .into_iter()
        .max_by_key(|l| l.end - l.start)?;
    let content = &text[literal.start + 1..literal.end - 1];

    if PROTECTED_FRAGMENTS.iter().any(|f| content.contains(f)) {
        return None;
    }

    let indent_len = text.len() - text.trim_start_matches([' ', '\t']).len();
    let line_indent = &text[..indent_len];
    let unit = match config.indentation_type {
        IndentationType::Tabs => "\t".to_string(),
        IndentationType::Spaces | IndentationType::Mixed => {
            " ".repeat(config.indentation_size as usize)
        }
    };
    let continuation_indent = format!("{line_indent}{unit}{unit}");
    let continuation_width = visual_width(&continuation_indent, config.tab_width);

    let literal_column = visual_width(&text[..literal.start], config.tab_width);
    let rest_width = text[literal.end..].chars().count() as u32;

    // Char budgets for literal content per emitted line: quotes cost 2, a
    // trailing ` +` costs 2 more on every line but the last.
    let first_budget = max.checked_sub(literal_column + 4)?;
    let cont_budget = max.checked_sub(continuation_width + 4)?;
    let last_budget = max.checked_sub(continuation_width + 2 + rest_width)?;
    if first_budget == 0 || cont_budget == 0 {
        return None;
    }

    let words: Vec<&str> = content.split_inclusive(' ').collect();
    if words.len() < 2 {
        return None;
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in &words {
        let word_width = word.chars().count() as u32;
        let budget = if chunks.is_empty() {
            first_budget
        } else {
            cont_budget
        };
        if word_width > budget {
            // A single word longer than a whole line has no safe break.
            return None;
        }
        let current_width = current.chars().count() as u32;
        if current_width + word_width > budget && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.len() < 2 {
        return None;
    }
    // The final fragment shares its line with whatever trails the literal;
    // bail out rather than emit a rewrite that still overflows.
    if chunks.last().map(|c| c.chars().count() as u32) > Some(last_budget) {
        return None;
    }

    let mut replacement = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            replacement.push_str(" +\n");
            replacement.push_str(&continuation_indent);
        }
        replacement.push('"');
        replacement.push_str(chunk);
        replacement.push('"');
    }

    let range = TextRange::new(
        line_start + TextSize::from(literal.start as u32),
        line_start + TextSize::from(literal.end as u32),
    );
    Some(FixStrategy::replace(
        "split the string literal at word boundaries",
        range,
        replacement,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run_rule;
    use std::sync::Arc;

    fn config(max: u32) -> FormatConfig {
        let mut config = FormatConfig::default();
        config.max_line_length = max;
        config
    }

    fn wrap(line: &str) -> String {
        format!("class A {{\n  void m() {{\n{line}\n  }}\n}}\n")
    }

    #[test]
    fn short_lines_are_fine() {
        let violations = run_rule(Arc::new(LineLength), "class A {}\n", &config(120));
        assert!(violations.is_empty());
    }

    #[test]
    fn url_literals_get_a_violation_but_no_fix() {
        let line = format!(
            "    String url = \"https://example.com/very/long/path/{}\";",
            "x".repeat(150)
        );
        let source = wrap(&line);
        let violations = run_rule(Arc::new(LineLength), &source, &config(120));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].suggested_fixes.is_empty());
        assert!(violations[0].message.contains("exceeding the limit of 120"));
    }

    #[test]
    fn prose_literals_are_split_at_word_boundaries() {
        let words = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor incididunt ut labore et dolore magna aliqua";
        let line = format!("    String text = \"{words}\";");
        let source = wrap(&line);
        let violations = run_rule(Arc::new(LineLength), &source, &config(80));
        assert_eq!(violations.len(), 1);

        let fix = &violations[0].suggested_fixes[0];
        assert!(fix.auto_applicable);
        assert!(fix.replacement_text.contains("\" +\n"));
        // Every emitted piece is a quoted fragment.
        for piece in fix.replacement_text.lines() {
            assert!(piece.trim_start().starts_with('"'));
        }
        // Word-boundary splitting keeps content intact after unquoting.
        let mut rebuilt = String::new();
        for piece in fix.replacement_text.split(" +\n") {
            let piece = piece.trim_start_matches([' ', '\t']);
            rebuilt.push_str(piece.trim_start_matches('"').trim_end_matches('"'));
        }
        assert_eq!(rebuilt, words);
    }

    #[test]
    fn backslash_paths_are_protected() {
        let line = format!(
            "    String path = \"C:\\\\data\\\\{}\";",
            "reports ".repeat(30)
        );
        let source = wrap(&line);
        let violations = run_rule(Arc::new(LineLength), &source, &config(80));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].suggested_fixes.is_empty());
    }

    #[test]
    fn long_lines_without_literals_have_no_fix() {
        let line = format!("    int {} = 1;", "a".repeat(150));
        let source = wrap(&line);
        let violations = run_rule(Arc::new(LineLength), &source, &config(80));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].suggested_fixes.is_empty());
    }
}
