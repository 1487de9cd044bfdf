//! Fix merging: turn a file's violations into one rewritten source.
//!
//! Only auto-applicable fixes participate; advisory fixes are reporting
//! material. The whole batch is rejected on any overlap (the file stays
//! linted but unrewritten), with one exception: a line-length split
//! overlapping a line-consolidation join is resolved by consolidating
//! first and then re-splitting at word boundaries.

use javelin_config::FormatConfig;
use javelin_core::{apply_text_edits, EditError, TextEdit, TextRange};
use javelin_rules::Violation;
use thiserror::Error;

/// Rule id whose fixes split long lines.
const LINE_LENGTH_RULE: &str = "line-length";
/// Rule id whose fixes join underfull lines; its overlaps with line-length
/// get the consolidate-then-split treatment.
const LINE_CONSOLIDATION_RULE: &str = "line-consolidation";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error(
        "fixes from `{first_rule}` (at byte {first_start}) and `{second_rule}` (at byte {second_start}) overlap"
    )]
    Conflict {
        first_rule: String,
        second_rule: String,
        first_start: u32,
        second_start: u32,
    },
    #[error("fix could not be applied: {0}")]
    Apply(#[from] EditError),
}

/// A successful rewrite: the output text plus how many fixes were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub text: String,
    pub applied: usize,
}

#[derive(Debug, Clone)]
struct PlannedFix {
    rule_id: &'static str,
    range: TextRange,
    replacement: String,
}

/// Merge every auto-applicable fix from `violations` into `source`.
///
/// Guarantees:
/// - with no auto-applicable fixes the output is byte-equal to the input;
/// - a successful rewrite leaves the engine nothing further to change
///   (running the pipeline again yields identical bytes).
pub fn rewrite(
    source: &str,
    violations: &[Violation],
    config: &FormatConfig,
) -> Result<RewriteOutcome, RewriteError> {
    let mut fixes: Vec<PlannedFix> = violations
        .iter()
        .flat_map(|violation| {
            violation.auto_fixes().map(move |fix| PlannedFix {
                rule_id: violation.rule_id,
                range: fix.range,
                replacement: fix.replacement_text.clone(),
            })
        })
        .collect();

    if fixes.is_empty() {
        return Ok(RewriteOutcome {
            text: source.to_string(),
            applied: 0,
        });
    }

    fixes.sort_by_key(|f| (f.range.start(), f.range.end()));
    let fixes = resolve_overlaps(source, fixes, config)?;
    let applied = fixes.len();

    let edits: Vec<TextEdit> = fixes
        .into_iter()
        .map(|f| TextEdit::new(f.range, f.replacement))
        .collect();
    let text = apply_text_edits(source, &edits)?;

    tracing::debug!(applied, "applied fixes");
    Ok(RewriteOutcome { text, applied })
}

/// Walk the sorted fixes; merge the one sanctioned overlap, reject all
/// others.
fn resolve_overlaps(
    source: &str,
    fixes: Vec<PlannedFix>,
    config: &FormatConfig,
) -> Result<Vec<PlannedFix>, RewriteError> {
    let mut out: Vec<PlannedFix> = Vec::with_capacity(fixes.len());
    for fix in fixes {
        let Some(last) = out.last() else {
            out.push(fix);
            continue;
        };

        let overlaps = last.range.end() > fix.range.start()
            || (last.range.is_empty()
                && fix.range.is_empty()
                && last.range.start() == fix.range.start());
        if !overlaps {
            out.push(fix);
            continue;
        }

        let pair = (last.rule_id, fix.rule_id);
        let consolidatable = pair == (LINE_LENGTH_RULE, LINE_CONSOLIDATION_RULE)
            || pair == (LINE_CONSOLIDATION_RULE, LINE_LENGTH_RULE);
        if !consolidatable {
            return Err(RewriteError::Conflict {
                first_rule: last.rule_id.to_string(),
                second_rule: fix.rule_id.to_string(),
                first_start: u32::from(last.range.start()),
                second_start: u32::from(fix.range.start()),
            });
        }

        let last = out.pop().expect("just peeked");
        let merged = consolidate_then_split(source, &last, &fix, config);
        out.push(merged);
    }
    Ok(out)
}

/// Resolution for a split/join collision: join every line the two fixes
/// touch into one logical line, then re-wrap it at word boundaries under
/// the configured maximum, keeping the first line's indentation.
fn consolidate_then_split(
    source: &str,
    a: &PlannedFix,
    b: &PlannedFix,
    config: &FormatConfig,
) -> PlannedFix {
    let start = a.range.start().min(b.range.start());
    let end = a.range.end().max(b.range.end());

    // Extend to whole lines so the join sees complete content.
    let bytes = source.as_bytes();
    let mut lo = usize::from(start);
    while lo > 0 && bytes[lo - 1] != b'\n' && bytes[lo - 1] != b'\r' {
        lo -= 1;
    }
    let mut hi = usize::from(end);
    while hi < bytes.len() && bytes[hi] != b'\n' && bytes[hi] != b'\r' {
        hi += 1;
    }
    let slice = &source[lo..hi];

    let indent: String = slice
        .chars()
        .take_while(|&c| c == ' ' || c == '\t')
        .collect();

    // Concatenate.
    let joined = slice
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    // Re-split at word boundaries.
    let max = config.max_line_length as usize;
    let mut lines: Vec<String> = Vec::new();
    let mut current = indent.clone();
    for word in joined.split_whitespace() {
        let candidate_len = current.chars().count() + 1 + word.chars().count();
        if current.trim().is_empty() {
            current.push_str(word);
        } else if candidate_len > max {
            lines.push(std::mem::replace(&mut current, indent.clone()));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }

    PlannedFix {
        rule_id: LINE_LENGTH_RULE,
        range: TextRange::new(
            javelin_core::TextSize::from(lo as u32),
            javelin_core::TextSize::from(hi as u32),
        ),
        replacement: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::TextSize;
    use javelin_rules::{FixStrategy, Severity};

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    fn violation_with_fix(rule_id: &'static str, r: TextRange, replacement: &str) -> Violation {
        Violation::new(rule_id, Severity::Warning, "test", r)
            .with_fix(FixStrategy::replace("test fix", r, replacement))
    }

    #[test]
    fn no_auto_fixes_means_byte_equal_output() {
        let source = "class A {}\n";
        let advisory = Violation::new("line-length", Severity::Warning, "x", range(0, 5)).with_fix(
            FixStrategy::replace("advice", range(0, 5), "B").advisory(),
        );
        let outcome = rewrite(source, &[advisory], &FormatConfig::default()).unwrap();
        assert_eq!(outcome.text, source);
        assert_eq!(outcome.applied, 0);
    }

    #[test]
    fn disjoint_fixes_apply_in_one_pass() {
        let source = "aaa bbb ccc";
        let violations = vec![
            violation_with_fix("trailing-whitespace", range(8, 11), "C"),
            violation_with_fix("indentation", range(0, 3), "A"),
        ];
        let outcome = rewrite(source, &violations, &FormatConfig::default()).unwrap();
        assert_eq!(outcome.text, "A bbb C");
        assert_eq!(outcome.applied, 2);
    }

    #[test]
    fn overlapping_fixes_reject_the_whole_batch() {
        let source = "aaaa bbbb";
        let violations = vec![
            violation_with_fix("indentation", range(0, 6), "x"),
            violation_with_fix("trailing-whitespace", range(4, 9), "y"),
        ];
        let err = rewrite(source, &violations, &FormatConfig::default()).unwrap_err();
        assert!(matches!(err, RewriteError::Conflict { .. }));
    }

    #[test]
    fn line_length_and_consolidation_merge_instead_of_conflicting() {
        let mut config = FormatConfig::default();
        config.max_line_length = 40;
        let source = "    alpha beta gamma delta\n    epsilon zeta eta theta iota kappa\n";
        // A join wants the two lines as one; a split wants to re-break them.
        let violations = vec![
            violation_with_fix("line-consolidation", range(4, 60), "joined"),
            violation_with_fix("line-length", range(30, 66), "split"),
        ];
        let outcome = rewrite(source, &violations, &config).unwrap();
        assert_eq!(outcome.applied, 1);
        for line in outcome.text.lines() {
            assert!(
                line.chars().count() <= 40,
                "line exceeds maximum after consolidate-then-split: {line:?}"
            );
        }
        // Content survives re-wrapping.
        let words: Vec<_> = outcome.text.split_whitespace().collect();
        assert_eq!(
            words,
            vec![
                "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota",
                "kappa"
            ]
        );
    }
}
