//! Built-in rules.

use std::sync::Arc;

use crate::Rule;

mod final_newline;
mod import_organization;
mod indentation;
mod line_ending;
mod line_length;
mod trailing_whitespace;

pub use final_newline::FinalNewline;
pub use import_organization::ImportOrganization;
pub use indentation::Indentation;
pub use line_ending::LineEndings;
pub use line_length::LineLength;
pub use trailing_whitespace::TrailingWhitespace;

/// Everything the default registry ships with.
pub fn default_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(LineLength),
        Arc::new(ImportOrganization),
        Arc::new(Indentation),
        Arc::new(TrailingWhitespace),
        Arc::new(FinalNewline),
        Arc::new(LineEndings),
    ]
}

/// Render one char column width, with tabs advancing to the next stop.
pub(crate) fn visual_width(text: &str, tab_width: u8) -> u32 {
    let tab = u32::from(tab_width.max(1));
    let mut width = 0u32;
    for c in text.chars() {
        if c == '\t' {
            width = (width / tab + 1) * tab;
        } else {
            width += 1;
        }
    }
    width
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::sync::Arc;

    use javelin_config::FormatConfig;
    use javelin_core::SourceText;

    use crate::{Rule, RuleEngine, RuleRegistry, Violation};

    /// Parse `source`, run a single rule over it, and return its findings.
    pub fn run_rule(rule: Arc<dyn Rule>, source: &str, config: &FormatConfig) -> Vec<Violation> {
        let text = SourceText::new(source);
        let arena = javelin_syntax::parse(source)
            .into_arena()
            .expect("test sources parse");
        let mut builder = RuleRegistry::empty();
        builder.register(rule);
        let engine = RuleEngine::new(builder.build());
        engine.lint(&text, &arena, Path::new("Test.java"), config)
    }
}
