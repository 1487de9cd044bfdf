//! Style analysis over the syntax arena.
//!
//! Rules are process-wide singletons registered once at startup; the engine
//! walks each file's arena pre-order, dispatches rules by node kind, and
//! collects located violations with optional byte-range fixes.

use std::path::{Path, PathBuf};

use javelin_config::FormatConfig;
use javelin_core::{SourceText, TextRange};
use javelin_syntax::{NodeArena, NodeIndex, NodeKind};
use thiserror::Error;

mod engine;
mod registry;
mod report;
pub mod rules;

pub use engine::RuleEngine;
pub use registry::RuleRegistry;
pub use report::{render_report, report_to_json};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A byte-range replacement proposed by a rule.
///
/// `auto_applicable` fixes may be merged into a rewrite by the rewriter;
/// everything else is advisory. An empty `replacement_text` deletes the
/// range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixStrategy {
    pub description: String,
    pub auto_applicable: bool,
    pub replacement_text: String,
    pub range: TextRange,
}

impl FixStrategy {
    pub fn replace(
        description: impl Into<String>,
        range: TextRange,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            auto_applicable: true,
            replacement_text: replacement.into(),
            range,
        }
    }

    pub fn advisory(mut self) -> Self {
        self.auto_applicable = false;
        self
    }
}

/// A located, severity-tagged finding. Immutable after construction; the
/// engine fills in file path and line/column before handing it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub message: String,
    pub file_path: PathBuf,
    pub range: TextRange,
    /// 1-based position of `range.start()`.
    pub line: u32,
    pub column: u32,
    /// The node the finding anchors to, or `NodeIndex::NONE`.
    pub node: NodeIndex,
    pub suggested_fixes: Vec<FixStrategy>,
}

impl Violation {
    pub fn new(
        rule_id: &'static str,
        severity: Severity,
        message: impl Into<String>,
        range: TextRange,
    ) -> Self {
        Self {
            rule_id,
            severity,
            message: message.into(),
            file_path: PathBuf::new(),
            range,
            line: 0,
            column: 0,
            node: NodeIndex::NONE,
            suggested_fixes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: NodeIndex) -> Self {
        self.node = node;
        self
    }

    pub fn with_fix(mut self, fix: FixStrategy) -> Self {
        self.suggested_fixes.push(fix);
        self
    }

    /// Fixes the rewriter is allowed to apply.
    pub fn auto_fixes(&self) -> impl Iterator<Item = &FixStrategy> {
        self.suggested_fixes.iter().filter(|f| f.auto_applicable)
    }
}

/// A rule's rejection of its configuration table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid config for rule `{rule}`: {message}")]
pub struct RuleConfigError {
    pub rule: &'static str,
    pub message: String,
}

/// Per-file context handed to every rule invocation.
pub struct RuleContext<'a> {
    pub source: &'a SourceText,
    pub arena: &'a NodeArena,
    pub config: &'a FormatConfig,
    /// This rule's options table from the config, if present.
    pub options: Option<&'a toml::Value>,
    pub path: &'a Path,
}

/// A unit of style analysis.
///
/// Rules hold no per-file state; everything they need arrives through the
/// [`RuleContext`].
pub trait Rule: Send + Sync {
    /// Stable identifier used in config tables and reports.
    fn id(&self) -> &'static str;

    fn describe(&self) -> &'static str;

    /// The rule's defaults, for documentation and config scaffolding.
    fn default_config(&self) -> toml::Value {
        toml::Value::Table(toml::map::Map::new())
    }

    /// Reject malformed options before any file is processed.
    fn validate_config(&self, _config: &toml::Value) -> Result<(), RuleConfigError> {
        Ok(())
    }

    /// Node kinds this rule wants to see. Whole-file rules anchor to the
    /// compilation unit.
    fn applicable_kinds(&self) -> &'static [NodeKind];

    /// Inspect `node` and report findings.
    fn visit(&self, ctx: &RuleContext<'_>, node: NodeIndex) -> Vec<Violation>;
}

/// Run the default rule set over one parsed file.
pub fn lint(
    source: &SourceText,
    arena: &NodeArena,
    path: &Path,
    config: &FormatConfig,
) -> Vec<Violation> {
    RuleEngine::new(RuleRegistry::shared()).lint(source, arena, path, config)
}
