//! Java 25 front end: lexer, index-overlay AST arena, and a version-aware
//! recursive-descent parser with pluggable parse strategies.

use std::sync::OnceLock;

mod arena;
mod error;
mod lexer;
mod parser;
mod strategy;
mod token;
mod version;

pub use arena::{Children, LiteralKind, NodeArena, NodeAttr, NodeIndex, NodeKind, Preorder};
pub use error::ParseError;
pub use lexer::tokenize;
pub use parser::Parser;
pub use strategy::{
    ParseStrategy, ParseStrategyRegistry, ParsingPhase, KEYWORD_PRIORITY, PHASE_PRIORITY,
};
pub use token::{keyword_kind, Token, TokenKind};
pub use version::JavaVersion;

/// Outcome of parsing one compilation unit.
///
/// `Success` still carries recoverable errors: a best-effort arena is built
/// even for malformed input. `Failure` is reserved for a token stream too
/// corrupt to shape into a compilation unit.
#[derive(Debug)]
pub enum ParseResult {
    Success {
        arena: NodeArena,
        errors: Vec<ParseError>,
    },
    Failure {
        errors: Vec<ParseError>,
    },
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    pub fn arena(&self) -> Option<&NodeArena> {
        match self {
            ParseResult::Success { arena, .. } => Some(arena),
            ParseResult::Failure { .. } => None,
        }
    }

    pub fn into_arena(self) -> Option<NodeArena> {
        match self {
            ParseResult::Success { arena, .. } => Some(arena),
            ParseResult::Failure { .. } => None,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        match self {
            ParseResult::Success { errors, .. } | ParseResult::Failure { errors } => errors,
        }
    }
}

/// Parse with the latest supported Java version and the default strategies.
pub fn parse(source: &str) -> ParseResult {
    parse_with(source, JavaVersion::LATEST, default_registry())
}

/// Parse targeting a specific version with a caller-provided registry.
pub fn parse_with(
    source: &str,
    version: JavaVersion,
    registry: &ParseStrategyRegistry,
) -> ParseResult {
    parser::parse_source(source, version, registry)
}

/// The process-wide default strategy registry, built once and then frozen.
pub fn default_registry() -> &'static ParseStrategyRegistry {
    static REGISTRY: OnceLock<ParseStrategyRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ParseStrategyRegistry::with_defaults)
}
