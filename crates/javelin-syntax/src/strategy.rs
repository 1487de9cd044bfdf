//! Version-aware parse strategies.
//!
//! A strategy is a plug-in production selected by (language version, parsing
//! phase, current token). The registry keeps one priority-ordered list per
//! version; lookup falls back to the nearest lower registered version, so a
//! strategy registered for Java 14 also serves Java 21 unless something more
//! specific shadows it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::arena::NodeIndex;
use crate::parser::Parser;
use crate::version::JavaVersion;

/// Syntactic context used to disambiguate strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsingPhase {
    TopLevel,
    ClassBody,
    MethodBody,
    ConstructorBody,
    InitializerBlock,
}

/// Priority band for strategies triggered by a leading keyword.
pub const KEYWORD_PRIORITY: i32 = 10;
/// Priority band for strategies that also inspect the parsing phase.
pub const PHASE_PRIORITY: i32 = 15;

pub trait ParseStrategy: Send + Sync {
    /// Whether this strategy owns the construct at the parser's cursor.
    fn can_handle(&self, version: JavaVersion, phase: ParsingPhase, parser: &Parser<'_>) -> bool;

    /// Parse the construct and return its node. The strategy owns the whole
    /// subtree; the caller splices the result into the parent.
    fn parse(&self, parser: &mut Parser<'_>) -> NodeIndex;

    fn priority(&self) -> i32;

    fn description(&self) -> &str;
}

/// Registry of strategies, frozen after startup and shared read-only.
#[derive(Default)]
pub struct ParseStrategyRegistry {
    by_version: BTreeMap<JavaVersion, Vec<Arc<dyn ParseStrategy>>>,
}

impl ParseStrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in roster.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JavaVersion::Java14, Arc::new(RecordDeclarations));
        registry.register(JavaVersion::Java17, Arc::new(SealedTypes));
        registry.register(JavaVersion::Java25, Arc::new(FlexibleConstructorBodies));
        registry
    }

    /// Register a strategy for `version`. Lists stay sorted by priority
    /// descending; ties keep registration order.
    pub fn register(&mut self, version: JavaVersion, strategy: Arc<dyn ParseStrategy>) {
        let list = self.by_version.entry(version).or_default();
        list.push(strategy);
        list.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    /// First strategy that can handle the construct, scanning the requested
    /// version first and then falling back to lower registered versions.
    pub fn find_strategy(
        &self,
        version: JavaVersion,
        phase: ParsingPhase,
        parser: &Parser<'_>,
    ) -> Option<Arc<dyn ParseStrategy>> {
        for (_, list) in self.by_version.range(..=version).rev() {
            for strategy in list {
                if strategy.can_handle(version, phase, parser) {
                    return Some(strategy.clone());
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }
}

impl std::fmt::Debug for ParseStrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (version, list) in &self.by_version {
            map.entry(
                version,
                &list.iter().map(|s| s.description()).collect::<Vec<_>>(),
            );
        }
        map.finish()
    }
}

/// `record Point(int x, int y) { }` — records landed in Java 14 (preview).
struct RecordDeclarations;

impl ParseStrategy for RecordDeclarations {
    // Keyword band: the trigger is the contextual `record` keyword, in any
    // phase (local records inside method bodies are legal).
    fn can_handle(&self, _version: JavaVersion, _phase: ParsingPhase, parser: &Parser<'_>) -> bool {
        parser.upcoming_record_declaration()
    }

    fn parse(&self, parser: &mut Parser<'_>) -> NodeIndex {
        parser.parse_featured_type_declaration()
    }

    fn priority(&self) -> i32 {
        KEYWORD_PRIORITY
    }

    fn description(&self) -> &str {
        "record declarations (JEP 395)"
    }
}

/// `sealed interface Shape permits Circle, Square` — Java 17.
struct SealedTypes;

impl ParseStrategy for SealedTypes {
    // Keyword band, but sealed hierarchies only appear in type-declaration
    // positions, so the phase still participates.
    fn can_handle(&self, _version: JavaVersion, phase: ParsingPhase, parser: &Parser<'_>) -> bool {
        matches!(phase, ParsingPhase::TopLevel | ParsingPhase::ClassBody)
            && parser.upcoming_sealed_modifier()
    }

    fn parse(&self, parser: &mut Parser<'_>) -> NodeIndex {
        parser.parse_featured_type_declaration()
    }

    fn priority(&self) -> i32 {
        KEYWORD_PRIORITY
    }

    fn description(&self) -> &str {
        "sealed type declarations (JEP 409)"
    }
}

/// Flexible constructor bodies (JEP 513): statements may precede the
/// explicit `super(...)` / `this(...)` invocation.
struct FlexibleConstructorBodies;

impl ParseStrategy for FlexibleConstructorBodies {
    fn can_handle(&self, version: JavaVersion, phase: ParsingPhase, parser: &Parser<'_>) -> bool {
        version == JavaVersion::Java25
            && phase == ParsingPhase::ConstructorBody
            && parser.at(crate::token::TokenKind::LBrace)
    }

    fn parse(&self, parser: &mut Parser<'_>) -> NodeIndex {
        parser.parse_flexible_constructor_block()
    }

    fn priority(&self) -> i32 {
        PHASE_PRIORITY
    }

    fn description(&self) -> &str {
        "flexible constructor bodies (JEP 513)"
    }
}
