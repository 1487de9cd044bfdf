//! Recursive-descent parser producing the index-overlay arena.
//!
//! Single-threaded driver over the lexer's token stream. Errors never
//! unwind: the parser records a [`ParseError`] and resynchronizes to the
//! next statement terminator, class-body brace, or top-level keyword.
//! Node allocation is post-order (children before parents), which the
//! arena's equality contract depends on.

mod decl;
mod expr;
mod stmt;

use javelin_core::{TextRange, TextSize};

use crate::arena::{NodeArena, NodeIndex, NodeKind};
use crate::error::ParseError;
use crate::lexer;
use crate::strategy::{ParseStrategyRegistry, ParsingPhase};
use crate::token::{Token, TokenKind};
use crate::version::JavaVersion;
use crate::ParseResult;

/// Share of `Bad` tokens past which the stream counts as corrupt and the
/// parse fails outright instead of producing a best-effort arena.
const CORRUPT_STREAM_RATIO: f64 = 0.5;
const CORRUPT_STREAM_MIN_BAD: usize = 8;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// Index of the current non-trivia token.
    pos: usize,
    prev_end: TextSize,
    arena: NodeArena,
    errors: Vec<ParseError>,
    version: JavaVersion,
    registry: &'a ParseStrategyRegistry,
    phase: ParsingPhase,
}

pub(crate) fn parse_source(
    source: &str,
    version: JavaVersion,
    registry: &ParseStrategyRegistry,
) -> ParseResult {
    let (tokens, mut errors) = lexer::tokenize(source);

    let significant = tokens.iter().filter(|t| !t.kind.is_trivia()).count();
    let bad = tokens.iter().filter(|t| t.kind == TokenKind::Bad).count();
    if bad >= CORRUPT_STREAM_MIN_BAD && (bad as f64) >= (significant as f64) * CORRUPT_STREAM_RATIO
    {
        errors.push(ParseError::fatal(
            format!("token stream is corrupt: {bad} of {significant} tokens are malformed"),
            TextRange::new(TextSize::from(0), TextSize::from(source.len() as u32)),
        ));
        return ParseResult::Failure { errors };
    }

    let mut parser = Parser::new(source, tokens, errors, version, registry);
    parser.parse_compilation_unit();
    let Parser { arena, errors, .. } = parser;
    ParseResult::Success { arena, errors }
}

impl<'a> Parser<'a> {
    fn new(
        source: &'a str,
        tokens: Vec<Token>,
        errors: Vec<ParseError>,
        version: JavaVersion,
        registry: &'a ParseStrategyRegistry,
    ) -> Self {
        let mut parser = Self {
            source,
            tokens,
            pos: 0,
            prev_end: TextSize::from(0),
            arena: NodeArena::new(),
            errors,
            version,
            registry,
            phase: ParsingPhase::TopLevel,
        };
        parser.skip_trivia();
        parser
    }

    // ---- cursor -------------------------------------------------------

    fn skip_trivia(&mut self) {
        while self.tokens[self.pos].kind.is_trivia() {
            self.pos += 1;
        }
    }

    #[inline]
    fn current_token(&self) -> Token {
        self.tokens[self.pos]
    }

    /// Kind of the current (non-trivia) token.
    #[inline]
    pub fn current(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Kind of the `n`-th non-trivia token ahead of the cursor.
    pub fn nth(&self, n: usize) -> TokenKind {
        self.nth_token(n).kind
    }

    fn nth_token(&self, n: usize) -> Token {
        let mut remaining = n;
        let mut idx = self.pos;
        loop {
            let token = self.tokens[idx];
            if token.kind == TokenKind::Eof {
                return token;
            }
            if !token.kind.is_trivia() {
                if remaining == 0 {
                    return token;
                }
                remaining -= 1;
            }
            idx += 1;
        }
    }

    #[inline]
    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Current token is the identifier `text` (a contextual keyword test).
    pub fn at_contextual(&self, text: &str) -> bool {
        self.at(TokenKind::Ident) && self.current_text() == text
    }

    pub fn nth_is_contextual(&self, n: usize, text: &str) -> bool {
        let token = self.nth_token(n);
        token.kind == TokenKind::Ident && token.text(self.source) == text
    }

    fn current_text(&self) -> &'a str {
        self.current_token().text(self.source)
    }

    fn nth_text(&self, n: usize) -> &'a str {
        self.nth_token(n).text(self.source)
    }

    fn cur_start(&self) -> TextSize {
        self.current_token().range.start()
    }

    fn prev_end(&self) -> TextSize {
        self.prev_end
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        self.prev_end = self.current_token().range.end();
        self.pos += 1;
        self.skip_trivia();
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record an error at the current token.
    fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(format!(
            "expected {what}, found `{}`",
            self.describe_current()
        ));
        false
    }

    fn describe_current(&self) -> String {
        if self.at_eof() {
            "end of file".to_string()
        } else {
            self.current_text().to_string()
        }
    }

    /// Two `>` tokens with nothing (not even trivia) between them, as in the
    /// shift operator `>>` split apart for generics.
    fn at_adjacent_gt_pair(&self) -> bool {
        self.at(TokenKind::Gt)
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Gt)
    }

    fn at_adjacent_gt_then(&self, kind: TokenKind) -> bool {
        self.at(TokenKind::Gt) && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(kind)
    }

    // ---- errors and recovery ------------------------------------------

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_token().range;
        self.error_at(range, message);
    }

    fn error_at(&mut self, range: TextRange, message: impl Into<String>) {
        self.errors.push(ParseError::recoverable(message, range));
    }

    /// Skip tokens until one of `set` (or EOF); brace-aware so an opening
    /// brace inside skipped garbage doesn't end recovery early.
    fn recover_to(&mut self, set: &[TokenKind]) {
        let mut depth = 0u32;
        while !self.at_eof() {
            let kind = self.current();
            if depth == 0 && set.contains(&kind) {
                return;
            }
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
    }

    // ---- node building ------------------------------------------------

    /// Allocate `kind` spanning `start` to the end of the last consumed
    /// token, and link `children` in order. Children were allocated first,
    /// so the arena stays in post-order. `NONE` entries (from productions
    /// that gave up) are dropped.
    fn finish_node(
        &mut self,
        kind: NodeKind,
        start: TextSize,
        children: Vec<NodeIndex>,
    ) -> NodeIndex {
        let (lo, hi) = self.node_extent(start, &children);
        let node = self.arena.allocate(kind, TextRange::new(lo, hi));
        for child in children {
            if child.is_some() {
                self.arena.append_child(node, child);
            }
        }
        node
    }

    fn finish_node_with_attr(
        &mut self,
        kind: NodeKind,
        start: TextSize,
        children: Vec<NodeIndex>,
        attr: crate::arena::NodeAttr,
    ) -> NodeIndex {
        let (lo, hi) = self.node_extent(start, &children);
        let node = self
            .arena
            .allocate_with_attr(kind, TextRange::new(lo, hi), attr);
        for child in children {
            if child.is_some() {
                self.arena.append_child(node, child);
            }
        }
        node
    }

    fn node_extent(&self, start: TextSize, children: &[NodeIndex]) -> (TextSize, TextSize) {
        let mut lo = start;
        let mut hi = self.prev_end.max(start);
        for &child in children {
            if child.is_none() {
                continue;
            }
            let range = self.arena.range(child);
            lo = lo.min(range.start());
            hi = hi.max(range.end());
        }
        (lo, hi)
    }

    // ---- driver -------------------------------------------------------

    #[inline]
    pub fn version(&self) -> JavaVersion {
        self.version
    }

    fn with_phase<T>(&mut self, phase: ParsingPhase, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.phase;
        self.phase = phase;
        let result = f(self);
        self.phase = saved;
        result
    }

    /// Ask the registry for a strategy owning the construct at the cursor.
    fn find_strategy(&self) -> Option<std::sync::Arc<dyn crate::strategy::ParseStrategy>> {
        self.registry.find_strategy(self.version, self.phase, self)
    }

    fn parse_compilation_unit(&mut self) {
        let _span = tracing::debug_span!("parse_compilation_unit", version = %self.version).entered();

        let mut children = Vec::new();

        if self.at_package_declaration() {
            let node = self.parse_package_declaration();
            if node.is_some() {
                children.push(node);
            }
        }

        while self.at(TokenKind::ImportKw) {
            let node = self.parse_import_declaration();
            if node.is_some() {
                children.push(node);
            }
        }

        while !self.at_eof() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            let before = self.pos;
            let node = self.parse_type_declaration();
            if node.is_some() {
                children.push(node);
            }
            if self.pos == before {
                // No progress: drop the offending token and carry on.
                self.error(format!(
                    "expected a type declaration, found `{}`",
                    self.describe_current()
                ));
                self.bump();
                self.recover_to(&[
                    TokenKind::ClassKw,
                    TokenKind::InterfaceKw,
                    TokenKind::EnumKw,
                    TokenKind::At,
                    TokenKind::Semicolon,
                ]);
            }
        }

        // The root always covers the whole source.
        let root = self.arena.allocate(
            NodeKind::CompilationUnit,
            TextRange::new(TextSize::from(0), TextSize::from(self.source.len() as u32)),
        );
        for child in children {
            self.arena.append_child(root, child);
        }
    }
}
