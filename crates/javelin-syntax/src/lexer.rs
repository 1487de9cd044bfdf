//! Hand-written lexer for the Java 25 lexical grammar.
//!
//! The lexer never aborts: malformed input becomes a [`TokenKind::Bad`]
//! token carrying the offending span plus a recoverable [`ParseError`], and
//! scanning resumes at the next plausible boundary. Whitespace and comments
//! are emitted as trivia tokens so downstream consumers keep exact offsets.

use javelin_core::{TextRange, TextSize};

use crate::error::ParseError;
use crate::token::{keyword_kind, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

/// Tokenize `source` into a flat stream terminated by `Eof`.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ParseError>) {
    Lexer::new(source).run()
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::with_capacity(source.len() / 4),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<ParseError>) {
        while self.pos < self.source.len() {
            self.next_token();
        }
        let eof = TextSize::from(self.source.len() as u32);
        self.tokens
            .push(Token::new(TokenKind::Eof, TextRange::new(eof, eof)));
        (self.tokens, self.errors)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(
            kind,
            TextRange::new(
                TextSize::from(start as u32),
                TextSize::from(self.pos as u32),
            ),
        ));
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors.push(ParseError::recoverable(
            message,
            TextRange::new(
                TextSize::from(start as u32),
                TextSize::from(self.pos as u32),
            ),
        ));
    }

    fn next_token(&mut self) {
        let start = self.pos;
        let b = match self.peek() {
            Some(b) => b,
            None => return,
        };

        match b {
            b' ' | b'\t' | b'\n' | b'\r' | 0x0c => {
                while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0c)) {
                    self.pos += 1;
                }
                self.push(TokenKind::Whitespace, start);
            }
            b'/' => match self.peek_at(1) {
                Some(b'/') => self.line_comment(start),
                Some(b'*') => self.block_comment(start),
                Some(b'=') => {
                    self.pos += 2;
                    self.push(TokenKind::SlashAssign, start);
                }
                _ => {
                    self.pos += 1;
                    self.push(TokenKind::Slash, start);
                }
            },
            b'"' => {
                if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
                    self.text_block(start);
                } else {
                    self.string_literal(start);
                }
            }
            b'\'' => self.char_literal(start),
            b'0'..=b'9' => self.number(start),
            b'.' => {
                if matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                    self.number(start);
                } else if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.pos += 3;
                    self.push(TokenKind::Ellipsis, start);
                } else {
                    self.pos += 1;
                    self.push(TokenKind::Dot, start);
                }
            }
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            b'@' => self.single(TokenKind::At),
            b'~' => self.single(TokenKind::Tilde),
            b'?' => self.single(TokenKind::Question),
            b':' => {
                if self.peek_at(1) == Some(b':') {
                    self.pos += 2;
                    self.push(TokenKind::ColonColon, start);
                } else {
                    self.single(TokenKind::Colon);
                }
            }
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::EqEq, start);
                } else {
                    self.single(TokenKind::Assign);
                }
            }
            b'!' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::Ne, start);
                } else {
                    self.single(TokenKind::Bang);
                }
            }
            b'<' => match (self.peek_at(1), self.peek_at(2)) {
                (Some(b'='), _) => {
                    self.pos += 2;
                    self.push(TokenKind::Le, start);
                }
                (Some(b'<'), Some(b'=')) => {
                    self.pos += 3;
                    self.push(TokenKind::ShlAssign, start);
                }
                (Some(b'<'), _) => {
                    self.pos += 2;
                    self.push(TokenKind::Shl, start);
                }
                _ => self.single(TokenKind::Lt),
            },
            // `>` is never combined into `>>`/`>>>` here; the parser glues
            // adjacent `>` tokens back together for shift operators so that
            // nested type arguments like `Map<K, List<V>>` close correctly.
            b'>' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::Ge, start);
                } else {
                    self.single(TokenKind::Gt);
                }
            }
            b'&' => match self.peek_at(1) {
                Some(b'&') => {
                    self.pos += 2;
                    self.push(TokenKind::AmpAmp, start);
                }
                Some(b'=') => {
                    self.pos += 2;
                    self.push(TokenKind::AmpAssign, start);
                }
                _ => self.single(TokenKind::Amp),
            },
            b'|' => match self.peek_at(1) {
                Some(b'|') => {
                    self.pos += 2;
                    self.push(TokenKind::PipePipe, start);
                }
                Some(b'=') => {
                    self.pos += 2;
                    self.push(TokenKind::PipeAssign, start);
                }
                _ => self.single(TokenKind::Pipe),
            },
            b'+' => match self.peek_at(1) {
                Some(b'+') => {
                    self.pos += 2;
                    self.push(TokenKind::PlusPlus, start);
                }
                Some(b'=') => {
                    self.pos += 2;
                    self.push(TokenKind::PlusAssign, start);
                }
                _ => self.single(TokenKind::Plus),
            },
            b'-' => match self.peek_at(1) {
                Some(b'-') => {
                    self.pos += 2;
                    self.push(TokenKind::MinusMinus, start);
                }
                Some(b'=') => {
                    self.pos += 2;
                    self.push(TokenKind::MinusAssign, start);
                }
                Some(b'>') => {
                    self.pos += 2;
                    self.push(TokenKind::Arrow, start);
                }
                _ => self.single(TokenKind::Minus),
            },
            b'*' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::StarAssign, start);
                } else {
                    self.single(TokenKind::Star);
                }
            }
            b'^' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::CaretAssign, start);
                } else {
                    self.single(TokenKind::Caret);
                }
            }
            b'%' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.push(TokenKind::PercentAssign, start);
                } else {
                    self.single(TokenKind::Percent);
                }
            }
            _ => {
                let c = self.peek_char().unwrap_or('\u{FFFD}');
                if is_ident_start(c) {
                    self.identifier_or_keyword(start);
                } else {
                    self.bump_char();
                    self.push(TokenKind::Bad, start);
                    self.error(format!("illegal character `{}`", c.escape_default()), start);
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.pos += 1;
        self.push(kind, start);
    }

    fn line_comment(&mut self, start: usize) {
        while let Some(b) = self.peek() {
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.bump_char();
        }
        self.push(TokenKind::LineComment, start);
    }

    fn block_comment(&mut self, start: usize) {
        let doc = self.peek_at(2) == Some(b'*') && self.peek_at(3) != Some(b'/');
        self.pos += 2;
        let mut terminated = false;
        while let Some(b) = self.peek() {
            if b == b'*' && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                terminated = true;
                break;
            }
            self.bump_char();
        }
        self.push(
            if doc {
                TokenKind::DocComment
            } else {
                TokenKind::BlockComment
            },
            start,
        );
        if !terminated {
            self.error("unterminated block comment", start);
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.bump_char();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = keyword_kind(text).unwrap_or(TokenKind::Ident);
        self.push(kind, start);
    }

    fn number(&mut self, start: usize) {
        let bytes = self.source.as_bytes();
        let mut kind = TokenKind::IntLiteral;

        if bytes[start] == b'0' && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            self.eat_digits(|b| b.is_ascii_hexdigit());
        } else if bytes[start] == b'0' && matches!(self.peek_at(1), Some(b'b' | b'B')) {
            self.pos += 2;
            self.eat_digits(|b| b == b'0' || b == b'1');
        } else {
            self.eat_digits(|b| b.is_ascii_digit());
            if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                kind = TokenKind::DoubleLiteral;
                self.pos += 1;
                self.eat_digits(|b| b.is_ascii_digit());
            } else if bytes[start] == b'.' {
                kind = TokenKind::DoubleLiteral;
            }
            if matches!(self.peek(), Some(b'e' | b'E')) {
                let mark = self.pos;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    kind = TokenKind::DoubleLiteral;
                    self.eat_digits(|b| b.is_ascii_digit());
                } else {
                    // Not an exponent after all (e.g. `1e` in `1enum`).
                    self.pos = mark;
                }
            }
        }

        match self.peek() {
            Some(b'l' | b'L') if kind == TokenKind::IntLiteral => {
                self.pos += 1;
                kind = TokenKind::LongLiteral;
            }
            Some(b'f' | b'F') => {
                self.pos += 1;
                kind = TokenKind::FloatLiteral;
            }
            Some(b'd' | b'D') => {
                self.pos += 1;
                kind = TokenKind::DoubleLiteral;
            }
            _ => {}
        }

        self.push(kind, start);
    }

    fn eat_digits(&mut self, accept: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if accept(b) || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn char_literal(&mut self, start: usize) {
        self.pos += 1;
        let mut closed = false;
        while let Some(c) = self.peek_char() {
            match c {
                '\'' => {
                    self.pos += 1;
                    closed = true;
                    break;
                }
                '\n' | '\r' => break,
                '\\' => {
                    self.bump_char();
                    self.escape_sequence(start);
                }
                _ => {
                    self.bump_char();
                }
            }
        }
        if closed {
            self.push(TokenKind::CharLiteral, start);
        } else {
            self.push(TokenKind::Bad, start);
            self.error("unterminated character literal", start);
        }
    }

    fn string_literal(&mut self, start: usize) {
        self.pos += 1;
        let mut closed = false;
        let mut bad_escape = false;
        while let Some(c) = self.peek_char() {
            match c {
                '"' => {
                    self.pos += 1;
                    closed = true;
                    break;
                }
                '\n' | '\r' => break,
                '\\' => {
                    self.bump_char();
                    if !self.escape_sequence(start) {
                        bad_escape = true;
                    }
                }
                _ => {
                    self.bump_char();
                }
            }
        }
        if closed && !bad_escape {
            self.push(TokenKind::StringLiteral, start);
        } else if closed {
            // Errors already recorded; keep the span as one bad token so the
            // parser resynchronizes past the whole literal.
            self.push(TokenKind::Bad, start);
        } else {
            self.push(TokenKind::Bad, start);
            self.error("unterminated string literal", start);
        }
    }

    fn text_block(&mut self, start: usize) {
        self.pos += 3;
        let mut closed = false;
        while self.pos < self.source.len() {
            if self.peek() == Some(b'"')
                && self.peek_at(1) == Some(b'"')
                && self.peek_at(2) == Some(b'"')
            {
                self.pos += 3;
                closed = true;
                break;
            }
            if self.peek() == Some(b'\\') {
                self.bump_char();
            }
            self.bump_char();
        }
        if closed {
            self.push(TokenKind::TextBlock, start);
        } else {
            self.push(TokenKind::Bad, start);
            self.error("unterminated text block", start);
        }
    }

    /// Consume one escape after the backslash; false if it was invalid.
    fn escape_sequence(&mut self, literal_start: usize) -> bool {
        match self.peek_char() {
            Some('b' | 's' | 't' | 'n' | 'f' | 'r' | '"' | '\'' | '\\') => {
                self.bump_char();
                true
            }
            Some('u') => {
                self.bump_char();
                // Java allows repeated `u`s in a unicode escape.
                while self.peek() == Some(b'u') {
                    self.pos += 1;
                }
                for _ in 0..4 {
                    match self.peek() {
                        Some(b) if b.is_ascii_hexdigit() => self.pos += 1,
                        _ => {
                            self.error("invalid unicode escape", literal_start);
                            return false;
                        }
                    }
                }
                true
            }
            Some('0'..='7') => {
                // Octal escape, up to three digits.
                let mut digits = 0;
                while digits < 3 && matches!(self.peek(), Some(b'0'..=b'7')) {
                    self.pos += 1;
                    digits += 1;
                }
                true
            }
            Some(c) => {
                self.bump_char();
                self.error(
                    format!("invalid escape sequence `\\{}`", c.escape_default()),
                    literal_start,
                );
                false
            }
            None => {
                self.error("invalid escape sequence at end of input", literal_start);
                false
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .0
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("class Foo extends Bar"),
            vec![
                TokenKind::ClassKw,
                TokenKind::Ident,
                TokenKind::ExtendsKw,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        // Contextual keywords stay identifiers at the lexical level.
        assert_eq!(
            kinds("record sealed yield permits var"),
            vec![TokenKind::Ident; 5]
                .into_iter()
                .chain([TokenKind::Eof])
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn tokens_cover_every_byte() {
        let source = "int x = 1 + 2; // done\n";
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty());
        let mut pos = 0u32;
        for token in &tokens {
            assert_eq!(u32::from(token.range.start()), pos, "gap before {token:?}");
            pos = u32::from(token.range.end());
        }
        assert_eq!(pos, source.len() as u32);
    }

    #[test]
    fn numeric_literal_shapes() {
        assert_eq!(kinds("0")[0], TokenKind::IntLiteral);
        assert_eq!(kinds("42L")[0], TokenKind::LongLiteral);
        assert_eq!(kinds("0xFF_EC")[0], TokenKind::IntLiteral);
        assert_eq!(kinds("0b1010")[0], TokenKind::IntLiteral);
        assert_eq!(kinds("1_000_000")[0], TokenKind::IntLiteral);
        assert_eq!(kinds("3.14")[0], TokenKind::DoubleLiteral);
        assert_eq!(kinds("2.5f")[0], TokenKind::FloatLiteral);
        assert_eq!(kinds("1e10")[0], TokenKind::DoubleLiteral);
        assert_eq!(kinds("1.5e-3d")[0], TokenKind::DoubleLiteral);
        assert_eq!(kinds(".5")[0], TokenKind::DoubleLiteral);
    }

    #[test]
    fn string_and_char_literals() {
        assert_eq!(kinds(r#""hello\n""#)[0], TokenKind::StringLiteral);
        assert_eq!(kinds(r"'a'")[0], TokenKind::CharLiteral);
        assert_eq!(kinds(r"'A'")[0], TokenKind::CharLiteral);
        assert_eq!(kinds("\"\"\"\nhi\n\"\"\"")[0], TokenKind::TextBlock);
    }

    #[test]
    fn malformed_input_yields_bad_tokens_not_aborts() {
        let (tokens, errors) = tokenize("int x = \"oops;\nint y = 1;\n");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Bad));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].recoverable);
        assert!(errors[0].message.contains("unterminated string"));
        // Scanning continued on the next line.
        assert!(tokens.iter().filter(|t| t.kind == TokenKind::IntKw).count() == 2);

        let (_, errors) = tokenize(r#"String s = "bad \q escape";"#);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("invalid escape"));

        let (tokens, errors) = tokenize("int § = 1;\n");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Bad));
        assert!(errors[0].message.contains("illegal character"));
    }

    #[test]
    fn gt_is_never_fused() {
        assert_eq!(
            kinds("a >> b"),
            vec![
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Gt,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("x >>= 2")[1..3],
            [TokenKind::Gt, TokenKind::Ge][..]
        );
    }

    #[test]
    fn comment_shapes() {
        let (tokens, _) = tokenize("/** doc */ /* block */ // line\nint x;");
        let trivia: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_trivia() && t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            trivia,
            vec![
                TokenKind::DocComment,
                TokenKind::BlockComment,
                TokenKind::LineComment
            ]
        );
    }
}
