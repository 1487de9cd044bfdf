//! Expressions: precedence climbing over the binary operator table, with
//! bounded lookahead for the grammar's classic ambiguities (lambda vs.
//! parenthesized expression, cast vs. grouping, generics vs. comparison).

use javelin_core::TextRange;

use crate::arena::{LiteralKind, NodeAttr, NodeIndex, NodeKind};
use crate::strategy::ParsingPhase;
use crate::token::TokenKind;

use super::Parser;

/// Binding powers for binary operators; higher binds tighter.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    let prec = match kind {
        TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::Pipe => 3,
        TokenKind::Caret => 4,
        TokenKind::Amp => 5,
        TokenKind::EqEq | TokenKind::Ne => 6,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge | TokenKind::InstanceofKw => 7,
        TokenKind::Shl => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
        _ => return None,
    };
    Some(prec)
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> NodeIndex {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> NodeIndex {
        if self.lambda_ahead() {
            return self.parse_lambda();
        }

        let lhs = self.parse_conditional();
        if lhs.is_none() {
            return lhs;
        }

        if let Some((op, tokens)) = self.assignment_operator() {
            let start = self.arena.range(lhs).start();
            for _ in 0..tokens {
                self.bump();
            }
            let rhs = self.parse_assignment();
            let children = if rhs.is_some() { vec![lhs, rhs] } else { vec![lhs] };
            return self.finish_node_with_attr(
                NodeKind::AssignmentExpression,
                start,
                children,
                NodeAttr::Operator { text: op.to_string() },
            );
        }

        lhs
    }

    /// The assignment operator at the cursor, with the number of raw tokens
    /// it spans (shift-assignments arrive as split `>` tokens).
    fn assignment_operator(&self) -> Option<(&'static str, usize)> {
        let op = match self.current() {
            TokenKind::Assign => ("=", 1),
            TokenKind::PlusAssign => ("+=", 1),
            TokenKind::MinusAssign => ("-=", 1),
            TokenKind::StarAssign => ("*=", 1),
            TokenKind::SlashAssign => ("/=", 1),
            TokenKind::AmpAssign => ("&=", 1),
            TokenKind::PipeAssign => ("|=", 1),
            TokenKind::CaretAssign => ("^=", 1),
            TokenKind::PercentAssign => ("%=", 1),
            TokenKind::ShlAssign => ("<<=", 1),
            TokenKind::Gt => {
                if self.at_adjacent_gt_then(TokenKind::Gt)
                    && self.tokens.get(self.pos + 2).map(|t| t.kind) == Some(TokenKind::Ge)
                {
                    (">>>=", 3)
                } else if self.at_adjacent_gt_then(TokenKind::Ge) {
                    (">>=", 2)
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(op)
    }

    fn parse_conditional(&mut self) -> NodeIndex {
        let cond = self.parse_binary(0);
        if cond.is_none() || !self.at(TokenKind::Question) {
            return cond;
        }
        let start = self.arena.range(cond).start();
        self.bump(); // `?`
        let mut children = vec![cond];
        let then = self.parse_expression();
        if then.is_some() {
            children.push(then);
        }
        self.expect(TokenKind::Colon, "`:` in the conditional expression");
        let alt = self.parse_conditional();
        if alt.is_some() {
            children.push(alt);
        }
        self.finish_node(NodeKind::ConditionalExpression, start, children)
    }

    fn parse_binary(&mut self, min_prec: u8) -> NodeIndex {
        let mut lhs = self.parse_unary();
        if lhs.is_none() {
            return lhs;
        }

        loop {
            let (op_kind, op_text, op_tokens) = match self.peek_binary_operator() {
                Some(op) => op,
                None => break,
            };
            let prec = binary_precedence(op_kind).expect("peeked operator has a precedence");
            if prec < min_prec {
                break;
            }

            if op_kind == TokenKind::InstanceofKw {
                lhs = self.parse_instanceof_tail(lhs);
                continue;
            }

            for _ in 0..op_tokens {
                self.bump();
            }
            let rhs = self.parse_binary(prec + 1);
            let start = self.arena.range(lhs).start();
            let children = if rhs.is_some() { vec![lhs, rhs] } else { vec![lhs] };
            lhs = self.finish_node_with_attr(
                NodeKind::BinaryExpression,
                start,
                children,
                NodeAttr::Operator {
                    text: op_text.to_string(),
                },
            );
        }

        lhs
    }

    /// The binary operator at the cursor, if any, with its rendered text and
    /// raw token count (`>>` / `>>>` arrive as adjacent `>` tokens).
    fn peek_binary_operator(&self) -> Option<(TokenKind, &'static str, usize)> {
        let kind = self.current();
        if kind == TokenKind::Gt {
            // Shift operators are recombined here; plain `>` is relational,
            // and `>`-sequences ending in `>=` belong to assignment.
            if self.at_adjacent_gt_then(TokenKind::Ge) {
                return None; // `>>=`
            }
            if self.at_adjacent_gt_pair() {
                let third = self.tokens.get(self.pos + 2).map(|t| t.kind);
                if third == Some(TokenKind::Ge) {
                    return None; // `>>>=`
                }
                if third == Some(TokenKind::Gt) {
                    return Some((TokenKind::Shl, ">>>", 3));
                }
                return Some((TokenKind::Shl, ">>", 2));
            }
            return Some((TokenKind::Gt, ">", 1));
        }
        let text = match kind {
            TokenKind::Ge => ">=",
            TokenKind::PipePipe => "||",
            TokenKind::AmpAmp => "&&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Amp => "&",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::InstanceofKw => "instanceof",
            TokenKind::Shl => "<<",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            _ => return None,
        };
        Some((kind, text, 1))
    }

    /// `expr instanceof [final] Type [binding]`.
    fn parse_instanceof_tail(&mut self, operand: NodeIndex) -> NodeIndex {
        let start = self.arena.range(operand).start();
        self.bump(); // `instanceof`
        self.eat(TokenKind::FinalKw);
        let _ = self.parse_type_ref();
        let children = vec![operand];
        if self.at(TokenKind::Ident) {
            // Pattern binding: `x instanceof String s`.
            let text = self.current_text().to_string();
            self.bump();
            self.finish_node_with_attr(
                NodeKind::InstanceofExpression,
                start,
                children,
                NodeAttr::Name { text },
            )
        } else {
            self.finish_node(NodeKind::InstanceofExpression, start, children)
        }
    }

    fn parse_unary(&mut self) -> NodeIndex {
        match self.current() {
            TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde => {
                let start = self.cur_start();
                let op = self.current_text().to_string();
                self.bump();
                let operand = self.parse_unary();
                let children = if operand.is_some() { vec![operand] } else { Vec::new() };
                self.finish_node_with_attr(
                    NodeKind::UnaryExpression,
                    start,
                    children,
                    NodeAttr::Operator { text: op },
                )
            }
            TokenKind::LParen if self.cast_ahead() => {
                let start = self.cur_start();
                self.bump(); // `(`
                let _ = self.parse_type_ref();
                while self.eat(TokenKind::Amp) {
                    // Intersection cast `(Foo & Bar) x`.
                    let _ = self.parse_type_ref();
                }
                self.expect(TokenKind::RParen, "`)` to close the cast");
                let operand = self.parse_unary();
                let children = if operand.is_some() { vec![operand] } else { Vec::new() };
                self.finish_node(NodeKind::CastExpression, start, children)
            }
            _ => self.parse_postfix(),
        }
    }

    /// Cast-vs-grouping tie-break: `(` type `)` followed by a token that can
    /// begin the cast operand. Primitive casts also allow `+`/`-`.
    fn cast_ahead(&self) -> bool {
        debug_assert!(self.at(TokenKind::LParen));
        let primitive = self.nth(1).is_primitive_type();
        let Some(n) = self.scan_type(1) else {
            return false;
        };
        let mut end = n;
        // Intersection casts.
        let mut budget = 16usize;
        while self.nth(end) == TokenKind::Amp && budget > 0 {
            budget -= 1;
            match self.scan_type(end + 1) {
                Some(next) => end = next,
                None => return false,
            }
        }
        if self.nth(end) != TokenKind::RParen {
            return false;
        }
        let after = self.nth(end + 1);
        if primitive {
            return after.is_literal()
                || matches!(
                    after,
                    TokenKind::Ident
                        | TokenKind::LParen
                        | TokenKind::Plus
                        | TokenKind::Minus
                        | TokenKind::Tilde
                        | TokenKind::Bang
                        | TokenKind::ThisKw
                        | TokenKind::SuperKw
                        | TokenKind::NewKw
                );
        }
        after.is_literal()
            || matches!(
                after,
                TokenKind::Ident
                    | TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::ThisKw
                    | TokenKind::SuperKw
                    | TokenKind::NewKw
                    | TokenKind::SwitchKw
            )
    }

    fn parse_postfix(&mut self) -> NodeIndex {
        let mut expr = self.parse_primary();
        if expr.is_none() {
            return expr;
        }

        loop {
            match self.current() {
                TokenKind::Dot => {
                    let start = self.arena.range(expr).start();
                    match self.nth(1) {
                        TokenKind::Ident => {
                            // Explicit type arguments of a generic call sit
                            // between `.` and the method name.
                            self.bump(); // `.`
                            let name = self.current_text().to_string();
                            self.bump();
                            if self.at(TokenKind::LParen) {
                                let mut children = vec![expr];
                                let mut args = self.parse_argument_list();
                                children.append(&mut args);
                                expr = self.finish_node_with_attr(
                                    NodeKind::MethodInvocation,
                                    start,
                                    children,
                                    NodeAttr::Name { text: name },
                                );
                            } else {
                                expr = self.finish_node_with_attr(
                                    NodeKind::FieldAccess,
                                    start,
                                    vec![expr],
                                    NodeAttr::Name { text: name },
                                );
                            }
                        }
                        TokenKind::Lt => {
                            self.bump(); // `.`
                            self.parse_optional_type_parameters();
                            if !self.at(TokenKind::Ident) {
                                self.error("expected method name after type arguments");
                                return expr;
                            }
                            let name = self.current_text().to_string();
                            self.bump();
                            let mut children = vec![expr];
                            if self.at(TokenKind::LParen) {
                                let mut args = self.parse_argument_list();
                                children.append(&mut args);
                            }
                            expr = self.finish_node_with_attr(
                                NodeKind::MethodInvocation,
                                start,
                                children,
                                NodeAttr::Name { text: name },
                            );
                        }
                        TokenKind::NewKw => {
                            // Qualified instantiation `expr.new Inner(args)`:
                            // `.new` continues the primary expression.
                            self.bump(); // `.`
                            expr = self.parse_object_creation(Some(expr));
                        }
                        TokenKind::ClassKw => {
                            self.bump();
                            self.bump();
                            expr = self.finish_node(NodeKind::ClassLiteral, start, vec![expr]);
                        }
                        TokenKind::ThisKw => {
                            self.bump();
                            self.bump();
                            expr = self.finish_node_with_attr(
                                NodeKind::FieldAccess,
                                start,
                                vec![expr],
                                NodeAttr::Name {
                                    text: "this".to_string(),
                                },
                            );
                        }
                        TokenKind::SuperKw => {
                            self.bump();
                            self.bump();
                            expr = self.finish_node_with_attr(
                                NodeKind::FieldAccess,
                                start,
                                vec![expr],
                                NodeAttr::Name {
                                    text: "super".to_string(),
                                },
                            );
                        }
                        _ => {
                            self.error(format!(
                                "expected a member after `.`, found `{}`",
                                self.nth_text(1)
                            ));
                            self.bump();
                            return expr;
                        }
                    }
                }
                TokenKind::ColonColon => {
                    let start = self.arena.range(expr).start();
                    self.bump(); // `::`
                    if self.at(TokenKind::Lt) {
                        self.parse_optional_type_parameters();
                    }
                    let name = if self.at(TokenKind::NewKw) {
                        self.bump();
                        "new".to_string()
                    } else if self.at(TokenKind::Ident) {
                        let text = self.current_text().to_string();
                        self.bump();
                        text
                    } else {
                        self.error("expected method name or `new` after `::`");
                        String::new()
                    };
                    expr = self.finish_node_with_attr(
                        NodeKind::MethodReference,
                        start,
                        vec![expr],
                        NodeAttr::Name { text: name },
                    );
                }
                TokenKind::LBracket => {
                    let start = self.arena.range(expr).start();
                    self.bump(); // `[`
                    let index = self.parse_expression();
                    self.expect(TokenKind::RBracket, "`]` to close the index");
                    let children = if index.is_some() { vec![expr, index] } else { vec![expr] };
                    expr = self.finish_node(NodeKind::ArrayAccess, start, children);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let start = self.arena.range(expr).start();
                    let op = self.current_text().to_string();
                    self.bump();
                    expr = self.finish_node_with_attr(
                        NodeKind::PostfixExpression,
                        start,
                        vec![expr],
                        NodeAttr::Operator { text: op },
                    );
                }
                _ => break,
            }
        }

        expr
    }

    fn parse_primary(&mut self) -> NodeIndex {
        let kind = self.current();

        if let Some(literal) = literal_kind(kind) {
            let start = self.cur_start();
            self.bump();
            return self.finish_node_with_attr(
                NodeKind::Literal,
                start,
                Vec::new(),
                NodeAttr::Literal { kind: literal },
            );
        }

        match kind {
            TokenKind::LParen => {
                let start = self.cur_start();
                self.bump();
                let inner = self.parse_expression();
                self.expect(TokenKind::RParen, "`)` to close the expression");
                let children = if inner.is_some() { vec![inner] } else { Vec::new() };
                self.finish_node(NodeKind::ParenthesizedExpression, start, children)
            }
            TokenKind::ThisKw => {
                let start = self.cur_start();
                self.bump();
                let this = self.finish_node(NodeKind::ThisExpression, start, Vec::new());
                if self.at(TokenKind::LParen) {
                    // `this(...)`: an explicit constructor invocation.
                    let mut children = vec![this];
                    let mut args = self.parse_argument_list();
                    children.append(&mut args);
                    self.finish_node_with_attr(
                        NodeKind::MethodInvocation,
                        start,
                        children,
                        NodeAttr::Name {
                            text: "this".to_string(),
                        },
                    )
                } else {
                    this
                }
            }
            TokenKind::SuperKw => {
                let start = self.cur_start();
                self.bump();
                let sup = self.finish_node(NodeKind::SuperExpression, start, Vec::new());
                if self.at(TokenKind::LParen) {
                    // `super(...)`: an explicit constructor invocation.
                    let mut children = vec![sup];
                    let mut args = self.parse_argument_list();
                    children.append(&mut args);
                    self.finish_node_with_attr(
                        NodeKind::MethodInvocation,
                        start,
                        children,
                        NodeAttr::Name {
                            text: "super".to_string(),
                        },
                    )
                } else {
                    sup
                }
            }
            TokenKind::NewKw => self.parse_object_creation(None),
            TokenKind::SwitchKw => self.parse_switch(NodeKind::SwitchExpression),
            TokenKind::Ident => self.parse_name_or_call(),
            _ if kind.is_primitive_type() || kind == TokenKind::VoidKw => {
                // `int.class`, `void.class`, `int[]::new`, ...
                let start = self.cur_start();
                let text = self.current_text().to_string();
                self.bump();
                while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
                    self.bump();
                    self.bump();
                }
                self.finish_node_with_attr(
                    NodeKind::Identifier,
                    start,
                    Vec::new(),
                    NodeAttr::Name { text },
                )
            }
            _ => {
                self.error(format!(
                    "expected an expression, found `{}`",
                    self.describe_current()
                ));
                if !matches!(
                    kind,
                    TokenKind::RBrace
                        | TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::Eof
                ) {
                    let start = self.cur_start();
                    self.bump();
                    return self.finish_node(NodeKind::Error, start, Vec::new());
                }
                NodeIndex::NONE
            }
        }
    }

    /// An identifier: an unqualified call, a lone name, or a dotted name
    /// chain (`a.b.c`) folded into one QualifiedName node.
    fn parse_name_or_call(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let first = self.current_text().to_string();
        self.bump();

        if self.at(TokenKind::LParen) {
            let children = self.parse_argument_list();
            return self.finish_node_with_attr(
                NodeKind::MethodInvocation,
                start,
                children,
                NodeAttr::Name { text: first },
            );
        }

        let mut path = first;
        let mut segments = 1usize;
        while self.at(TokenKind::Dot)
            && self.nth(1) == TokenKind::Ident
            && self.nth(2) != TokenKind::LParen
        {
            self.bump();
            path.push('.');
            path.push_str(self.current_text());
            self.bump();
            segments += 1;
        }

        let kind = if segments == 1 {
            NodeKind::Identifier
        } else {
            NodeKind::QualifiedName
        };
        self.finish_node_with_attr(kind, start, Vec::new(), NodeAttr::Name { text: path })
    }

    /// `new Type(args) [body]` or `new Type[dims][...]{init}`; `qualifier`
    /// is set for `expr.new Inner(...)`.
    fn parse_object_creation(&mut self, qualifier: Option<NodeIndex>) -> NodeIndex {
        let start = match qualifier {
            Some(q) => self.arena.range(q).start(),
            None => self.cur_start(),
        };
        self.bump(); // `new`
        if self.at(TokenKind::Lt) {
            self.parse_optional_type_parameters();
        }

        let type_name = self.parse_type_ref_base().unwrap_or_else(|| {
            self.error(format!(
                "expected a type after `new`, found `{}`",
                self.describe_current()
            ));
            String::new()
        });

        let mut children = Vec::new();
        if let Some(q) = qualifier {
            children.push(q);
        }

        if self.at(TokenKind::LBracket) {
            // Array creation: sized dims, then bare dims, then an optional
            // initializer (`new int[]{1, 2}`).
            while self.at(TokenKind::LBracket) {
                self.bump();
                if !self.at(TokenKind::RBracket) {
                    let dim = self.parse_expression();
                    if dim.is_some() {
                        children.push(dim);
                    }
                }
                self.expect(TokenKind::RBracket, "`]` to close the array dimension");
            }
            if self.at(TokenKind::LBrace) {
                let init = self.parse_array_initializer();
                if init.is_some() {
                    children.push(init);
                }
            }
            return self.finish_node(NodeKind::ArrayCreation, start, children);
        }

        if self.at(TokenKind::LParen) {
            let mut args = self.parse_argument_list();
            children.append(&mut args);
        } else {
            self.error("expected `(` or `[` after the created type");
        }

        if self.at(TokenKind::LBrace) {
            // Anonymous class body.
            let type_name = type_name.clone();
            let mut members = Vec::new();
            self.with_phase(ParsingPhase::ClassBody, |p| {
                p.bump(); // `{`
                loop {
                    if p.at(TokenKind::RBrace) || p.at_eof() {
                        break;
                    }
                    let before = p.pos;
                    if let Some(member) = p.parse_member(&type_name) {
                        members.push(member);
                    }
                    if p.pos == before {
                        p.error(format!(
                            "expected a class member, found `{}`",
                            p.describe_current()
                        ));
                        p.bump();
                    }
                }
                p.expect(TokenKind::RBrace, "`}` to close the anonymous class body");
            });
            children.append(&mut members);
        }

        self.finish_node_with_attr(
            NodeKind::ObjectCreation,
            start,
            children,
            NodeAttr::Name { text: type_name },
        )
    }

    pub(super) fn parse_array_initializer(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `{`
        let mut children = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            let element = if self.at(TokenKind::LBrace) {
                self.parse_array_initializer()
            } else {
                self.parse_expression()
            };
            if element.is_some() {
                children.push(element);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace, "`}` to close the array initializer");
        self.finish_node(NodeKind::ArrayInitializer, start, children)
    }

    pub(super) fn parse_argument_list(&mut self) -> Vec<NodeIndex> {
        let mut args = Vec::new();
        if !self.expect(TokenKind::LParen, "`(` to open the argument list") {
            return args;
        }
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let before = self.pos;
            let arg = self.parse_expression();
            if arg.is_some() {
                args.push(arg);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RParen, "`)` to close the argument list");
        args
    }

    // ---- lambdas ------------------------------------------------------

    /// Lambda tie-break: an identifier (or a balanced parameter list)
    /// immediately followed by `->`.
    fn lambda_ahead(&self) -> bool {
        if self.at(TokenKind::Ident) && self.nth(1) == TokenKind::Arrow {
            return true;
        }
        if !self.at(TokenKind::LParen) {
            return false;
        }
        let mut depth = 0i32;
        let mut n = 0usize;
        let mut budget = 128usize;
        loop {
            if budget == 0 {
                return false;
            }
            budget -= 1;
            match self.nth(n) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.nth(n + 1) == TokenKind::Arrow;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            n += 1;
        }
    }

    fn parse_lambda(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let mut children = Vec::new();

        if self.at(TokenKind::Ident) {
            let name = self.current_text().to_string();
            let name_start = self.cur_start();
            self.bump();
            children.push(self.arena.allocate_with_attr(
                NodeKind::Parameter,
                TextRange::new(name_start, self.prev_end()),
                NodeAttr::Parameter {
                    name,
                    is_final: false,
                    is_varargs: false,
                    is_receiver: false,
                },
            ));
        } else {
            self.bump(); // `(`
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let param = self.parse_lambda_parameter();
                if param.is_some() {
                    children.push(param);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "`)` to close the lambda parameters");
        }

        self.expect(TokenKind::Arrow, "`->` in the lambda");

        let body = if self.at(TokenKind::LBrace) {
            self.with_phase(ParsingPhase::MethodBody, |p| p.parse_block_node())
        } else {
            self.parse_expression()
        };
        if body.is_some() {
            children.push(body);
        }

        self.finish_node(NodeKind::LambdaExpression, start, children)
    }

    /// One lambda parameter: `x`, `var x`, `final Type x`, or `Type x`.
    fn parse_lambda_parameter(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let annotations = self.parse_annotations();
        let mut is_final = false;
        while self.at(TokenKind::FinalKw) {
            is_final = true;
            self.bump();
        }

        let bare = (self.at(TokenKind::Ident) || self.at(TokenKind::UnderscoreKw))
            && matches!(self.nth(1), TokenKind::Comma | TokenKind::RParen);
        if !bare {
            if self.at_contextual("var") {
                self.bump();
            } else {
                let _ = self.parse_type_ref();
            }
        }

        let is_varargs = self.eat(TokenKind::Ellipsis);
        let name = if self.at(TokenKind::Ident) || self.at(TokenKind::UnderscoreKw) {
            let text = self.current_text().to_string();
            self.bump();
            text
        } else {
            self.error("expected lambda parameter name");
            String::new()
        };

        self.finish_node_with_attr(
            NodeKind::Parameter,
            start,
            annotations,
            NodeAttr::Parameter {
                name,
                is_final,
                is_varargs,
                is_receiver: false,
            },
        )
    }
}

fn literal_kind(kind: TokenKind) -> Option<LiteralKind> {
    let literal = match kind {
        TokenKind::IntLiteral => LiteralKind::Int,
        TokenKind::LongLiteral => LiteralKind::Long,
        TokenKind::FloatLiteral => LiteralKind::Float,
        TokenKind::DoubleLiteral => LiteralKind::Double,
        TokenKind::CharLiteral => LiteralKind::Char,
        TokenKind::StringLiteral => LiteralKind::String,
        TokenKind::TextBlock => LiteralKind::TextBlock,
        TokenKind::TrueKw | TokenKind::FalseKw => LiteralKind::Boolean,
        TokenKind::NullKw => LiteralKind::Null,
        _ => return None,
    };
    Some(literal)
}
