//! Statements and blocks.

use crate::arena::{NodeAttr, NodeIndex, NodeKind};
use crate::token::TokenKind;

use super::Parser;

/// Recovery set for statement positions.
const STMT_RECOVERY: &[TokenKind] = &[TokenKind::Semicolon, TokenKind::RBrace];

impl<'a> Parser<'a> {
    /// `{ ... }` as a Block node in the current phase.
    pub(super) fn parse_block_node(&mut self) -> NodeIndex {
        self.parse_block_impl(None)
    }

    /// Constructor body. When `flexible` is false (pre-JEP 513 semantics) an
    /// explicit `super(...)` / `this(...)` after the first statement is an
    /// error; when true, any statement may precede it.
    pub(super) fn parse_constructor_block(&mut self, flexible: bool) -> NodeIndex {
        self.parse_block_impl(Some(flexible))
    }

    fn parse_block_impl(&mut self, ctor_rules: Option<bool>) -> NodeIndex {
        let start = self.cur_start();
        if !self.expect(TokenKind::LBrace, "`{` to open the block") {
            return NodeIndex::NONE;
        }

        let mut children = Vec::new();
        let mut index = 0usize;
        loop {
            if self.at(TokenKind::RBrace) || self.at_eof() {
                break;
            }

            let explicit_ctor = self.at_explicit_constructor_invocation();
            if let Some(flexible) = ctor_rules {
                if explicit_ctor && index > 0 && !flexible {
                    self.error(
                        "explicit constructor invocation must be the first statement in the constructor body",
                    );
                }
            }

            let before = self.pos;
            let stmt = self.parse_statement();
            if stmt.is_some() {
                children.push(stmt);
                index += 1;
            }
            if self.pos == before {
                self.error(format!(
                    "expected a statement, found `{}`",
                    self.describe_current()
                ));
                self.bump();
                self.recover_to(STMT_RECOVERY);
                self.eat(TokenKind::Semicolon);
            }
        }

        self.expect(TokenKind::RBrace, "`}` to close the block");
        self.finish_node(NodeKind::Block, start, children)
    }

    /// `super(...)` or `this(...)` at statement position.
    fn at_explicit_constructor_invocation(&self) -> bool {
        matches!(self.current(), TokenKind::SuperKw | TokenKind::ThisKw)
            && self.nth(1) == TokenKind::LParen
    }

    pub(super) fn parse_statement(&mut self) -> NodeIndex {
        match self.current() {
            TokenKind::LBrace => self.parse_block_node(),
            TokenKind::Semicolon => {
                let start = self.cur_start();
                self.bump();
                self.finish_node(NodeKind::EmptyStatement, start, Vec::new())
            }
            TokenKind::IfKw => self.parse_if(),
            TokenKind::WhileKw => self.parse_while(),
            TokenKind::DoKw => self.parse_do(),
            TokenKind::ForKw => self.parse_for(),
            TokenKind::SwitchKw => self.parse_switch(NodeKind::SwitchStatement),
            TokenKind::TryKw => self.parse_try(),
            TokenKind::ReturnKw => self.parse_return(),
            TokenKind::ThrowKw => self.parse_throw(),
            TokenKind::BreakKw => self.parse_break_or_continue(NodeKind::BreakStatement),
            TokenKind::ContinueKw => self.parse_break_or_continue(NodeKind::ContinueStatement),
            TokenKind::SynchronizedKw if self.nth(1) == TokenKind::LParen => {
                self.parse_synchronized()
            }
            TokenKind::AssertKw => self.parse_assert(),
            TokenKind::Ident
                if self.at_contextual("yield") && self.starts_expression(1) =>
            {
                self.parse_yield()
            }
            TokenKind::Ident if self.nth(1) == TokenKind::Colon && self.nth(2) != TokenKind::Colon => {
                self.parse_labeled()
            }
            _ if self.upcoming_type_declaration() => self.parse_type_declaration(),
            _ if self.at_local_variable_declaration() => self.parse_local_variable_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    fn starts_expression(&self, n: usize) -> bool {
        let kind = self.nth(n);
        kind.is_literal()
            || matches!(
                kind,
                TokenKind::Ident
                    | TokenKind::LParen
                    | TokenKind::ThisKw
                    | TokenKind::SuperKw
                    | TokenKind::NewKw
                    | TokenKind::SwitchKw
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
            )
    }

    /// Statement-level declaration-vs-expression tie-break: a type followed
    /// by an identifier starts a local variable declaration.
    fn at_local_variable_declaration(&self) -> bool {
        if self.at(TokenKind::FinalKw)
            || (self.at(TokenKind::At) && self.nth(1) == TokenKind::Ident)
        {
            return true;
        }
        if self.at_contextual("var") && self.nth(1) == TokenKind::Ident {
            return true;
        }
        if self.current().is_primitive_type() {
            return true;
        }
        match self.scan_type(0) {
            Some(n) => self.nth(n) == TokenKind::Ident,
            None => false,
        }
    }

    pub(super) fn parse_local_variable_declaration(&mut self) -> NodeIndex {
        let node = self.parse_local_variable_declaration_no_semi();
        self.expect(TokenKind::Semicolon, "`;` after variable declaration");
        node
    }

    fn parse_local_variable_declaration_no_semi(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let mut children = self.parse_annotations();
        while self.at(TokenKind::FinalKw) {
            self.bump();
        }

        if self.at_contextual("var") && self.nth(1) == TokenKind::Ident {
            self.bump();
        } else if self.parse_type_ref().is_none() {
            self.error(format!(
                "expected a variable type, found `{}`",
                self.describe_current()
            ));
            self.recover_to(STMT_RECOVERY);
            return NodeIndex::NONE;
        }

        if !self.at(TokenKind::Ident) {
            self.error(format!(
                "expected a variable name, found `{}`",
                self.describe_current()
            ));
            self.recover_to(STMT_RECOVERY);
            return NodeIndex::NONE;
        }
        let name = self.current_text().to_string();
        self.bump();
        self.parse_variable_declarators(name, &mut children);

        self.finish_node(NodeKind::LocalVariableDeclaration, start, children)
    }

    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let expr = self.parse_expression();
        if expr.is_none() {
            self.recover_to(STMT_RECOVERY);
            self.eat(TokenKind::Semicolon);
            return NodeIndex::NONE;
        }
        self.expect(TokenKind::Semicolon, "`;` after expression statement");
        self.finish_node(NodeKind::ExpressionStatement, start, vec![expr])
    }

    fn parse_if(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `if`
        let mut children = Vec::new();
        if self.expect(TokenKind::LParen, "`(` after `if`") {
            let cond = self.parse_expression();
            if cond.is_some() {
                children.push(cond);
            }
            self.expect(TokenKind::RParen, "`)` after the condition");
        }
        let then = self.parse_statement();
        if then.is_some() {
            children.push(then);
        }
        if self.eat(TokenKind::ElseKw) {
            let alt = self.parse_statement();
            if alt.is_some() {
                children.push(alt);
            }
        }
        self.finish_node(NodeKind::IfStatement, start, children)
    }

    fn parse_while(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `while`
        let mut children = Vec::new();
        if self.expect(TokenKind::LParen, "`(` after `while`") {
            let cond = self.parse_expression();
            if cond.is_some() {
                children.push(cond);
            }
            self.expect(TokenKind::RParen, "`)` after the condition");
        }
        let body = self.parse_statement();
        if body.is_some() {
            children.push(body);
        }
        self.finish_node(NodeKind::WhileStatement, start, children)
    }

    fn parse_do(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `do`
        let mut children = Vec::new();
        let body = self.parse_statement();
        if body.is_some() {
            children.push(body);
        }
        self.expect(TokenKind::WhileKw, "`while` after the do body");
        if self.expect(TokenKind::LParen, "`(` after `while`") {
            let cond = self.parse_expression();
            if cond.is_some() {
                children.push(cond);
            }
            self.expect(TokenKind::RParen, "`)` after the condition");
        }
        self.expect(TokenKind::Semicolon, "`;` after do-while");
        self.finish_node(NodeKind::DoStatement, start, children)
    }

    fn parse_for(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `for`
        if !self.expect(TokenKind::LParen, "`(` after `for`") {
            return self.finish_node(NodeKind::ForStatement, start, Vec::new());
        }

        if self.for_each_ahead() {
            let mut children = Vec::new();
            let param_start = self.cur_start();
            let annotations = self.parse_annotations();
            let mut is_final = false;
            while self.at(TokenKind::FinalKw) {
                is_final = true;
                self.bump();
            }
            if self.at_contextual("var") {
                self.bump();
            } else {
                let _ = self.parse_type_ref();
            }
            let name = if self.at(TokenKind::Ident) || self.at(TokenKind::UnderscoreKw) {
                let text = self.current_text().to_string();
                self.bump();
                text
            } else {
                self.error("expected loop variable name");
                String::new()
            };
            children.push(self.finish_node_with_attr(
                NodeKind::Parameter,
                param_start,
                annotations,
                NodeAttr::Parameter {
                    name,
                    is_final,
                    is_varargs: false,
                    is_receiver: false,
                },
            ));
            self.expect(TokenKind::Colon, "`:` in enhanced for");
            let iterable = self.parse_expression();
            if iterable.is_some() {
                children.push(iterable);
            }
            self.expect(TokenKind::RParen, "`)` after the for header");
            let body = self.parse_statement();
            if body.is_some() {
                children.push(body);
            }
            return self.finish_node(NodeKind::ForEachStatement, start, children);
        }

        let mut children = Vec::new();
        // Init.
        if !self.at(TokenKind::Semicolon) {
            if self.at_local_variable_declaration() {
                let init = self.parse_local_variable_declaration_no_semi();
                if init.is_some() {
                    children.push(init);
                }
            } else {
                loop {
                    let expr = self.parse_expression();
                    if expr.is_some() {
                        children.push(expr);
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(TokenKind::Semicolon, "`;` after the for init");
        // Condition.
        if !self.at(TokenKind::Semicolon) {
            let cond = self.parse_expression();
            if cond.is_some() {
                children.push(cond);
            }
        }
        self.expect(TokenKind::Semicolon, "`;` after the for condition");
        // Update.
        if !self.at(TokenKind::RParen) {
            loop {
                let update = self.parse_expression();
                if update.is_some() {
                    children.push(update);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)` after the for header");
        let body = self.parse_statement();
        if body.is_some() {
            children.push(body);
        }
        self.finish_node(NodeKind::ForStatement, start, children)
    }

    /// Inside `for (`: a `:` before the first `;` at paren depth zero means
    /// an enhanced for.
    fn for_each_ahead(&self) -> bool {
        let mut depth = 0i32;
        let mut n = 0usize;
        let mut budget = 160usize;
        loop {
            if budget == 0 {
                return false;
            }
            budget -= 1;
            match self.nth(n) {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                TokenKind::Colon if depth == 0 => return true,
                TokenKind::Semicolon if depth == 0 => return false,
                TokenKind::Eof | TokenKind::LBrace => return false,
                _ => {}
            }
            n += 1;
        }
    }

    pub(super) fn parse_switch(&mut self, kind: NodeKind) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `switch`
        let mut children = Vec::new();
        if self.expect(TokenKind::LParen, "`(` after `switch`") {
            let scrutinee = self.parse_expression();
            if scrutinee.is_some() {
                children.push(scrutinee);
            }
            self.expect(TokenKind::RParen, "`)` after the selector");
        }
        if self.expect(TokenKind::LBrace, "`{` to open the switch body") {
            loop {
                if self.at(TokenKind::RBrace) || self.at_eof() {
                    break;
                }
                let before = self.pos;
                let case = self.parse_switch_case();
                if case.is_some() {
                    children.push(case);
                }
                if self.pos == before {
                    self.error(format!(
                        "expected `case` or `default`, found `{}`",
                        self.describe_current()
                    ));
                    self.bump();
                }
            }
            self.expect(TokenKind::RBrace, "`}` to close the switch body");
        }
        self.finish_node(kind, start, children)
    }

    fn parse_switch_case(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let mut children = Vec::new();

        if self.eat(TokenKind::CaseKw) {
            loop {
                let label = self.parse_case_label();
                if label.is_some() {
                    children.push(label);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            // Guarded pattern (Java 21): `case Type t when cond`.
            if self.at_contextual("when") {
                self.bump();
                let guard = self.parse_expression();
                if guard.is_some() {
                    children.push(guard);
                }
            }
        } else if !self.eat(TokenKind::DefaultKw) {
            return NodeIndex::NONE;
        }

        if self.eat(TokenKind::Arrow) {
            if self.at(TokenKind::LBrace) {
                let block = self.parse_block_node();
                children.push(block);
            } else if self.at(TokenKind::ThrowKw) {
                let stmt = self.parse_throw();
                children.push(stmt);
            } else {
                let body_start = self.cur_start();
                let expr = self.parse_expression();
                self.expect(TokenKind::Semicolon, "`;` after the case expression");
                if expr.is_some() {
                    let stmt =
                        self.finish_node(NodeKind::ExpressionStatement, body_start, vec![expr]);
                    children.push(stmt);
                }
            }
        } else {
            self.expect(TokenKind::Colon, "`:` or `->` after the case label");
            loop {
                match self.current() {
                    TokenKind::CaseKw | TokenKind::DefaultKw | TokenKind::RBrace | TokenKind::Eof => {
                        break
                    }
                    _ => {}
                }
                let before = self.pos;
                let stmt = self.parse_statement();
                if stmt.is_some() {
                    children.push(stmt);
                }
                if self.pos == before {
                    self.bump();
                }
            }
        }

        self.finish_node(NodeKind::SwitchCase, start, children)
    }

    /// A case label: `null`, a constant expression, or a type pattern.
    fn parse_case_label(&mut self) -> NodeIndex {
        if self.at(TokenKind::NullKw) {
            let start = self.cur_start();
            self.bump();
            return self.finish_node_with_attr(
                NodeKind::Literal,
                start,
                Vec::new(),
                NodeAttr::Literal {
                    kind: crate::arena::LiteralKind::Null,
                },
            );
        }
        // Type pattern: `Type binding` (record deconstruction patterns are
        // consumed as a balanced span after the type).
        if let Some(n) = self.scan_type(0) {
            if self.nth(n) == TokenKind::Ident {
                let start = self.cur_start();
                let _ = self.parse_type_ref();
                let name = self.current_text().to_string();
                let name_start = self.cur_start();
                self.bump();
                let ident = self.arena.allocate_with_attr(
                    NodeKind::Identifier,
                    javelin_core::TextRange::new(name_start, self.prev_end()),
                    NodeAttr::Name { text: name },
                );
                return self.finish_node(NodeKind::InstanceofExpression, start, vec![ident]);
            }
        }
        self.parse_expression()
    }

    fn parse_try(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `try`
        let mut children = Vec::new();

        if self.at(TokenKind::LParen) {
            self.bump();
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let before = self.pos;
                let resource = if self.at_local_variable_declaration() {
                    self.parse_local_variable_declaration_no_semi()
                } else {
                    self.parse_expression()
                };
                if resource.is_some() {
                    children.push(resource);
                }
                if !self.eat(TokenKind::Semicolon) {
                    break;
                }
                if self.pos == before {
                    self.bump();
                }
            }
            self.expect(TokenKind::RParen, "`)` after try resources");
        }

        let body = self.parse_block_node();
        if body.is_some() {
            children.push(body);
        }

        while self.at(TokenKind::CatchKw) {
            let clause = self.parse_catch_clause();
            if clause.is_some() {
                children.push(clause);
            }
        }

        if self.eat(TokenKind::FinallyKw) {
            let block = self.parse_block_node();
            if block.is_some() {
                children.push(block);
            }
        }

        self.finish_node(NodeKind::TryStatement, start, children)
    }

    fn parse_catch_clause(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `catch`
        let mut children = Vec::new();
        if self.expect(TokenKind::LParen, "`(` after `catch`") {
            let param_start = self.cur_start();
            let annotations = self.parse_annotations();
            let mut is_final = false;
            while self.at(TokenKind::FinalKw) {
                is_final = true;
                self.bump();
            }
            let _ = self.parse_type_ref();
            while self.eat(TokenKind::Pipe) {
                // Multi-catch alternatives.
                let _ = self.parse_type_ref();
            }
            let name = if self.at(TokenKind::Ident) || self.at(TokenKind::UnderscoreKw) {
                let text = self.current_text().to_string();
                self.bump();
                text
            } else {
                self.error("expected exception variable name");
                String::new()
            };
            children.push(self.finish_node_with_attr(
                NodeKind::Parameter,
                param_start,
                annotations,
                NodeAttr::Parameter {
                    name,
                    is_final,
                    is_varargs: false,
                    is_receiver: false,
                },
            ));
            self.expect(TokenKind::RParen, "`)` after the catch parameter");
        }
        let block = self.parse_block_node();
        if block.is_some() {
            children.push(block);
        }
        self.finish_node(NodeKind::CatchClause, start, children)
    }

    fn parse_return(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `return`
        let mut children = Vec::new();
        if !self.at(TokenKind::Semicolon) && !self.at(TokenKind::RBrace) {
            let value = self.parse_expression();
            if value.is_some() {
                children.push(value);
            }
        }
        self.expect(TokenKind::Semicolon, "`;` after return");
        self.finish_node(NodeKind::ReturnStatement, start, children)
    }

    pub(super) fn parse_throw(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `throw`
        let value = self.parse_expression();
        let children = if value.is_some() { vec![value] } else { Vec::new() };
        self.expect(TokenKind::Semicolon, "`;` after throw");
        self.finish_node(NodeKind::ThrowStatement, start, children)
    }

    fn parse_break_or_continue(&mut self, kind: NodeKind) -> NodeIndex {
        let start = self.cur_start();
        self.bump();
        let label = if self.at(TokenKind::Ident) {
            let text = self.current_text().to_string();
            self.bump();
            Some(text)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "`;` after the jump statement");
        match label {
            Some(text) => self.finish_node_with_attr(
                kind,
                start,
                Vec::new(),
                NodeAttr::Name { text },
            ),
            None => self.finish_node(kind, start, Vec::new()),
        }
    }

    fn parse_yield(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `yield`
        let value = self.parse_expression();
        let children = if value.is_some() { vec![value] } else { Vec::new() };
        self.expect(TokenKind::Semicolon, "`;` after yield");
        self.finish_node(NodeKind::YieldStatement, start, children)
    }

    fn parse_synchronized(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `synchronized`
        let mut children = Vec::new();
        if self.expect(TokenKind::LParen, "`(` after `synchronized`") {
            let monitor = self.parse_expression();
            if monitor.is_some() {
                children.push(monitor);
            }
            self.expect(TokenKind::RParen, "`)` after the monitor expression");
        }
        let block = self.parse_block_node();
        if block.is_some() {
            children.push(block);
        }
        self.finish_node(NodeKind::SynchronizedStatement, start, children)
    }

    fn parse_assert(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `assert`
        let mut children = Vec::new();
        let cond = self.parse_expression();
        if cond.is_some() {
            children.push(cond);
        }
        if self.eat(TokenKind::Colon) {
            let message = self.parse_expression();
            if message.is_some() {
                children.push(message);
            }
        }
        self.expect(TokenKind::Semicolon, "`;` after assert");
        self.finish_node(NodeKind::AssertStatement, start, children)
    }

    fn parse_labeled(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let label = self.current_text().to_string();
        self.bump(); // label
        self.bump(); // `:`
        let stmt = self.parse_statement();
        let children = if stmt.is_some() { vec![stmt] } else { Vec::new() };
        self.finish_node_with_attr(
            NodeKind::LabeledStatement,
            start,
            children,
            NodeAttr::Name { text: label },
        )
    }
}
