//! Declarations: compilation-unit members, type declarations, and the
//! members of class-like bodies.

use javelin_core::TextSize;

use crate::arena::{NodeAttr, NodeIndex, NodeKind};
use crate::strategy::ParsingPhase;
use crate::token::TokenKind;
use crate::version::JavaVersion;

use super::Parser;

/// Language features the current production is allowed to use. Derived from
/// the target version when a strategy owns the declaration; empty for the
/// default production.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct TypeDeclFeatures {
    pub records: bool,
    pub sealed: bool,
}

impl<'a> Parser<'a> {
    // ---- compilation-unit level --------------------------------------

    pub(super) fn at_package_declaration(&self) -> bool {
        self.at(TokenKind::PackageKw)
    }

    pub(super) fn parse_package_declaration(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `package`
        let path = self.parse_dotted_name();
        if path.is_empty() {
            self.error("expected package name");
        }
        self.expect(TokenKind::Semicolon, "`;` after package declaration");
        self.finish_node_with_attr(
            NodeKind::PackageDeclaration,
            start,
            Vec::new(),
            NodeAttr::Name { text: path },
        )
    }

    pub(super) fn parse_import_declaration(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.bump(); // `import`
        let is_static = self.eat(TokenKind::StaticKw);
        let mut path = self.parse_dotted_name();
        let mut on_demand = false;
        if self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Star {
            self.bump();
            self.bump();
            on_demand = true;
        } else if path.is_empty() && self.eat(TokenKind::Star) {
            // `import *;` is malformed but recoverable.
            on_demand = true;
        }
        if path.is_empty() && !on_demand {
            self.error("expected import path");
            self.recover_to(&[TokenKind::Semicolon, TokenKind::ClassKw]);
        }
        self.expect(TokenKind::Semicolon, "`;` after import");
        if on_demand {
            path.push_str(".*");
        }
        self.finish_node_with_attr(
            NodeKind::ImportDeclaration,
            start,
            Vec::new(),
            NodeAttr::Import {
                path,
                is_static,
                on_demand,
            },
        )
    }

    fn parse_dotted_name(&mut self) -> String {
        let mut out = String::new();
        while self.at(TokenKind::Ident) {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(self.current_text());
            self.bump();
            if self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Ident {
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    // ---- strategy hooks and lookahead --------------------------------

    /// Type-declaration dispatcher: a registered strategy owns the subtree
    /// when it claims the (version, phase, token) combination; otherwise the
    /// default production applies, with version-gated features off.
    pub(crate) fn parse_type_declaration(&mut self) -> NodeIndex {
        if let Some(strategy) = self.find_strategy() {
            tracing::trace!(strategy = strategy.description(), "strategy owns declaration");
            return strategy.parse(self);
        }
        self.parse_type_declaration_impl(TypeDeclFeatures::default())
    }

    /// Strategy entry point: parse a type declaration with every feature the
    /// target version supports.
    pub fn parse_featured_type_declaration(&mut self) -> NodeIndex {
        let features = TypeDeclFeatures {
            records: self.version() >= JavaVersion::Java14,
            sealed: self.version() >= JavaVersion::Java17,
        };
        self.parse_type_declaration_impl(features)
    }

    /// Bounded scan past annotations and modifiers, returning the lookahead
    /// offset of the first token that is neither.
    fn scan_modifier_run(&self, mut n: usize) -> usize {
        let mut budget = 96usize;
        loop {
            if budget == 0 {
                return n;
            }
            let kind = self.nth(n);
            if kind == TokenKind::At && self.nth(n + 1) == TokenKind::Ident {
                // Annotation: `@` dotted-name, optionally with arguments.
                n += 2;
                while self.nth(n) == TokenKind::Dot && self.nth(n + 1) == TokenKind::Ident {
                    n += 2;
                }
                if self.nth(n) == TokenKind::LParen {
                    n = self.scan_balanced(n, TokenKind::LParen, TokenKind::RParen, &mut budget);
                }
            } else if kind.is_modifier() {
                n += 1;
            } else if self.nth_is_contextual(n, "sealed") {
                n += 1;
            } else if self.at_non_sealed_at(n) {
                n += 3;
            } else {
                return n;
            }
            budget = budget.saturating_sub(1);
        }
    }

    fn scan_balanced(
        &self,
        mut n: usize,
        open: TokenKind,
        close: TokenKind,
        budget: &mut usize,
    ) -> usize {
        debug_assert_eq!(self.nth(n), open);
        let mut depth = 0usize;
        loop {
            if *budget == 0 {
                return n;
            }
            *budget -= 1;
            let kind = self.nth(n);
            if kind == TokenKind::Eof {
                return n;
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return n + 1;
                }
            }
            n += 1;
        }
    }

    /// `non-sealed` is three tokens in our stream (`non`, `-`, `sealed`).
    fn at_non_sealed_at(&self, n: usize) -> bool {
        self.nth_is_contextual(n, "non")
            && self.nth(n + 1) == TokenKind::Minus
            && self.nth_is_contextual(n + 2, "sealed")
    }

    /// Lookahead for the record strategy: modifiers, then contextual
    /// `record` followed by a type name.
    pub fn upcoming_record_declaration(&self) -> bool {
        let n = self.scan_modifier_run(0);
        self.nth_is_contextual(n, "record") && self.nth(n + 1) == TokenKind::Ident
    }

    /// Lookahead for the sealed-types strategy: a `sealed` / `non-sealed`
    /// modifier ahead of a class or interface keyword.
    pub fn upcoming_sealed_modifier(&self) -> bool {
        let mut n = 0usize;
        let mut budget = 96usize;
        loop {
            if budget == 0 {
                return false;
            }
            budget -= 1;
            if self.nth_is_contextual(n, "sealed") || self.at_non_sealed_at(n) {
                let after = self.scan_modifier_run(n);
                return matches!(
                    self.nth(after),
                    TokenKind::ClassKw | TokenKind::InterfaceKw
                );
            }
            let kind = self.nth(n);
            if kind == TokenKind::At && self.nth(n + 1) == TokenKind::Ident {
                let next = self.scan_modifier_run(n);
                if next == n {
                    return false;
                }
                n = next;
            } else if kind.is_modifier() {
                n += 1;
            } else {
                return false;
            }
        }
    }

    /// Whether a type declaration (of any flavor the stream could mean)
    /// starts at the cursor.
    pub(super) fn upcoming_type_declaration(&self) -> bool {
        let n = self.scan_modifier_run(0);
        match self.nth(n) {
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
            TokenKind::At => self.nth(n + 1) == TokenKind::InterfaceKw,
            _ => {
                (self.nth_is_contextual(n, "record") && self.nth(n + 1) == TokenKind::Ident)
                    || self.nth_is_contextual(n, "sealed")
                    || self.at_non_sealed_at(n)
            }
        }
    }

    fn upcoming_constructor(&self, enclosing: &str) -> bool {
        let mut n = self.scan_modifier_run(0);
        if self.nth(n) == TokenKind::Lt {
            let mut budget = 64usize;
            n = self.scan_balanced_angles(n, &mut budget);
        }
        // `Name (` is a constructor; `Name {` is a compact record
        // constructor.
        self.nth(n) == TokenKind::Ident
            && self.nth_text(n) == enclosing
            && matches!(self.nth(n + 1), TokenKind::LParen | TokenKind::LBrace)
    }

    fn scan_balanced_angles(&self, mut n: usize, budget: &mut usize) -> usize {
        debug_assert_eq!(self.nth(n), TokenKind::Lt);
        let mut depth = 0i32;
        loop {
            if *budget == 0 {
                return n;
            }
            *budget -= 1;
            match self.nth(n) {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return n + 1;
                    }
                }
                TokenKind::Shl => depth += 2,
                TokenKind::Eof => return n,
                _ => {}
            }
            n += 1;
        }
    }

    // ---- type declarations -------------------------------------------

    pub(super) fn parse_type_declaration_impl(
        &mut self,
        features: TypeDeclFeatures,
    ) -> NodeIndex {
        let start = self.cur_start();
        let mut children = self.parse_annotations();
        self.parse_modifiers(features.sealed, &mut children);

        match self.current() {
            TokenKind::ClassKw => self.parse_class_like(
                start,
                children,
                NodeKind::ClassDeclaration,
                features,
            ),
            TokenKind::InterfaceKw => self.parse_class_like(
                start,
                children,
                NodeKind::InterfaceDeclaration,
                features,
            ),
            TokenKind::EnumKw => self.parse_enum_declaration(start, children),
            TokenKind::At if self.nth(1) == TokenKind::InterfaceKw => {
                self.parse_annotation_declaration(start, children)
            }
            TokenKind::Ident
                if features.records
                    && self.at_contextual("record")
                    && self.nth(1) == TokenKind::Ident =>
            {
                self.parse_record_declaration(start, children)
            }
            _ => {
                self.error(format!(
                    "expected a type declaration, found `{}`",
                    self.describe_current()
                ));
                self.recover_to(&[
                    TokenKind::ClassKw,
                    TokenKind::InterfaceKw,
                    TokenKind::EnumKw,
                    TokenKind::Semicolon,
                    TokenKind::RBrace,
                ]);
                self.eat(TokenKind::Semicolon);
                if children.is_empty() {
                    NodeIndex::NONE
                } else {
                    // Keep already-parsed annotations attached to something.
                    let child = children.remove(0);
                    child
                }
            }
        }
    }

    fn parse_class_like(
        &mut self,
        start: TextSize,
        mut children: Vec<NodeIndex>,
        kind: NodeKind,
        features: TypeDeclFeatures,
    ) -> NodeIndex {
        self.bump(); // `class` / `interface`
        let name = self.parse_type_name();
        self.parse_optional_type_parameters();

        if self.eat(TokenKind::ExtendsKw) {
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                // Interfaces may extend several supertypes.
                self.parse_type_ref();
            }
        }
        if self.eat(TokenKind::ImplementsKw) {
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                self.parse_type_ref();
            }
        }
        if features.sealed && self.at_contextual("permits") {
            self.bump();
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                self.parse_type_ref();
            }
        }

        self.parse_class_body(&name, &mut children);
        self.finish_node_with_attr(kind, start, children, NodeAttr::TypeName { name })
    }

    fn parse_record_declaration(
        &mut self,
        start: TextSize,
        mut children: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.bump(); // `record`
        let name = self.parse_type_name();
        self.parse_optional_type_parameters();

        let mut params = self.parse_parameter_list();
        children.append(&mut params);

        if self.eat(TokenKind::ImplementsKw) {
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                self.parse_type_ref();
            }
        }

        self.parse_class_body(&name, &mut children);
        self.finish_node_with_attr(
            NodeKind::RecordDeclaration,
            start,
            children,
            NodeAttr::TypeName { name },
        )
    }

    fn parse_enum_declaration(
        &mut self,
        start: TextSize,
        mut children: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.bump(); // `enum`
        let name = self.parse_type_name();
        if self.eat(TokenKind::ImplementsKw) {
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                self.parse_type_ref();
            }
        }

        if self.expect(TokenKind::LBrace, "`{` to open the enum body") {
            self.with_phase(ParsingPhase::ClassBody, |p| {
                // Constant list first.
                while p.at(TokenKind::Ident) || p.at(TokenKind::At) {
                    let constant = p.parse_enum_constant(&name);
                    if constant.is_some() {
                        children.push(constant);
                    }
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
                if p.eat(TokenKind::Semicolon) {
                    // Then ordinary members.
                    loop {
                        if p.at(TokenKind::RBrace) || p.at_eof() {
                            break;
                        }
                        let before = p.pos;
                        if let Some(member) = p.parse_member(&name) {
                            children.push(member);
                        }
                        if p.pos == before {
                            p.error(format!(
                                "expected an enum member, found `{}`",
                                p.describe_current()
                            ));
                            p.bump();
                        }
                    }
                }
            });
            self.expect(TokenKind::RBrace, "`}` to close the enum body");
        }

        self.finish_node_with_attr(
            NodeKind::EnumDeclaration,
            start,
            children,
            NodeAttr::TypeName { name },
        )
    }

    fn parse_enum_constant(&mut self, enclosing: &str) -> NodeIndex {
        let start = self.cur_start();
        let mut children = self.parse_annotations();
        if !self.at(TokenKind::Ident) {
            self.error("expected enum constant name");
            return NodeIndex::NONE;
        }
        let name = self.current_text().to_string();
        self.bump();
        if self.at(TokenKind::LParen) {
            let mut args = self.parse_argument_list();
            children.append(&mut args);
        }
        if self.at(TokenKind::LBrace) {
            // Constant with a class body.
            self.parse_class_body(enclosing, &mut children);
        }
        self.finish_node_with_attr(
            NodeKind::EnumConstant,
            start,
            children,
            NodeAttr::Name { text: name },
        )
    }

    fn parse_annotation_declaration(
        &mut self,
        start: TextSize,
        mut children: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.bump(); // `@`
        self.bump(); // `interface`
        let name = self.parse_type_name();
        self.parse_class_body(&name, &mut children);
        self.finish_node_with_attr(
            NodeKind::AnnotationDeclaration,
            start,
            children,
            NodeAttr::TypeName { name },
        )
    }

    fn parse_type_name(&mut self) -> String {
        if self.at(TokenKind::Ident) {
            let name = self.current_text().to_string();
            self.bump();
            name
        } else {
            self.error(format!(
                "expected a type name, found `{}`",
                self.describe_current()
            ));
            String::new()
        }
    }

    // ---- class bodies -------------------------------------------------

    fn parse_class_body(&mut self, type_name: &str, children: &mut Vec<NodeIndex>) {
        if !self.expect(TokenKind::LBrace, "`{` to open the type body") {
            self.recover_to(&[TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace]);
            if !self.eat(TokenKind::LBrace) {
                return;
            }
        }
        let type_name = type_name.to_string();
        self.with_phase(ParsingPhase::ClassBody, |p| loop {
            if p.at(TokenKind::RBrace) || p.at_eof() {
                break;
            }
            let before = p.pos;
            if let Some(member) = p.parse_member(&type_name) {
                children.push(member);
            }
            if p.pos == before {
                p.error(format!(
                    "expected a class member, found `{}`",
                    p.describe_current()
                ));
                p.bump();
                p.recover_to(&[TokenKind::Semicolon, TokenKind::RBrace]);
                p.eat(TokenKind::Semicolon);
            }
        });
        self.expect(TokenKind::RBrace, "`}` to close the type body");
    }

    /// One class-body member, or `None` for stray semicolons.
    pub(super) fn parse_member(&mut self, enclosing: &str) -> Option<NodeIndex> {
        if self.eat(TokenKind::Semicolon) {
            return None;
        }
        if self.at(TokenKind::LBrace)
            || (self.at(TokenKind::StaticKw) && self.nth(1) == TokenKind::LBrace)
        {
            return Some(self.parse_initializer_block());
        }
        if self.upcoming_type_declaration() {
            let node = self.parse_type_declaration();
            return node.is_some().then_some(node);
        }
        if self.upcoming_constructor(enclosing) {
            return Some(self.parse_constructor_declaration());
        }
        let node = self.parse_field_or_method();
        node.is_some().then_some(node)
    }

    fn parse_initializer_block(&mut self) -> NodeIndex {
        let start = self.cur_start();
        self.eat(TokenKind::StaticKw);
        let block =
            self.with_phase(ParsingPhase::InitializerBlock, |p| p.parse_block_node());
        self.finish_node(NodeKind::InitializerBlock, start, vec![block])
    }

    fn parse_constructor_declaration(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let mut children = self.parse_annotations();
        self.parse_modifiers(false, &mut children);
        self.parse_optional_type_parameters();

        let name = self.parse_type_name();
        if self.at(TokenKind::LParen) {
            let mut params = self.parse_parameter_list();
            children.append(&mut params);
        }
        // A compact record constructor has no parameter list at all.

        if self.eat(TokenKind::ThrowsKw) {
            self.parse_type_ref();
            while self.eat(TokenKind::Comma) {
                self.parse_type_ref();
            }
        }

        // JEP 513 hook: under Java 25 a strategy owns the body and permits
        // statements ahead of the explicit `super(...)` / `this(...)`.
        let body = self.with_phase(ParsingPhase::ConstructorBody, |p| {
            if let Some(strategy) = p.find_strategy() {
                tracing::trace!(strategy = strategy.description(), "strategy owns constructor body");
                strategy.parse(p)
            } else {
                p.parse_constructor_block(false)
            }
        });
        if body.is_some() {
            children.push(body);
        }

        self.finish_node_with_attr(
            NodeKind::ConstructorDeclaration,
            start,
            children,
            NodeAttr::Name { text: name },
        )
    }

    /// Strategy entry point for flexible constructor bodies.
    pub fn parse_flexible_constructor_block(&mut self) -> NodeIndex {
        self.parse_constructor_block(true)
    }

    fn parse_field_or_method(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let mut children = self.parse_annotations();
        self.parse_modifiers(false, &mut children);
        self.parse_optional_type_parameters();

        // Return type (or `void`), then the deciding identifier.
        if self.at(TokenKind::VoidKw) {
            self.bump();
        } else if self.parse_type_ref().is_none() {
            self.error(format!(
                "expected a member type, found `{}`",
                self.describe_current()
            ));
            self.recover_to(&[TokenKind::Semicolon, TokenKind::RBrace]);
            self.eat(TokenKind::Semicolon);
            return NodeIndex::NONE;
        }

        if !self.at(TokenKind::Ident) {
            self.error(format!(
                "expected a member name, found `{}`",
                self.describe_current()
            ));
            self.recover_to(&[TokenKind::Semicolon, TokenKind::RBrace]);
            self.eat(TokenKind::Semicolon);
            return NodeIndex::NONE;
        }
        let name = self.current_text().to_string();
        self.bump();

        if self.at(TokenKind::LParen) {
            // Method.
            let mut params = self.parse_parameter_list();
            children.append(&mut params);
            while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
                self.bump();
                self.bump();
            }
            if self.eat(TokenKind::ThrowsKw) {
                self.parse_type_ref();
                while self.eat(TokenKind::Comma) {
                    self.parse_type_ref();
                }
            }
            if self.eat(TokenKind::DefaultKw) {
                // Annotation-member default value.
                let value = self.parse_expression();
                if value.is_some() {
                    children.push(value);
                }
                self.expect(TokenKind::Semicolon, "`;` after default value");
            } else if self.at(TokenKind::LBrace) {
                let body = self.with_phase(ParsingPhase::MethodBody, |p| p.parse_block_node());
                children.push(body);
            } else {
                self.expect(TokenKind::Semicolon, "`;` after method declaration");
            }
            self.finish_node_with_attr(
                NodeKind::MethodDeclaration,
                start,
                children,
                NodeAttr::Name { text: name },
            )
        } else {
            // Field: one or more declarators.
            let first = name.clone();
            self.parse_variable_declarators(name, &mut children);
            self.expect(TokenKind::Semicolon, "`;` after field declaration");
            self.finish_node_with_attr(
                NodeKind::FieldDeclaration,
                start,
                children,
                NodeAttr::Name { text: first },
            )
        }
    }

    /// Declarator tail shared by fields and locals: the first name was
    /// already consumed.
    pub(super) fn parse_variable_declarators(
        &mut self,
        first_name: String,
        children: &mut Vec<NodeIndex>,
    ) {
        let mut name = first_name;
        let mut name_end = self.prev_end();
        loop {
            let name_start = name_end - javelin_core::TextSize::from(name.len() as u32);
            let ident = self.arena.allocate_with_attr(
                NodeKind::Identifier,
                javelin_core::TextRange::new(name_start, name_end),
                NodeAttr::Name { text: name.clone() },
            );
            children.push(ident);

            while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
                self.bump();
                self.bump();
            }
            if self.eat(TokenKind::Assign) {
                let init = self.parse_variable_initializer();
                if init.is_some() {
                    children.push(init);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if !self.at(TokenKind::Ident) {
                self.error("expected another declarator after `,`");
                break;
            }
            name = self.current_text().to_string();
            self.bump();
            name_end = self.prev_end();
        }
    }

    pub(super) fn parse_variable_initializer(&mut self) -> NodeIndex {
        if self.at(TokenKind::LBrace) {
            self.parse_array_initializer()
        } else {
            self.parse_expression()
        }
    }

    // ---- parameters ---------------------------------------------------

    /// `( parameter, ... )` for methods, constructors, and record headers.
    pub(super) fn parse_parameter_list(&mut self) -> Vec<NodeIndex> {
        let mut params = Vec::new();
        if !self.expect(TokenKind::LParen, "`(` to open the parameter list") {
            return params;
        }
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let before = self.pos;
            let param = self.parse_parameter();
            if param.is_some() {
                params.push(param);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RParen, "`)` to close the parameter list");
        params
    }

    fn parse_parameter(&mut self) -> NodeIndex {
        let start = self.cur_start();
        let annotations = self.parse_annotations();
        let mut is_final = false;
        while self.at(TokenKind::FinalKw) {
            is_final = true;
            self.bump();
        }

        if self.parse_type_ref().is_none() {
            self.error(format!(
                "expected a parameter type, found `{}`",
                self.describe_current()
            ));
            self.recover_to(&[TokenKind::Comma, TokenKind::RParen]);
            return NodeIndex::NONE;
        }

        let is_varargs = self.eat(TokenKind::Ellipsis);

        let (name, is_receiver) = if self.at(TokenKind::ThisKw) {
            self.bump();
            ("this".to_string(), true)
        } else if self.at(TokenKind::Ident) {
            // `Outer.this` receiver parameters qualify the keyword.
            let text = self.current_text().to_string();
            self.bump();
            if self.at(TokenKind::Dot) && self.nth(1) == TokenKind::ThisKw {
                self.bump();
                self.bump();
                ("this".to_string(), true)
            } else {
                (text, false)
            }
        } else if self.at(TokenKind::UnderscoreKw) {
            self.bump();
            ("_".to_string(), false)
        } else {
            self.error(format!(
                "expected a parameter name, found `{}`",
                self.describe_current()
            ));
            (String::new(), false)
        };

        while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
            self.bump();
            self.bump();
        }

        self.finish_node_with_attr(
            NodeKind::Parameter,
            start,
            annotations,
            NodeAttr::Parameter {
                name,
                is_final,
                is_varargs,
                is_receiver,
            },
        )
    }

    // ---- annotations, modifiers, types --------------------------------

    pub(super) fn parse_annotations(&mut self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        while self.at(TokenKind::At) && self.nth(1) == TokenKind::Ident {
            let start = self.cur_start();
            self.bump(); // `@`
            let name = self.parse_dotted_name();
            if self.at(TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            out.push(self.finish_node_with_attr(
                NodeKind::Annotation,
                start,
                Vec::new(),
                NodeAttr::Name { text: name },
            ));
        }
        out
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        debug_assert!(self.at(open));
        let mut depth = 0usize;
        while !self.at_eof() {
            let kind = self.current();
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Consume a modifier run; annotations interleaved with modifiers land
    /// in `children` so every allocated node stays attached.
    pub(super) fn parse_modifiers(&mut self, sealed_allowed: bool, children: &mut Vec<NodeIndex>) {
        loop {
            if self.current().is_modifier() {
                self.bump();
            } else if sealed_allowed && self.at_contextual("sealed") {
                self.bump();
            } else if sealed_allowed && self.at_non_sealed_at(0) {
                self.bump();
                self.bump();
                self.bump();
            } else if self.at(TokenKind::At) && self.nth(1) == TokenKind::Ident {
                let mut annotations = self.parse_annotations();
                children.append(&mut annotations);
            } else {
                return;
            }
        }
    }

    /// `<T extends Foo & Bar, U>` — consumed as a span, no nodes.
    pub(super) fn parse_optional_type_parameters(&mut self) {
        if self.at(TokenKind::Lt) {
            let mut budget = 128usize;
            let end = self.scan_balanced_angles(0, &mut budget);
            for _ in 0..end {
                self.bump();
            }
        }
    }

    /// Consume one type reference (possibly generic, qualified, or an
    /// array), returning its dotted base name. Types do not allocate nodes.
    pub(super) fn parse_type_ref(&mut self) -> Option<String> {
        let name = self.parse_type_ref_base()?;
        while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
            self.bump();
            self.bump();
        }
        Some(name)
    }

    /// As [`parse_type_ref`](Self::parse_type_ref) but leaves array
    /// dimensions alone; `new int[...]` owns its brackets.
    pub(super) fn parse_type_ref_base(&mut self) -> Option<String> {
        let _ = self.parse_annotations();
        if self.current().is_primitive_type() || self.at(TokenKind::VoidKw) {
            let text = self.current_text().to_string();
            self.bump();
            return Some(text);
        }
        if !self.at(TokenKind::Ident) {
            return None;
        }
        let mut text = self.current_text().to_string();
        self.bump();
        if self.at(TokenKind::Lt) && self.type_args_ahead(0) {
            self.skip_type_args();
        }
        while self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Ident {
            self.bump();
            text.push('.');
            text.push_str(self.current_text());
            self.bump();
            if self.at(TokenKind::Lt) && self.type_args_ahead(0) {
                self.skip_type_args();
            }
        }
        Some(text)
    }

    fn skip_type_args(&mut self) {
        let mut budget = 128usize;
        let end = self.scan_balanced_angles(0, &mut budget);
        for _ in 0..end {
            self.bump();
        }
    }

    /// Generics-vs-comparison tie-break: from a `<` at lookahead `n`, does a
    /// type-argument-like token sequence close with `>` before anything that
    /// could not appear in type arguments?
    pub(super) fn type_args_ahead(&self, n: usize) -> bool {
        debug_assert_eq!(self.nth(n), TokenKind::Lt);
        let mut depth = 0i32;
        let mut idx = n;
        let mut budget = 96usize;
        loop {
            if budget == 0 {
                return false;
            }
            budget -= 1;
            match self.nth(idx) {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return self.type_args_follow_set(idx + 1);
                    }
                }
                TokenKind::Ident
                | TokenKind::Dot
                | TokenKind::Comma
                | TokenKind::Question
                | TokenKind::ExtendsKw
                | TokenKind::SuperKw
                | TokenKind::Amp
                | TokenKind::At
                | TokenKind::LBracket
                | TokenKind::RBracket => {}
                kind if kind.is_primitive_type() => {}
                _ => return false,
            }
            idx += 1;
        }
    }

    /// After a closing `>` of type arguments, only a few tokens can follow
    /// for the sequence to really have been type arguments.
    fn type_args_follow_set(&self, n: usize) -> bool {
        matches!(
            self.nth(n),
            TokenKind::Ident
                | TokenKind::LParen
                | TokenKind::Dot
                | TokenKind::ColonColon
                | TokenKind::LBracket
                | TokenKind::Gt
                | TokenKind::Comma
                | TokenKind::RParen
                | TokenKind::LBrace
                | TokenKind::ThisKw
        )
    }

    /// Bounded token-level scan of a type starting at lookahead `n`;
    /// `Some(next)` when one is present.
    pub(super) fn scan_type(&self, mut n: usize) -> Option<usize> {
        if self.nth(n).is_primitive_type() {
            n += 1;
        } else if self.nth(n) == TokenKind::Ident {
            n += 1;
            let mut budget = 64usize;
            if self.nth(n) == TokenKind::Lt {
                if !self.type_args_ahead(n) {
                    return None;
                }
                n = self.scan_balanced_angles(n, &mut budget);
            }
            while self.nth(n) == TokenKind::Dot && self.nth(n + 1) == TokenKind::Ident {
                n += 2;
                if self.nth(n) == TokenKind::Lt {
                    if !self.type_args_ahead(n) {
                        return None;
                    }
                    n = self.scan_balanced_angles(n, &mut budget);
                }
            }
        } else {
            return None;
        }

        while self.nth(n) == TokenKind::LBracket && self.nth(n + 1) == TokenKind::RBracket {
            n += 2;
        }
        Some(n)
    }
}
