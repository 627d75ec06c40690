//! Recursive-descent parser for Karst
//!
//! Tokens in, AST out. The parser is a pure function of its token
//! stream: an `#include` directive becomes a [`Stmt::Include`] node for
//! the importer to resolve, never a recursive compile from in here.
//!
//! Precedence is handled by a chain of level functions. A binary level
//! parses the next-higher level for its left operand and, on seeing one
//! of its operators, recurses into the *same* level for the right
//! operand. That produces right-leaning trees at every level, which is
//! the language's defined evaluation order.
//!
//! Errors never abort the parse. A bad token at the primary level
//! yields a `ParseError` node, reports a diagnostic, and always
//! advances at least one token before resuming at the next statement.

use crate::frontend::ast::{BinaryOp, DefineStmt, Expr, Program, Span, Stmt, UnaryOp};
use crate::frontend::diagnostics::{errors, CompileError};
use crate::frontend::lexer::tokens::{Token, TokenKind};
use crate::frontend::types::{FnSig, Type, TypeKind, Value};

/// Context threaded through recursive parse calls.
///
/// Immutable and passed by value: a callee sees the flags its caller
/// set, and the caller's own context is untouched when the callee
/// returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext {
    /// Inside the initializer of a constant definition (`x : e`).
    /// Literals parsed here are tagged constant.
    pub constant_initializer: bool,
    /// Inside the initializer of a mutable definition (`x := e`,
    /// `x : T = e`).
    pub variable_initializer: bool,
}

impl ParseContext {
    fn constant(self) -> Self {
        Self {
            constant_initializer: true,
            variable_initializer: false,
        }
    }

    fn variable(self) -> Self {
        Self {
            constant_initializer: false,
            variable_initializer: true,
        }
    }
}

/// Parse a token stream into a program.
///
/// Returns the tree together with every parse error encountered; the
/// tree is always complete (error regions appear as `ParseError` nodes).
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<CompileError>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.errors)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<CompileError>,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        // The stream is always sentinel-terminated, even if a caller
        // hands over an empty one.
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::End)) {
            tokens.push(Token::new(TokenKind::End, Span::default()));
        }
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // ========================================================================
    // Token stream helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::End)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report an expected-token error. Never advances
    /// on failure; recovery is the caller's decision.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            let found = self.peek().describe();
            let span = self.peek().span;
            self.errors.push(errors::expected_token(expected, &found, span));
            false
        }
    }

    fn report(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    // ========================================================================
    // Program and statements
    // ========================================================================

    fn parse_program(&mut self) -> Program {
        let start = self.peek().span;
        let mut stmts = Vec::new();
        while !self.at_end() {
            // Tolerate empty statements
            if self.eat(TokenKind::SemiColon) {
                continue;
            }
            stmts.push(self.parse_delimited_statement());
        }
        let span = start.merge(self.prev_span());
        Program { stmts, span }
    }

    /// A statement plus its trailing delimiter, where one is required.
    fn parse_delimited_statement(&mut self) -> Stmt {
        let stmt = self.parse_statement(ParseContext::default());
        if needs_delimiter(&stmt) && !self.eat(TokenKind::SemiColon) && !self.at_end() {
            self.report(errors::missing_delimiter(self.peek().span));
        }
        stmt
    }

    fn parse_statement(&mut self, ctx: ParseContext) -> Stmt {
        match &self.peek().kind {
            TokenKind::Hash => self.parse_directive(),
            TokenKind::Ret => self.parse_return(ctx),
            TokenKind::Continue => {
                let span = self.advance().span;
                Stmt::Continue { span }
            }
            TokenKind::Break => {
                let span = self.advance().span;
                Stmt::Break { span }
            }
            TokenKind::If => self.parse_if(ctx),
            TokenKind::For => self.parse_loop(ctx),
            TokenKind::LCurly => self.parse_block(ctx),
            TokenKind::Identifier(_)
                if matches!(
                    self.peek_at(1).kind,
                    TokenKind::Colon | TokenKind::QuickAssign
                ) =>
            {
                self.parse_define(ctx)
            }
            _ => self.parse_expression_statement(ctx),
        }
    }

    fn parse_directive(&mut self) -> Stmt {
        let start = self.advance().span; // '#'
        match self.peek().kind.clone() {
            TokenKind::Run => {
                self.advance();
                let stmt = self.parse_statement(ParseContext::default());
                let span = start.merge(stmt.span());
                Stmt::Run {
                    stmt: Box::new(stmt),
                    span,
                }
            }
            TokenKind::Include => {
                self.advance();
                match self.peek().kind.clone() {
                    TokenKind::StringLit(path) => {
                        let end = self.advance().span;
                        Stmt::Include {
                            path,
                            span: start.merge(end),
                        }
                    }
                    _ => {
                        let span = start.merge(self.peek().span);
                        self.report(errors::invalid_include_path(span));
                        self.recover();
                        Stmt::ParseError {
                            message: "invalid include path".to_string(),
                            span,
                        }
                    }
                }
            }
            _ => {
                let found = self.peek().describe();
                let span = start.merge(self.peek().span);
                self.report(errors::expected_token("'run' or 'include'", &found, span));
                self.recover();
                Stmt::ParseError {
                    message: "unknown directive".to_string(),
                    span,
                }
            }
        }
    }

    fn parse_return(&mut self, ctx: ParseContext) -> Stmt {
        let start = self.advance().span; // 'ret'
        let value = if self.starts_expression() {
            Some(self.parse_expression(ctx))
        } else {
            None
        };
        let end = value.as_ref().map(|v| v.span()).unwrap_or(start);
        Stmt::Return {
            value,
            span: start.merge(end),
        }
    }

    fn parse_if(&mut self, ctx: ParseContext) -> Stmt {
        let start = self.advance().span; // 'if'
        let cond = self.parse_expression(ctx);
        let then = Box::new(self.parse_statement(ctx));
        let else_ = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_statement(ctx)))
        } else {
            None
        };
        let end = else_
            .as_ref()
            .map(|e| e.span())
            .unwrap_or_else(|| then.span());
        Stmt::If {
            cond,
            then,
            else_,
            span: start.merge(end),
        }
    }

    /// `for` loop header. The body grammar is not settled yet; a block
    /// directly after the keyword is taken as the body, anything else
    /// leaves the loop bodyless.
    fn parse_loop(&mut self, ctx: ParseContext) -> Stmt {
        let start = self.advance().span; // 'for'
        let body = if self.check(TokenKind::LCurly) {
            Some(Box::new(self.parse_block(ctx)))
        } else {
            None
        };
        let end = body.as_ref().map(|b| b.span()).unwrap_or(start);
        Stmt::Loop {
            body,
            span: start.merge(end),
        }
    }

    fn parse_block(&mut self, ctx: ParseContext) -> Stmt {
        let start = self.advance().span; // '{'
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RCurly) && !self.at_end() {
            if self.eat(TokenKind::SemiColon) {
                continue;
            }
            let stmt = self.parse_statement(ctx);
            if needs_delimiter(&stmt)
                && !self.eat(TokenKind::SemiColon)
                && !self.check(TokenKind::RCurly)
                && !self.at_end()
            {
                self.report(errors::missing_delimiter(self.peek().span));
            }
            stmts.push(stmt);
        }
        self.expect(TokenKind::RCurly, "'}'");
        Stmt::Block {
            stmts,
            span: start.merge(self.prev_span()),
        }
    }

    /// `x : T`, `x : T = e`, `x : T e`, `x : e`, `x := e`.
    fn parse_define(&mut self, ctx: ParseContext) -> Stmt {
        let name_token = self.advance();
        let name = match name_token.kind {
            TokenKind::Identifier(name) => name,
            _ => String::new(),
        };
        let name_span = name_token.span;

        let mut def = DefineStmt {
            name,
            name_span,
            ty: Type::unknown(),
            value: None,
            requires_inference: false,
            is_constant: false,
            is_global: false,
            span: name_span,
        };

        if self.eat(TokenKind::QuickAssign) {
            // x := e, inferred and mutable
            def.requires_inference = true;
            def.value = Some(self.parse_expression(ctx.variable()));
        } else {
            self.advance(); // ':'
            if self.starts_type() {
                def.ty = self.parse_type();
                if self.eat(TokenKind::Assign) {
                    def.value = Some(self.parse_expression(ctx.variable()));
                } else if self.starts_expression() {
                    // x : T e, initializer without '='
                    def.value = Some(self.parse_expression(ctx.variable()));
                }
            } else {
                // x : e, inferred and constant
                def.requires_inference = true;
                def.is_constant = true;
                def.value = Some(self.parse_expression(ctx.constant()));
            }
        }

        def.span = name_span.merge(
            def.value
                .as_ref()
                .map(|v| v.span())
                .unwrap_or(self.prev_span()),
        );
        Stmt::Define(def)
    }

    fn parse_expression_statement(&mut self, ctx: ParseContext) -> Stmt {
        let expr = self.parse_expression(ctx);
        if self.eat(TokenKind::Assign) {
            let value = self.parse_expression(ctx);
            let span = expr.span().merge(value.span());
            return match expr {
                Expr::InterfaceGet { object, member, .. } => Stmt::InterfaceAssign {
                    object: *object,
                    member,
                    value,
                    span,
                },
                target => Stmt::Assign {
                    target,
                    value,
                    span,
                },
            };
        }
        let span = expr.span();
        Stmt::Expression { expr, span }
    }

    /// Skip ahead to a likely statement boundary after an error,
    /// consuming at least one token so the parse always terminates.
    fn recover(&mut self) {
        if !self.at_end() {
            self.advance();
        }
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::SemiColon => {
                    self.advance();
                    return;
                }
                TokenKind::RCurly
                | TokenKind::Hash
                | TokenKind::Ret
                | TokenKind::If
                | TokenKind::For
                | TokenKind::LCurly => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // Expressions, one function per precedence level
    // ========================================================================

    fn parse_expression(&mut self, ctx: ParseContext) -> Expr {
        self.parse_pattern(ctx)
    }

    /// Comma-separated tuple. A single element stays a plain expression.
    fn parse_pattern(&mut self, ctx: ParseContext) -> Expr {
        let first = self.parse_logical_or(ctx);
        if !self.check(TokenKind::Comma) {
            return first;
        }
        let mut elems = vec![first];
        while self.eat(TokenKind::Comma) {
            elems.push(self.parse_logical_or(ctx));
        }
        let span = elems[0].span().merge(elems[elems.len() - 1].span());
        Expr::Pattern { elems, span }
    }

    fn parse_logical_or(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_logical_and(ctx);
        if self.eat(TokenKind::LOr) {
            let rhs = self.parse_logical_or(ctx);
            return binary(BinaryOp::LogicalOr, lhs, rhs);
        }
        lhs
    }

    fn parse_logical_and(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_bitwise_or(ctx);
        if self.eat(TokenKind::LAnd) {
            let rhs = self.parse_logical_and(ctx);
            return binary(BinaryOp::LogicalAnd, lhs, rhs);
        }
        lhs
    }

    fn parse_bitwise_or(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_bitwise_and(ctx);
        if self.eat(TokenKind::BOr) {
            let rhs = self.parse_bitwise_or(ctx);
            return binary(BinaryOp::BitOr, lhs, rhs);
        }
        lhs
    }

    fn parse_bitwise_and(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_equality(ctx);
        if self.eat(TokenKind::BAnd) {
            let rhs = self.parse_bitwise_and(ctx);
            return binary(BinaryOp::BitAnd, lhs, rhs);
        }
        lhs
    }

    fn parse_equality(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_comparison(ctx);
        let op = match self.peek().kind {
            TokenKind::Equals => BinaryOp::Equals,
            TokenKind::Neq => BinaryOp::NotEquals,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_equality(ctx);
        binary(op, lhs, rhs)
    }

    fn parse_comparison(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_shift(ctx);
        let op = match self.peek().kind {
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::Geq => BinaryOp::GreaterEq,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Leq => BinaryOp::LessEq,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_comparison(ctx);
        binary(op, lhs, rhs)
    }

    fn parse_shift(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_additive(ctx);
        let op = match self.peek().kind {
            TokenKind::LShift => BinaryOp::ShiftLeft,
            TokenKind::RShift => BinaryOp::ShiftRight,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_shift(ctx);
        binary(op, lhs, rhs)
    }

    fn parse_additive(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_multiplicative(ctx);
        let op = match self.peek().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_additive(ctx);
        binary(op, lhs, rhs)
    }

    fn parse_multiplicative(&mut self, ctx: ParseContext) -> Expr {
        let lhs = self.parse_unary(ctx);
        let op = match self.peek().kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Div => BinaryOp::Div,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_multiplicative(ctx);
        binary(op, lhs, rhs)
    }

    fn parse_unary(&mut self, ctx: ParseContext) -> Expr {
        let op = match self.peek().kind {
            TokenKind::Pointer => UnaryOp::Deref,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::BAnd => UnaryOp::Ref,
            _ => return self.parse_cast(ctx),
        };
        let start = self.advance().span;
        let operand = self.parse_unary(ctx);
        let span = start.merge(operand.span());
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    fn parse_cast(&mut self, ctx: ParseContext) -> Expr {
        let mut expr = self.parse_call(ctx);
        while self.eat(TokenKind::As) {
            let ty = self.parse_type();
            let span = expr.span().merge(self.prev_span());
            expr = Expr::Cast {
                expr: Box::new(expr),
                ty,
                span,
            };
        }
        expr
    }

    /// Postfix level: call arguments and `.member` access.
    fn parse_call(&mut self, ctx: ParseContext) -> Expr {
        let mut expr = self.parse_primary(ctx);
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        match self.parse_pattern(ctx) {
                            Expr::Pattern { elems, .. } => elems,
                            single => vec![single],
                        }
                    };
                    if !self.expect(TokenKind::RParen, "')' after call arguments") {
                        let span = expr.span().merge(self.peek().span);
                        return Expr::ParseError {
                            message: "unclosed call argument list".to_string(),
                            span,
                        };
                    }
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    match self.advance() {
                        Token {
                            kind: TokenKind::Identifier(member),
                            span: member_span,
                            ..
                        } => {
                            let span = expr.span().merge(member_span);
                            expr = Expr::InterfaceGet {
                                object: Box::new(expr),
                                member,
                                span,
                            };
                        }
                        other => {
                            let span = expr.span().merge(other.span);
                            self.report(errors::expected_token(
                                "member name after '.'",
                                &other.describe(),
                                other.span,
                            ));
                            return Expr::ParseError {
                                message: "missing member name".to_string(),
                                span,
                            };
                        }
                    }
                }
                _ => return expr,
            }
        }
    }

    fn parse_primary(&mut self, ctx: ParseContext) -> Expr {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Expr::Variable { name, span }
            }
            TokenKind::Number(text) => {
                let span = self.advance().span;
                self.number_literal(&text, span, ctx)
            }
            TokenKind::StringLit(text) => {
                let span = self.advance().span;
                let mut ty = Type::new(TypeKind::String);
                ty.is_constant = ctx.constant_initializer;
                Expr::Literal {
                    ty,
                    value: Value::new(text),
                    span,
                }
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                let text = if matches!(token.kind, TokenKind::True) {
                    "1"
                } else {
                    "0"
                };
                let mut ty = Type::new(TypeKind::U8);
                ty.is_constant = ctx.constant_initializer;
                Expr::Literal {
                    ty,
                    value: Value::new(text),
                    span: token.span,
                }
            }
            TokenKind::LParen => self.parse_group_or_function(ctx),
            TokenKind::LCurly => self.parse_array_literal(ctx),
            TokenKind::Interface => self.parse_interface_literal(ctx),
            _ => {
                let found = self.peek().describe();
                let span = self.peek().span;
                self.report(errors::unexpected_token(&found, span));
                // Guaranteed progress even on an unexpected token
                if !self.at_end() {
                    self.advance();
                }
                Expr::ParseError {
                    message: format!("unexpected {found}"),
                    span,
                }
            }
        }
    }

    fn number_literal(&mut self, text: &str, span: Span, ctx: ParseContext) -> Expr {
        let value = Value::new(text);
        if value.decimal_points() > 1 {
            self.report(errors::malformed_number(text, span));
            return Expr::ParseError {
                message: format!("malformed number '{text}'"),
                span,
            };
        }
        let mut ty = if value.decimal_points() == 1 {
            Type::float_literal()
        } else {
            Type::int_literal()
        };
        ty.is_constant = ctx.constant_initializer;
        Expr::Literal { ty, value, span }
    }

    /// `(` at the primary level: `()` starts a function literal, anything
    /// else is a parenthesised group.
    fn parse_group_or_function(&mut self, ctx: ParseContext) -> Expr {
        let start = self.advance().span; // '('
        if self.eat(TokenKind::RParen) {
            return self.parse_function_literal(start, ctx);
        }
        let expr = self.parse_expression(ctx);
        if !self.expect(TokenKind::RParen, "')' to close group") {
            let span = start.merge(expr.span());
            return Expr::ParseError {
                message: "unclosed parenthesised group".to_string(),
                span,
            };
        }
        let span = start.merge(self.prev_span());
        Expr::Group {
            expr: Box::new(expr),
            span,
        }
    }

    /// `()` already consumed: optional return type, then `;` (bodyless)
    /// or a statement body.
    fn parse_function_literal(&mut self, start: Span, ctx: ParseContext) -> Expr {
        let mut sig = FnSig {
            op_types: vec![Type::new(TypeKind::U0)],
            has_return: false,
        };
        if self.starts_type() {
            sig.op_types[0] = self.parse_type();
            sig.has_return = true;
        }
        let mut ty = Type::new(TypeKind::Fn(sig));
        ty.is_constant = ctx.constant_initializer;

        // A following ';' delimits the enclosing statement, so a
        // bodyless literal leaves it for the statement parser.
        let body = if self.starts_statement() {
            Some(Box::new(self.parse_statement(ParseContext::default())))
        } else {
            None
        };
        let end = body.as_ref().map(|b| b.span()).unwrap_or(self.prev_span());
        let span = start.merge(end);

        // A bodyless literal is a forward declaration and only makes
        // sense bound to a constant name.
        if body.is_none() && ctx.variable_initializer {
            self.report(errors::lambda_without_body(span));
            return Expr::ParseError {
                message: "function literal without a body".to_string(),
                span,
            };
        }
        Expr::FunctionLiteral { ty, body, span }
    }

    /// `{ e1, e2, ... }`
    fn parse_array_literal(&mut self, ctx: ParseContext) -> Expr {
        let start = self.advance().span; // '{'
        let mut elems = Vec::new();
        if !self.check(TokenKind::RCurly) {
            elems.push(self.parse_logical_or(ctx));
            while self.eat(TokenKind::Comma) {
                elems.push(self.parse_logical_or(ctx));
            }
        }
        if !self.expect(TokenKind::RCurly, "'}' to close array literal") {
            let span = start.merge(self.peek().span);
            return Expr::ParseError {
                message: "unclosed array literal".to_string(),
                span,
            };
        }
        Expr::ArrayLiteral {
            elems,
            span: start.merge(self.prev_span()),
        }
    }

    /// `interface { member : T ... }`
    fn parse_interface_literal(&mut self, ctx: ParseContext) -> Expr {
        let start = self.advance().span; // 'interface'
        if !self.expect(TokenKind::LCurly, "'{' after 'interface'") {
            let span = start.merge(self.peek().span);
            return Expr::ParseError {
                message: "missing interface body".to_string(),
                span,
            };
        }
        let mut members = Vec::new();
        while !self.check(TokenKind::RCurly) && !self.at_end() {
            match self.parse_statement(ctx) {
                Stmt::Define(def) => members.push(def),
                other => {
                    self.report(errors::expected_token(
                        "member definition",
                        "statement",
                        other.span(),
                    ));
                }
            }
            self.eat(TokenKind::SemiColon);
        }
        self.expect(TokenKind::RCurly, "'}' to close interface");
        Expr::InterfaceLiteral {
            members,
            span: start.merge(self.prev_span()),
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// True if the current token can begin a written type.
    ///
    /// `(` is deliberately excluded: after `:` it always begins a
    /// function-literal expression, not a type.
    fn starts_type(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::U8
                | TokenKind::S8
                | TokenKind::U16
                | TokenKind::U32
                | TokenKind::S32
                | TokenKind::U64
                | TokenKind::S64
                | TokenKind::F32
                | TokenKind::F64
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::Type
                | TokenKind::Fn
                | TokenKind::Pointer
        )
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::StringLit(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LParen
                | TokenKind::LCurly
                | TokenKind::Interface
                | TokenKind::Bang
                | TokenKind::Pointer
                | TokenKind::BAnd
        )
    }

    fn starts_statement(&self) -> bool {
        self.starts_expression()
            || matches!(
                self.peek().kind,
                TokenKind::Hash
                    | TokenKind::Ret
                    | TokenKind::Continue
                    | TokenKind::Break
                    | TokenKind::If
                    | TokenKind::For
            )
    }

    fn parse_type(&mut self) -> Type {
        let mut ty = Type::unknown();
        while self.eat(TokenKind::Pointer) {
            ty.indirection = ty.indirection.saturating_add(1);
        }

        ty.kind = match self.peek().kind {
            TokenKind::U8 => TypeKind::U8,
            TokenKind::S8 => TypeKind::S8,
            TokenKind::U16 => TypeKind::U16,
            TokenKind::U32 => TypeKind::U32,
            TokenKind::S32 => TypeKind::S32,
            TokenKind::U64 => TypeKind::U64,
            TokenKind::S64 => TypeKind::S64,
            TokenKind::F32 => TypeKind::F32,
            TokenKind::F64 => TypeKind::F64,
            TokenKind::Char => TypeKind::Char,
            TokenKind::String => TypeKind::String,
            TokenKind::Type => TypeKind::TypeOfType,
            TokenKind::Fn => TypeKind::Fn(FnSig::default()),
            _ => {
                let found = self.peek().describe();
                let span = self.peek().span;
                self.report(errors::expected_token("a type", &found, span));
                return ty;
            }
        };
        self.advance();

        if let TypeKind::Fn(ref mut sig) = ty.kind {
            *sig = self.parse_fn_signature();
        }

        self.parse_array_suffix(&mut ty);
        ty
    }

    /// `fn` written as a type: optional `(T1, T2)` operand list and an
    /// optional return type.
    fn parse_fn_signature(&mut self) -> FnSig {
        let mut sig = FnSig {
            op_types: vec![Type::new(TypeKind::U0)],
            has_return: false,
        };
        if self.eat(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                sig.op_types.push(self.parse_type());
                while self.eat(TokenKind::Comma) {
                    sig.op_types.push(self.parse_type());
                }
            }
            self.expect(TokenKind::RParen, "')' to close operand types");
        }
        if self.starts_type() {
            sig.op_types[0] = self.parse_type();
            sig.has_return = true;
        }
        sig
    }

    /// `T[n]` fixed-length array; `T[]` unknown-length, which adds one
    /// indirection level.
    fn parse_array_suffix(&mut self, ty: &mut Type) {
        if !self.eat(TokenKind::LBracket) {
            return;
        }
        ty.is_array = true;
        if self.eat(TokenKind::RBracket) {
            ty.array_length = 0;
            ty.indirection = ty.indirection.saturating_add(1);
            return;
        }
        match self.peek().kind.clone() {
            TokenKind::Number(text) => {
                let span = self.advance().span;
                match Value::new(&text).as_u64() {
                    Some(len) => ty.array_length = len as usize,
                    None => self.report(errors::malformed_number(&text, span)),
                }
            }
            _ => {
                let found = self.peek().describe();
                let span = self.peek().span;
                self.report(errors::expected_token("array length", &found, span));
            }
        }
        self.expect(TokenKind::RBracket, "']' to close array length");
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span().merge(rhs.span());
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}

/// Statements that end in their own closing brace carry their own
/// visual boundary and take no `;`.
fn needs_delimiter(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Block { .. }
        | Stmt::If { .. }
        | Stmt::Loop { .. }
        | Stmt::Include { .. }
        | Stmt::Run { .. }
        | Stmt::ParseError { .. } => false,
        Stmt::Define(def) => !matches!(
            def.value,
            Some(Expr::FunctionLiteral { body: Some(_), .. })
                | Some(Expr::InterfaceLiteral { .. })
        ),
        _ => true,
    }
}

// ============================================================================
// TESTS
// ============================================================================
