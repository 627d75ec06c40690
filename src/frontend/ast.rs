//! Abstract Syntax Tree definitions for Karst
//!
//! The tree is a closed tagged union: one `Stmt` enum and one `Expr` enum
//! cover every node kind, and all children are exclusively owned
//! (`Box`/`Vec`, never shared). Every node carries the source [`Span`] of
//! the text it was parsed from, relative to its own compilation unit.

use crate::frontend::types::{Type, Value};

/// Source location span.
///
/// Half-open byte range into the owning unit's original text, with the
/// line numbers of both endpoints (0-based, matching the lexer's counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub start_line: u32,
    pub end: usize,
    pub end_line: u32,
}

impl Span {
    pub fn new(start: usize, start_line: u32, end: usize, end_line: u32) -> Self {
        Self {
            start,
            start_line,
            end,
            end_line,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            start_line: self.start_line.min(other.start_line),
            end: self.end.max(other.end),
            end_line: self.end_line.max(other.end_line),
        }
    }
}

/// Identifier (plain string; interning is a backend concern)
pub type Ident = String;

/// A program is a sequence of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `{ ... }` — opens a new scope around its children
    Block { stmts: Vec<Stmt>, span: Span },
    /// Bare expression used as a statement
    Expression { expr: Expr, span: Span },
    /// `x : T`, `x : T = e`, `x : e`, `x := e`
    Define(DefineStmt),
    /// `x = e`
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    /// `obj.member = e`
    InterfaceAssign {
        object: Expr,
        member: Ident,
        value: Expr,
        span: Span,
    },
    /// `ret` with an optional value
    Return { value: Option<Expr>, span: Span },
    Continue { span: Span },
    Break { span: Span },
    If {
        cond: Expr,
        then: Box<Stmt>,
        else_: Option<Box<Stmt>>,
        span: Span,
    },
    /// `for` loop header; the body grammar is not exercised yet
    Loop { body: Option<Box<Stmt>>, span: Span },
    /// `#include "path"` — resolved by the importer, never by the parser
    Include { path: String, span: Span },
    /// `#run stmt` — captured for later ahead-of-time evaluation
    Run { stmt: Box<Stmt>, span: Span },
    /// Placeholder emitted during panic-mode recovery
    ParseError { message: String, span: Span },
}

/// A definition statement.
///
/// `requires_inference` is set for the `x : e` and `x := e` forms; the
/// type checker fills in `ty` from the initializer. The `x : e` form also
/// marks the binding constant.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineStmt {
    pub name: Ident,
    pub name_span: Span,
    pub ty: Type,
    pub value: Option<Expr>,
    pub requires_inference: bool,
    pub is_constant: bool,
    pub is_global: bool,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `interface { member : T ... }`
    InterfaceLiteral { members: Vec<DefineStmt>, span: Span },
    /// `() stmt`, `() T stmt`, or the bodyless `() T;`
    FunctionLiteral {
        ty: Type,
        body: Option<Box<Stmt>>,
        span: Span,
    },
    Variable { name: Ident, span: Span },
    /// Comma-separated tuple of expressions
    Pattern { elems: Vec<Expr>, span: Span },
    /// `obj.member`
    InterfaceGet {
        object: Box<Expr>,
        member: Ident,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// Parenthesised group
    Group { expr: Box<Expr>, span: Span },
    Literal { ty: Type, value: Value, span: Span },
    /// `expr as T`
    Cast {
        expr: Box<Expr>,
        ty: Type,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        /// Argument list, parsed as a single pattern (0 or more elements)
        args: Vec<Expr>,
        span: Span,
    },
    /// `{ e1, e2, ... }`
    ArrayLiteral { elems: Vec<Expr>, span: Span },
    /// Placeholder emitted during panic-mode recovery
    ParseError { message: String, span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitAnd,
    Equals,
    NotEquals,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    ShiftLeft,
    ShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `^` — pointer dereference
    Deref,
    /// `!` — logical not
    Not,
    /// `&` — address-of
    Ref,
}

// ============================================================================
// Span accessors
// ============================================================================

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block { span, .. }
            | Stmt::Expression { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::InterfaceAssign { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Continue { span }
            | Stmt::Break { span }
            | Stmt::If { span, .. }
            | Stmt::Loop { span, .. }
            | Stmt::Include { span, .. }
            | Stmt::Run { span, .. }
            | Stmt::ParseError { span, .. } => *span,
            Stmt::Define(def) => def.span,
        }
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::InterfaceLiteral { span, .. }
            | Expr::FunctionLiteral { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Pattern { span, .. }
            | Expr::InterfaceGet { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Group { span, .. }
            | Expr::Literal { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Call { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::ParseError { span, .. } => *span,
        }
    }
}

// ============================================================================
// Debug tree dump
// ============================================================================
//
// Structural rendering of the tree for `--emit-ast` and for tests. Spans
// are deliberately omitted so two parses of the same text compare equal
// regardless of where in the file they started.

impl Program {
    pub fn dump(&self) -> String {
        let mut out = String::from("program\n");
        for stmt in &self.stmts {
            dump_stmt(stmt, 1, &mut out);
        }
        out
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(depth, out);
    match stmt {
        Stmt::Block { stmts, .. } => {
            out.push_str("block\n");
            for s in stmts {
                dump_stmt(s, depth + 1, out);
            }
        }
        Stmt::Expression { expr, .. } => {
            out.push_str("expr-stmt\n");
            dump_expr(expr, depth + 1, out);
        }
        Stmt::Define(def) => {
            out.push_str(&format!(
                "define {} : {}{}\n",
                def.name,
                def.ty,
                if def.is_constant { " const" } else { "" }
            ));
            if let Some(value) = &def.value {
                dump_expr(value, depth + 1, out);
            }
        }
        Stmt::Assign { target, value, .. } => {
            out.push_str("assign\n");
            dump_expr(target, depth + 1, out);
            dump_expr(value, depth + 1, out);
        }
        Stmt::InterfaceAssign {
            object,
            member,
            value,
            ..
        } => {
            out.push_str(&format!("interface-assign .{member}\n"));
            dump_expr(object, depth + 1, out);
            dump_expr(value, depth + 1, out);
        }
        Stmt::Return { value, .. } => {
            out.push_str("ret\n");
            if let Some(v) = value {
                dump_expr(v, depth + 1, out);
            }
        }
        Stmt::Continue { .. } => out.push_str("continue\n"),
        Stmt::Break { .. } => out.push_str("break\n"),
        Stmt::If {
            cond, then, else_, ..
        } => {
            out.push_str("if\n");
            dump_expr(cond, depth + 1, out);
            dump_stmt(then, depth + 1, out);
            if let Some(e) = else_ {
                indent(depth, out);
                out.push_str("else\n");
                dump_stmt(e, depth + 1, out);
            }
        }
        Stmt::Loop { body, .. } => {
            out.push_str("loop\n");
            if let Some(b) = body {
                dump_stmt(b, depth + 1, out);
            }
        }
        Stmt::Include { path, .. } => out.push_str(&format!("include {path:?}\n")),
        Stmt::Run { stmt, .. } => {
            out.push_str("run\n");
            dump_stmt(stmt, depth + 1, out);
        }
        Stmt::ParseError { message, .. } => out.push_str(&format!("parse-error {message:?}\n")),
    }
}

fn dump_expr(expr: &Expr, depth: usize, out: &mut String) {
    indent(depth, out);
    match expr {
        Expr::InterfaceLiteral { members, .. } => {
            out.push_str("interface-literal\n");
            for m in members {
                indent(depth + 1, out);
                out.push_str(&format!("member {} : {}\n", m.name, m.ty));
            }
        }
        Expr::FunctionLiteral { ty, body, .. } => {
            out.push_str(&format!("fn-literal {ty}\n"));
            if let Some(b) = body {
                dump_stmt(b, depth + 1, out);
            }
        }
        Expr::Variable { name, .. } => out.push_str(&format!("var {name}\n")),
        Expr::Pattern { elems, .. } => {
            out.push_str("pattern\n");
            for e in elems {
                dump_expr(e, depth + 1, out);
            }
        }
        Expr::InterfaceGet { object, member, .. } => {
            out.push_str(&format!("interface-get .{member}\n"));
            dump_expr(object, depth + 1, out);
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            out.push_str(&format!("binary {op:?}\n"));
            dump_expr(lhs, depth + 1, out);
            dump_expr(rhs, depth + 1, out);
        }
        Expr::Unary { op, operand, .. } => {
            out.push_str(&format!("unary {op:?}\n"));
            dump_expr(operand, depth + 1, out);
        }
        Expr::Group { expr, .. } => {
            out.push_str("group\n");
            dump_expr(expr, depth + 1, out);
        }
        Expr::Literal { ty, value, .. } => {
            out.push_str(&format!("literal {} {:?}\n", ty, value.text()));
        }
        Expr::Cast { expr, ty, .. } => {
            out.push_str(&format!("cast -> {ty}\n"));
            dump_expr(expr, depth + 1, out);
        }
        Expr::Call { callee, args, .. } => {
            out.push_str("call\n");
            dump_expr(callee, depth + 1, out);
            for a in args {
                dump_expr(a, depth + 1, out);
            }
        }
        Expr::ArrayLiteral { elems, .. } => {
            out.push_str("array-literal\n");
            for e in elems {
                dump_expr(e, depth + 1, out);
            }
        }
        Expr::ParseError { message, .. } => out.push_str(&format!("parse-error {message:?}\n")),
    }
}
