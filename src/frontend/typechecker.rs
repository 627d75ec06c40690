//! Best-effort type checker for Karst
//!
//! A single visitor pass over one unit's tree, threading one
//! [`SymbolTable`] the whole way. Errors are recorded and the walk
//! continues, so one run reports as many definition problems as it can
//! find. Every visit returns the type it can establish for the node,
//! `Unknown` where nothing can be said yet.

use crate::frontend::ast::{DefineStmt, Expr, Program, Stmt};
use crate::frontend::diagnostics::{errors, CompileError};
use crate::frontend::symbols::{SymbolEntry, SymbolTable};
use crate::frontend::types::{InterfaceSig, Type, TypeKind};

/// Check a program, returning the populated symbol table and every
/// definition error found.
#[tracing::instrument(skip_all, fields(stmts = program.stmts.len()))]
pub fn check(program: &Program) -> (SymbolTable, Vec<CompileError>) {
    let mut checker = TypeChecker::new();
    checker.check_program(program);
    (checker.symbols, checker.errors)
}

pub struct TypeChecker {
    symbols: SymbolTable,
    errors: Vec<CompileError>,
    /// Counter for naming anonymous interface literals.
    anon_interfaces: u32,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            anon_interfaces: 0,
        }
    }

    fn check_program(&mut self, program: &Program) {
        for stmt in &program.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { stmts, .. } => {
                self.symbols.enter_scope();
                for s in stmts {
                    self.visit_stmt(s);
                }
                self.symbols.exit_scope();
            }
            Stmt::Expression { expr, .. } => {
                self.visit_expr(expr);
            }
            Stmt::Define(def) => self.visit_define(def),
            Stmt::Assign { target, value, .. } => {
                self.visit_expr(target);
                self.visit_expr(value);
            }
            Stmt::InterfaceAssign { object, value, .. } => {
                self.visit_expr(object);
                self.visit_expr(value);
            }
            Stmt::Return { value, .. } => {
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            Stmt::If {
                cond, then, else_, ..
            } => {
                self.visit_expr(cond);
                self.visit_stmt(then);
                if let Some(e) = else_ {
                    self.visit_stmt(e);
                }
            }
            Stmt::Loop { body, .. } => {
                if let Some(b) = body {
                    self.visit_stmt(b);
                }
            }
            Stmt::Run { stmt, .. } => self.visit_stmt(stmt),
            Stmt::Continue { .. }
            | Stmt::Break { .. }
            | Stmt::Include { .. }
            | Stmt::ParseError { .. } => {}
        }
    }

    /// The Define contract: reject duplicates at the current level,
    /// infer or verify the type, then register the symbol.
    fn visit_define(&mut self, def: &DefineStmt) {
        if self.symbols.defined_at_current_level(&def.name) {
            self.errors
                .push(errors::duplicate_symbol(&def.name, def.name_span));
            return;
        }

        let ty = match self.resolve_define_type(def) {
            Some(ty) => ty,
            None => return,
        };

        let mut entry = SymbolEntry::new(ty);
        entry.is_constant = def.is_constant;
        if self.symbols.level() == 0 {
            entry = entry.global();
        }
        self.symbols.add_symbol(def.name.clone(), entry);
    }

    /// Infer the binding's type from its initializer, or verify the
    /// declared type against it. `None` means a mismatch was reported
    /// and the binding is not registered.
    fn resolve_define_type(&mut self, def: &DefineStmt) -> Option<Type> {
        let value_ty = def.value.as_ref().map(|v| self.visit_expr(v));

        if def.requires_inference {
            let mut inferred = value_ty.unwrap_or_else(Type::unknown);
            inferred.is_constant = def.is_constant;
            return Some(inferred);
        }

        let Some(value_ty) = value_ty else {
            // Declaration only
            return Some(def.ty.clone());
        };

        // Unknown initializer types come from error nodes; the parse
        // error was already reported.
        if matches!(value_ty.kind, TypeKind::Unknown) {
            return Some(def.ty.clone());
        }

        if value_ty.matches_basic(&def.ty) {
            return Some(def.ty.clone());
        }

        // An unlabelled literal may still fit via a naive cast within
        // its numeric category.
        if value_ty.naive_cast(&def.ty).is_some() {
            return Some(def.ty.clone());
        }

        self.errors.push(errors::type_mismatch(
            &def.ty.to_string(),
            &value_ty.to_string(),
            def.name_span,
        ));
        None
    }

    fn visit_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal { ty, .. } => ty.clone(),
            Expr::Variable { name, span } => match self.symbols.lookup(name) {
                Some(entry) => entry.ty.clone(),
                None => {
                    self.errors.push(errors::unknown_symbol(name, *span));
                    Type::unknown()
                }
            },
            Expr::FunctionLiteral { ty, body, .. } => {
                if let Some(body) = body {
                    self.symbols.enter_scope();
                    self.visit_stmt(body);
                    self.symbols.exit_scope();
                }
                ty.clone()
            }
            Expr::InterfaceLiteral { members, .. } => self.visit_interface_literal(members),
            Expr::Group { expr, .. } => self.visit_expr(expr),
            Expr::Cast { expr, ty, .. } => {
                self.visit_expr(expr);
                ty.clone()
            }
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                let lhs_ty = self.visit_expr(lhs);
                self.visit_expr(rhs);
                // Operand agreement is deferred; the left type stands
                // in for the expression.
                lhs_ty
            }
            Expr::Pattern { elems, .. } => {
                let types = elems.iter().map(|e| self.visit_expr(e)).collect();
                Type::pattern(types)
            }
            Expr::InterfaceGet { object, .. } => {
                self.visit_expr(object);
                Type::unknown()
            }
            Expr::Call { callee, args, .. } => {
                let callee_ty = self.visit_expr(callee);
                for arg in args {
                    self.visit_expr(arg);
                }
                // A call evaluates to the callee's return slot.
                match callee_ty.kind {
                    TypeKind::Fn(sig) if sig.has_return => sig
                        .op_types
                        .first()
                        .cloned()
                        .unwrap_or_else(Type::unknown),
                    _ => Type::unknown(),
                }
            }
            Expr::ArrayLiteral { elems, .. } => {
                let mut elem_ty = Type::unknown();
                for (i, e) in elems.iter().enumerate() {
                    let ty = self.visit_expr(e);
                    if i == 0 {
                        elem_ty = ty;
                    }
                }
                elem_ty.is_array = true;
                elem_ty.array_length = elems.len();
                elem_ty
            }
            Expr::ParseError { .. } => Type::unknown(),
        }
    }

    /// An interface literal's type is the ordered list of its member
    /// types. Members get the same infer-or-verify treatment as any
    /// other define, inside their own scope.
    fn visit_interface_literal(&mut self, members: &[DefineStmt]) -> Type {
        self.symbols.enter_scope();
        let mut member_types = Vec::with_capacity(members.len());
        for member in members {
            self.visit_define(member);
            let ty = self
                .symbols
                .lookup(&member.name)
                .map(|entry| entry.ty.clone())
                .unwrap_or_else(Type::unknown);
            member_types.push(ty);
        }
        self.symbols.exit_scope();

        self.anon_interfaces += 1;
        Type::new(TypeKind::Interface(InterfaceSig {
            name: format!("interface#{}", self.anon_interfaces),
            members: member_types,
        }))
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::lex;
    use crate::frontend::parser::parse;

    fn check_source(source: &str) -> (SymbolTable, Vec<CompileError>) {
        let tokens = lex(source).unwrap();
        let (program, parse_errors) = parse(tokens);
        assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
        check(&program)
    }

    #[test]
    fn test_quick_assign_infers_s32() {
        let (symbols, errors) = check_source("x := 1;");
        assert!(errors.is_empty());
        let entry = symbols.lookup("x").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::S32));
        assert!(entry.is_global);
        assert!(!entry.is_constant);
    }

    #[test]
    fn test_constant_inference() {
        let (symbols, errors) = check_source("k : 2.5;");
        assert!(errors.is_empty());
        let entry = symbols.lookup("k").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::F64));
        assert!(entry.is_constant);
    }

    #[test]
    fn test_int_literal_naive_cast_to_u8() {
        let (symbols, errors) = check_source("y : u8 = 2;");
        assert!(errors.is_empty());
        let entry = symbols.lookup("y").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::U8));
    }

    #[test]
    fn test_cross_category_initializer_fails() {
        let (symbols, errors) = check_source("z : string = 3;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Type mismatch"));
        // The binding is not registered after a mismatch
        assert!(symbols.lookup("z").is_none());
    }

    #[test]
    fn test_mismatch_error_points_at_identifier() {
        let source = "ok := 1;\nz : string = 3;\n";
        let (_, errors) = check_source(source);
        assert_eq!(errors.len(), 1);
        // The span covers 'z' on line 2
        assert_eq!(errors[0].span.start, source.find('z').unwrap());
    }

    #[test]
    fn test_undefined_variable_reported() {
        let (symbols, errors) = check_source("z := y;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unknown symbol 'y'"));
        // z still registers, with nothing known about it
        let entry = symbols.lookup("z").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::Unknown));
    }

    #[test]
    fn test_use_out_of_scope_reported() {
        let (_, errors) = check_source("{ x := 1; }\ny := x;\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unknown symbol 'x'"));
    }

    #[test]
    fn test_duplicate_in_same_scope_errors() {
        let (_, errors) = check_source("{ x := 1;\nx := 2; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("already defined"));
    }

    #[test]
    fn test_sibling_blocks_may_both_define() {
        let (_, errors) = check_source("{ x := 1; }\n{ x := 2; }");
        assert!(errors.is_empty(), "sibling scopes must not collide: {errors:?}");
    }

    #[test]
    fn test_shadowing_across_levels_is_allowed() {
        let (_, errors) = check_source("x := 1;\n{ x := 2; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_multiple_errors_in_one_run() {
        let (_, errors) = check_source("a : string = 1;\nb : u8 = 'text';\n");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_function_literal_scopes_body() {
        let source = "x := 1;\nmain : () s32 {\n    x := 2;\n    ret x;\n}";
        let (symbols, errors) = check_source(source);
        assert!(errors.is_empty(), "{errors:?}");
        let entry = symbols.lookup("main").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::Fn(_)));
        assert!(entry.is_constant);
    }

    #[test]
    fn test_interface_literal_member_types() {
        let source = "Person : interface {\n    age : u8;\n    name : string;\n};";
        let (symbols, errors) = check_source(source);
        assert!(errors.is_empty(), "{errors:?}");
        let entry = symbols.lookup("Person").unwrap();
        let TypeKind::Interface(sig) = &entry.ty.kind else {
            panic!("expected interface type");
        };
        assert_eq!(sig.members.len(), 2);
        assert!(matches!(sig.members[0].kind, TypeKind::U8));
        assert!(matches!(sig.members[1].kind, TypeKind::String));
    }

    #[test]
    fn test_pattern_expression_is_flagged() {
        let (symbols, errors) = check_source("p := 1, 2;");
        assert!(errors.is_empty(), "{errors:?}");
        let entry = symbols.lookup("p").unwrap();
        assert!(entry.ty.is_pattern);
        let TypeKind::Pattern(sig) = &entry.ty.kind else {
            panic!("expected pattern type");
        };
        assert_eq!(sig.types.len(), 2);
        assert!(matches!(sig.types[0].kind, TypeKind::S32));
    }

    #[test]
    fn test_end_to_end_two_defines() {
        let (symbols, errors) = check_source("x := 1;\ny : u8 = 2;\n");
        assert!(errors.is_empty());
        let x = symbols.lookup("x").unwrap();
        assert!(matches!(x.ty.kind, TypeKind::S32));
        assert!(x.is_global);
        let y = symbols.lookup("y").unwrap();
        assert!(matches!(y.ty.kind, TypeKind::U8));
        assert!(y.is_global);
    }
}
