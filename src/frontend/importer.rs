//! Multi-file compilation for Karst
//!
//! The importer owns the registry of compiled units and the include
//! graph. Parsing leaves `#include` directives in the tree as plain
//! nodes; this driver resolves them afterwards: cycle-check, compile
//! the target if it is new, record the dependency edge, and splice the
//! target's statements into the including tree in place of the
//! directive. Inclusion is eager, deduplicated, AST-level textual
//! inclusion: included definitions are visible to the includer's type
//! check, and a file is compiled (and spliced) at most once however
//! many units include it.
//!
//! Compilation is synchronous and depth-first: a nested unit is fully
//! compiled before the including unit's remaining directives are
//! resolved.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::frontend::ast::{Expr, Program, Span, Stmt};
use crate::frontend::diagnostics::{errors, Diagnostics};
use crate::frontend::lexer::lex;
use crate::frontend::lexer::tokens::Token;
use crate::frontend::parser::parse;
use crate::frontend::symbols::SymbolTable;
use crate::frontend::typechecker::check;

/// Host failure while reading a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies file contents to the importer.
pub trait SourceLoader {
    fn load(&self, path: &str) -> Result<String, LoadError>;
}

/// Loads files from disk, resolving relative paths against a root
/// directory.
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|source| LoadError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// One source file's complete frontend output.
#[derive(Debug)]
pub struct CompilationUnit {
    pub path: String,
    pub source: String,
    pub tokens: Vec<Token>,
    pub ast: Program,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
}

/// Running totals across every compiled unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompilationStats {
    pub units: usize,
    pub tokens: usize,
    pub lines: usize,
}

pub struct Importer<'a> {
    loader: &'a dyn SourceLoader,
    units: HashMap<String, CompilationUnit>,
    /// Direct include edges, append-only.
    edges: HashMap<String, Vec<String>>,
    stats: CompilationStats,
}

impl<'a> Importer<'a> {
    pub fn new(loader: &'a dyn SourceLoader) -> Self {
        Self {
            loader,
            units: HashMap::new(),
            edges: HashMap::new(),
            stats: CompilationStats::default(),
        }
    }

    /// Compile the entry file and, through its includes, everything it
    /// depends on. A load failure here is a host error; load failures
    /// for included files become diagnostics on the including unit.
    #[tracing::instrument(skip(self))]
    pub fn compile_entry(&mut self, path: &str) -> Result<&CompilationUnit, LoadError> {
        if !self.units.contains_key(path) {
            self.compile_unit(path)?;
        }
        Ok(&self.units[path])
    }

    pub fn unit(&self, path: &str) -> Option<&CompilationUnit> {
        self.units.get(path)
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values()
    }

    pub fn stats(&self) -> CompilationStats {
        self.stats
    }

    /// Total error count across every unit; the backend must not run
    /// while this is non-zero.
    pub fn error_count(&self) -> usize {
        self.units.values().map(|u| u.diagnostics.error_count()).sum()
    }

    fn compile_unit(&mut self, path: &str) -> Result<(), LoadError> {
        let source = self.loader.load(path)?;
        tracing::debug!(path, bytes = source.len(), "compiling unit");

        let mut diagnostics = Diagnostics::new();
        let (tokens, ast) = match lex(&source) {
            Ok(tokens) => {
                let (ast, parse_errors) = parse(tokens.clone());
                diagnostics.extend(parse_errors);
                (tokens, ast)
            }
            Err(lex_errors) => {
                diagnostics.extend(lex_errors);
                (
                    Vec::new(),
                    Program {
                        stmts: Vec::new(),
                        span: Span::default(),
                    },
                )
            }
        };

        let mut ast = ast;
        self.resolve_includes(path, &mut ast.stmts, &mut diagnostics);

        let (symbols, type_errors) = check(&ast);
        diagnostics.extend(type_errors);

        self.stats.units += 1;
        self.stats.tokens += tokens.len();
        self.stats.lines += source.lines().count();

        self.units.insert(
            path.to_string(),
            CompilationUnit {
                path: path.to_string(),
                source,
                tokens,
                ast,
                symbols,
                diagnostics,
            },
        );
        Ok(())
    }

    /// Walk a unit's statement list and resolve every include
    /// directive. A successful include of a new unit is spliced in
    /// place of the directive; an include of an already-registered unit
    /// is removed (its statements are already present once in the
    /// assembled tree). A failed directive is replaced by an error
    /// node; the rest of the unit still compiles.
    fn resolve_includes(
        &mut self,
        from: &str,
        stmts: &mut Vec<Stmt>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut i = 0;
        while i < stmts.len() {
            if let Stmt::Include { path, span } = &stmts[i] {
                let (target, span) = (path.clone(), *span);
                match self.include(from, &target, span) {
                    Ok(Some(spliced)) => {
                        let count = spliced.len();
                        // Spliced statements are already include-free
                        stmts.splice(i..=i, spliced);
                        i += count;
                    }
                    Ok(None) => {
                        stmts.remove(i);
                    }
                    Err(error) => {
                        diagnostics.report(error);
                        stmts[i] = Stmt::ParseError {
                            message: format!("failed include of '{target}'"),
                            span,
                        };
                        i += 1;
                    }
                }
            } else {
                self.resolve_nested_includes(from, &mut stmts[i], diagnostics);
                i += 1;
            }
        }
    }

    /// Recurse into statement containers looking for nested includes.
    /// Includes in a single-statement slot (a `#run` payload or an `if`
    /// branch) have no list to splice into; the included statements are
    /// wrapped in a block there.
    fn resolve_nested_includes(
        &mut self,
        from: &str,
        stmt: &mut Stmt,
        diagnostics: &mut Diagnostics,
    ) {
        match stmt {
            Stmt::Block { stmts, .. } => self.resolve_includes(from, stmts, diagnostics),
            Stmt::Run { stmt, .. } => self.resolve_slot(from, stmt, diagnostics),
            Stmt::If { then, else_, .. } => {
                self.resolve_slot(from, then, diagnostics);
                if let Some(else_) = else_ {
                    self.resolve_slot(from, else_, diagnostics);
                }
            }
            Stmt::Loop {
                body: Some(body), ..
            } => self.resolve_slot(from, body, diagnostics),
            Stmt::Define(def) => {
                if let Some(Expr::FunctionLiteral {
                    body: Some(body), ..
                }) = &mut def.value
                {
                    self.resolve_slot(from, body, diagnostics);
                }
            }
            _ => {}
        }
    }

    fn resolve_slot(&mut self, from: &str, slot: &mut Box<Stmt>, diagnostics: &mut Diagnostics) {
        if let Stmt::Include { path, span } = &**slot {
            let (target, span) = (path.clone(), *span);
            match self.include(from, &target, span) {
                Ok(spliced) => {
                    **slot = Stmt::Block {
                        stmts: spliced.unwrap_or_default(),
                        span,
                    };
                }
                Err(error) => {
                    diagnostics.report(error);
                    **slot = Stmt::ParseError {
                        message: format!("failed include of '{target}'"),
                        span,
                    };
                }
            }
        } else {
            self.resolve_nested_includes(from, slot, diagnostics);
        }
    }

    /// Resolve one include edge `from -> target`.
    ///
    /// The cycle check runs first and a failure mutates nothing. The
    /// edge is recorded before the target compiles so a nested include
    /// pointing back at `from` sees it. Returns the target's statements
    /// for splicing when this include triggered its compilation, `None`
    /// when the target was already registered.
    fn include(
        &mut self,
        from: &str,
        target: &str,
        span: Span,
    ) -> Result<Option<Vec<Stmt>>, crate::frontend::diagnostics::CompileError> {
        if self.reaches(target, from) {
            return Err(errors::cyclic_include(from, target, span));
        }

        let edges = self.edges.entry(from.to_string()).or_default();
        if !edges.iter().any(|e| e == target) {
            edges.push(target.to_string());
        }

        if self.units.contains_key(target) {
            return Ok(None);
        }
        if let Err(load_error) = self.compile_unit(target) {
            return Err(errors::unreadable_include(
                target,
                &load_error.to_string(),
                span,
            ));
        }
        Ok(Some(self.units[target].ast.stmts.clone()))
    }

    /// Whether `needle` is reachable from `start` through recorded
    /// include edges (a path includes its own start).
    fn reaches(&self, start: &str, needle: &str) -> bool {
        if start == needle {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(edges) = self.edges.get(current) {
                for edge in edges {
                    if edge == needle {
                        return true;
                    }
                    stack.push(edge.as_str());
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::diagnostics::ErrorKind;

    /// In-memory loader for tests.
    struct MapLoader {
        files: HashMap<String, String>,
    }

    impl MapLoader {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl SourceLoader for MapLoader {
        fn load(&self, path: &str) -> Result<String, LoadError> {
            self.files.get(path).cloned().ok_or_else(|| LoadError::Io {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        }
    }

    #[test]
    fn test_single_unit_compiles() {
        let loader = MapLoader::new(&[("main.ka", "x := 1;\ny : u8 = 2;\n")]);
        let mut importer = Importer::new(&loader);
        let unit = importer.compile_entry("main.ka").unwrap();
        assert!(unit.diagnostics.is_empty());
        assert_eq!(unit.ast.stmts.len(), 2);
        assert_eq!(importer.stats().units, 1);
        assert_eq!(importer.stats().lines, 2);
    }

    #[test]
    fn test_include_compiles_target_once() {
        let loader = MapLoader::new(&[
            ("main.ka", "#include \"lib.ka\"\n#include \"lib.ka\"\nx := 1;\n"),
            ("lib.ka", "y := 2;\n"),
        ]);
        let mut importer = Importer::new(&loader);
        importer.compile_entry("main.ka").unwrap();
        assert_eq!(importer.error_count(), 0);
        assert_eq!(importer.stats().units, 2);
        assert!(importer.unit("lib.ka").is_some());

        // Both directives resolved: lib spliced once, the repeat removed
        let main = importer.unit("main.ka").unwrap();
        assert!(!main
            .ast
            .stmts
            .iter()
            .any(|s| matches!(s, Stmt::Include { .. })));
        assert_eq!(main.ast.stmts.len(), 2);
    }

    #[test]
    fn test_included_definitions_visible_to_includer() {
        let loader = MapLoader::new(&[
            ("main.ka", "#include \"lib.ka\"\nz := y;\n"),
            ("lib.ka", "y : u8 = 2;\n"),
        ]);
        let mut importer = Importer::new(&loader);
        importer.compile_entry("main.ka").unwrap();
        assert_eq!(importer.error_count(), 0);

        let main = importer.unit("main.ka").unwrap();
        let z = main.symbols.lookup("z").unwrap();
        assert_eq!(z.ty.kind, crate::frontend::types::TypeKind::U8);
    }

    #[test]
    fn test_diamond_includes_are_deduplicated() {
        let loader = MapLoader::new(&[
            ("main.ka", "#include \"a.ka\"\n#include \"b.ka\"\n"),
            ("a.ka", "#include \"shared.ka\"\n"),
            ("b.ka", "#include \"shared.ka\"\n"),
            ("shared.ka", "s := 1;\n"),
        ]);
        let mut importer = Importer::new(&loader);
        importer.compile_entry("main.ka").unwrap();
        assert_eq!(importer.error_count(), 0);
        assert_eq!(importer.stats().units, 4);
    }

    #[test]
    fn test_cyclic_include_reports_exactly_one_error() {
        let loader = MapLoader::new(&[
            ("a.ka", "#include \"b.ka\"\nx := 1;\n"),
            ("b.ka", "#include \"a.ka\"\ny := 2;\n"),
        ]);
        let mut importer = Importer::new(&loader);
        importer.compile_entry("a.ka").unwrap();

        let import_errors: Vec<_> = importer
            .units()
            .flat_map(|u| u.diagnostics.errors())
            .filter(|e| e.kind == ErrorKind::Import)
            .collect();
        assert_eq!(import_errors.len(), 1);
        assert!(import_errors[0].message.contains("Cyclic dependency"));
        // Both units still compiled to completion
        assert_eq!(importer.stats().units, 2);
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let loader = MapLoader::new(&[("a.ka", "#include \"a.ka\"\n")]);
        let mut importer = Importer::new(&loader);
        let unit = importer.compile_entry("a.ka").unwrap();
        assert_eq!(unit.diagnostics.error_count(), 1);
        assert_eq!(unit.diagnostics.errors()[0].kind, ErrorKind::Import);
    }

    #[test]
    fn test_unreadable_include_keeps_unit_alive() {
        let loader = MapLoader::new(&[("main.ka", "#include \"missing.ka\"\nx := 1;\n")]);
        let mut importer = Importer::new(&loader);
        let unit = importer.compile_entry("main.ka").unwrap();
        assert_eq!(unit.diagnostics.error_count(), 1);
        assert_eq!(unit.diagnostics.errors()[0].kind, ErrorKind::Import);
        // The failed directive became an error node; x still defined
        assert!(unit.symbols.lookup("x").is_some());
        assert!(matches!(unit.ast.stmts[0], Stmt::ParseError { .. }));
    }

    #[test]
    fn test_missing_entry_is_a_host_error() {
        let loader = MapLoader::new(&[]);
        let mut importer = Importer::new(&loader);
        assert!(importer.compile_entry("nope.ka").is_err());
    }

    #[test]
    fn test_spliced_unit_keeps_its_own_symbols() {
        let loader = MapLoader::new(&[
            ("main.ka", "#include \"lib.ka\"\nx := 1;\n"),
            ("lib.ka", "y := 2;\n"),
        ]);
        let mut importer = Importer::new(&loader);
        importer.compile_entry("main.ka").unwrap();
        let main = importer.unit("main.ka").unwrap();
        let lib = importer.unit("lib.ka").unwrap();
        // main's tree holds lib's statements after splicing
        assert!(main.symbols.lookup("x").is_some());
        assert!(main.symbols.lookup("y").is_some());
        assert!(lib.symbols.lookup("y").is_some());
        assert!(lib.symbols.lookup("x").is_none());
    }
}
