//! Karst compiler frontend
//!
//! Pipeline: the importer loads a file, the lexer turns it into tokens,
//! the parser builds the AST, and the type checker walks it with a
//! scoped symbol table. Include directives fan the same pipeline out
//! across files, depth-first. Everything downstream gets the finished
//! AST, the symbol table, and a diagnostic record per unit.

pub mod ast;
pub mod diagnostics;
pub mod importer;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod typechecker;
pub mod types;
