#![forbid(unsafe_code)]
//! Karst Programming Language Compiler
//!
//! Karst is a small statically-typed language with structural
//! interfaces and compile-time directives. This crate provides the
//! compiler frontend: lexer, parser, type checker, and the multi-file
//! importer. Code generation consumes this crate's output and lives
//! elsewhere.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Compiler input**: Malformed source is never a panic. Lexical, parse, definition, and import
//!   failures are all represented as data (error nodes and diagnostic records).

pub mod cli;
pub mod frontend;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::importer;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::symbols;
pub use frontend::typechecker;
pub use frontend::types;
