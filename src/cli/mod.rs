//! CLI module for the Karst compiler
//!
//! Frontend-only surface: the default action type-checks a file (and
//! everything it includes) and prints diagnostics with source context.
//! Debug flags dump the token stream or the AST for tooling.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros. Command
//! functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use crate::frontend::diagnostics::print_error;
use crate::frontend::importer::{FsLoader, Importer};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Karst programming language compiler frontend
#[derive(Parser, Debug)]
#[command(name = "karst")]
#[command(version = VERSION)]
#[command(about = "The Karst programming language compiler", long_about = None)]
pub struct Cli {
    /// File to type check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dump the token stream of every compiled unit (debug)
    #[arg(long = "emit-tokens")]
    pub emit_tokens: bool,

    /// Dump the AST of every compiled unit (debug)
    #[arg(long = "emit-ast")]
    pub emit_ast: bool,

    /// Print compilation statistics
    #[arg(long)]
    pub stats: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    check_file(&cli.file, cli.emit_tokens, cli.emit_ast, cli.stats)
}

/// Compile a file and everything it includes, print diagnostics, and
/// report success only when no unit accumulated an error.
fn check_file(file: &Path, emit_tokens: bool, emit_ast: bool, stats: bool) -> CliResult<ExitCode> {
    let root = file.parent().unwrap_or_else(|| Path::new("."));
    let entry = file
        .file_name()
        .ok_or_else(|| CliError::failure(format!("Error: not a file: {}", file.display())))?
        .to_string_lossy()
        .to_string();

    let loader = FsLoader::new(root);
    let mut importer = Importer::new(&loader);
    importer
        .compile_entry(&entry)
        .map_err(|e| CliError::failure(format!("Error: {e}")))?;

    let mut units: Vec<_> = importer.units().collect();
    units.sort_by(|a, b| a.path.cmp(&b.path));

    for unit in &units {
        if emit_tokens {
            println!("// tokens of {}", unit.path);
            for token in &unit.tokens {
                println!("{}", token.describe());
            }
        }
        if emit_ast {
            println!("// ast of {}", unit.path);
            print!("{}", unit.ast.dump());
        }
        for error in unit.diagnostics.errors() {
            print_error(&unit.path, &unit.source, error);
        }
    }

    let totals = importer.stats();
    if stats {
        eprintln!(
            "compiled {} unit(s), {} line(s), {} token(s)",
            totals.units, totals.lines, totals.tokens
        );
    }

    let error_count = importer.error_count();
    if error_count > 0 {
        eprintln!(
            "error: could not compile `{}` due to {} previous error(s)",
            file.display(),
            error_count
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_file() {
        let cli = Cli::try_parse_from(["karst", "main.ka"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("main.ka"));
        assert!(!cli.emit_tokens);
        assert!(!cli.emit_ast);
    }

    #[test]
    fn test_cli_parse_debug_flags() {
        let cli = Cli::try_parse_from(["karst", "main.ka", "--emit-tokens", "--emit-ast"]).unwrap();
        assert!(cli.emit_tokens);
        assert!(cli.emit_ast);
    }

    #[test]
    fn test_cli_parse_stats() {
        let cli = Cli::try_parse_from(["karst", "main.ka", "--stats"]).unwrap();
        assert!(cli.stats);
    }

    #[test]
    fn test_cli_requires_file() {
        assert!(Cli::try_parse_from(["karst"]).is_err());
    }
}
