//! Diagnostics and error reporting for Karst
//!
//! All compiler failures are represented as data: a [`CompileError`] with
//! a kind, a span, and optional notes/hints, collected per compilation
//! unit in a [`Diagnostics`] record. The core never formats terminal
//! output on its own behalf; rendering lives in [`print_error`] /
//! [`format_error`] and is only invoked by the CLI layer.

use crate::frontend::ast::Span;

/// A compile-time error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn lex(message: String, span: Span) -> Self {
        Self::new(ErrorKind::Lex, message, span)
    }

    pub fn parse(message: String, span: Span) -> Self {
        Self::new(ErrorKind::Parse, message, span)
    }

    pub fn definition(message: String, span: Span) -> Self {
        Self::new(ErrorKind::Definition, message, span)
    }

    pub fn import(message: String, span: Span) -> Self {
        Self::new(ErrorKind::Import, message, span)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Kind of compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated string/comment, bad character
    Lex,
    /// Unexpected token, missing delimiter/type/bracket
    Parse,
    /// Duplicate symbol in scope, initializer type mismatch
    Definition,
    /// Cyclic dependency, unreadable/invalid include path
    Import,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lex => write!(f, "lex error"),
            ErrorKind::Parse => write!(f, "parse error"),
            ErrorKind::Definition => write!(f, "definition error"),
            ErrorKind::Import => write!(f, "import error"),
        }
    }
}

/// Ordered per-unit diagnostic record.
///
/// The backend must not run while `error_count()` is non-zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = CompileError>) {
        self.errors.extend(errors);
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Print an error with source context to stderr.
pub fn print_error(file_name: &str, source: &str, error: &CompileError) {
    eprint!("{}", render_error(file_name, source, error, true));
}

/// Format an error with source context as a plain string (no colors).
pub fn format_error(file_name: &str, source: &str, error: &CompileError) -> String {
    render_error(file_name, source, error, false)
}

fn render_error(file_name: &str, source: &str, error: &CompileError, color: bool) -> String {
    let (line_num, col_num, line_text) = get_line_info(source, error.span.start);

    let (red, cyan, bold, reset) = if color {
        ("\x1b[31m", "\x1b[36m", "\x1b[1m", "\x1b[0m")
    } else {
        ("", "", "", "")
    };

    let mut out = String::new();

    out.push_str(&format!(
        "{bold}{red}{kind}{reset}{bold}: {message}{reset}\n",
        kind = error.kind,
        message = error.message,
    ));
    out.push_str(&format!(
        "  {cyan}-->{reset} {file_name}:{line_num}:{col_num}\n"
    ));

    let width = line_num.to_string().len();
    out.push_str(&format!("  {cyan}{:>width$} |{reset}\n", ""));
    out.push_str(&format!("  {cyan}{line_num:>width$} |{reset} {line_text}\n"));

    // Caret underline covering the span, clamped to the excerpt line
    let underline_len = error
        .span
        .end
        .saturating_sub(error.span.start)
        .clamp(1, line_text.len().saturating_sub(col_num - 1).max(1));
    out.push_str(&format!(
        "  {cyan}{:>width$} |{reset} {}{red}{}{reset}\n",
        "",
        " ".repeat(col_num - 1),
        "^".repeat(underline_len),
    ));

    for note in &error.notes {
        out.push_str(&format!("  {cyan}= note:{reset} {note}\n"));
    }
    for hint in &error.hints {
        out.push_str(&format!("  {cyan}= hint:{reset} {hint}\n"));
    }
    out.push('\n');
    out
}

/// Get line number, column number, and line text for a byte offset
fn get_line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    let line_text = &source[line_start..line_end];
    let col_num = offset - line_start + 1;

    (line_num, col_num, line_text)
}

// ============================================================================
// Error catalog: common errors with consistent wording
// ============================================================================

pub mod errors {
    use super::*;

    pub fn unterminated_block_comment(span: Span) -> CompileError {
        CompileError::lex("Unterminated block comment".to_string(), span)
            .with_hint("Close the comment with */")
    }

    pub fn unterminated_string(span: Span) -> CompileError {
        CompileError::lex("Unterminated string literal".to_string(), span)
    }

    pub fn unexpected_character(c: char, span: Span) -> CompileError {
        CompileError::lex(format!("Unexpected character '{c}'"), span)
    }

    pub fn unexpected_token(found: &str, span: Span) -> CompileError {
        CompileError::parse(format!("Unexpected token: {found}"), span)
    }

    pub fn expected_token(expected: &str, found: &str, span: Span) -> CompileError {
        CompileError::parse(format!("Expected {expected}, found {found}"), span)
    }

    pub fn missing_delimiter(span: Span) -> CompileError {
        CompileError::parse("Expected ';' after statement".to_string(), span)
            .with_hint("Separate statements with ';'")
    }

    pub fn malformed_number(text: &str, span: Span) -> CompileError {
        CompileError::parse(format!("Malformed number literal '{text}'"), span)
            .with_note("A number may contain at most one decimal point")
    }

    pub fn lambda_without_body(span: Span) -> CompileError {
        CompileError::parse("Function literal used as a value requires a body".to_string(), span)
            .with_hint("Only a constant definition may declare a bodyless function")
    }

    pub fn duplicate_symbol(name: &str, span: Span) -> CompileError {
        CompileError::definition(format!("Symbol '{name}' already defined in this scope"), span)
    }

    pub fn unknown_symbol(name: &str, span: Span) -> CompileError {
        CompileError::definition(format!("Unknown symbol '{name}'"), span)
            .with_hint("Did you forget to define or include it?")
    }

    pub fn type_mismatch(expected: &str, found: &str, span: Span) -> CompileError {
        CompileError::definition(
            format!("Type mismatch: expected '{expected}', found '{found}'"),
            span,
        )
    }

    pub fn cyclic_include(from: &str, target: &str, span: Span) -> CompileError {
        CompileError::import(
            format!("Cyclic dependency: '{target}' already depends on '{from}'"),
            span,
        )
        .with_note("A file may not transitively include itself")
    }

    pub fn unreadable_include(path: &str, cause: &str, span: Span) -> CompileError {
        CompileError::import(format!("Cannot include '{path}': {cause}"), span)
    }

    pub fn invalid_include_path(span: Span) -> CompileError {
        CompileError::import("#include requires a string literal path".to_string(), span)
    }
}
