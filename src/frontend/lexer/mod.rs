//! Lexer for the Karst programming language
//!
//! Handles tokenization including:
//! - Keywords and identifiers (maximal-munch, keyword table lookup)
//! - Numeric literals (maximal run of digits, `.` and `_`; the parser
//!   rejects runs with more than one decimal point)
//! - String literals with `\n \r \' \t` escapes, `'` or `"` delimited
//! - Multi-character operator disambiguation (`&` vs `&&`, `:` vs `:=`,
//!   `.`/`..`/`...`, `>`/`>=`/`>>`, ...) via longest valid match
//! - Line (`//`) and bounds-checked block (`/* */`) comments
//!
//! The scanner keeps a save point marking the start of the token under
//! construction; whitespace and newlines reset it, and every emitted
//! token's span runs from the save point to the current position.

pub mod tokens;

pub use tokens::{KEYWORDS, Token, TokenKind};

use crate::frontend::ast::Span;
use crate::frontend::diagnostics::{CompileError, errors};

/// Lexer for Karst source code.
///
/// Single pass over the source text. Errors are collected rather than
/// aborting the scan, so one run reports every lexical problem in the
/// unit.
pub struct Lexer<'a> {
    /// Byte offset and char for every position, for arbitrary lookahead
    chars: Vec<(usize, char)>,
    source_len: usize,
    pos: usize,
    line: u32,
    save_offset: usize,
    save_line: u32,
    tokens: Vec<Token>,
    errors: Vec<CompileError>,
    _source: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().collect(),
            source_len: source.len(),
            pos: 0,
            line: 0,
            save_offset: 0,
            save_line: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            _source: source,
        }
    }

    /// Tokenize the entire source code.
    ///
    /// Returns the token stream (terminated by an `End` sentinel) on
    /// success, or every collected lexical error on failure.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<CompileError>> {
        while !self.is_at_end() {
            self.scan_token();
        }

        self.reset_save_point();
        self.token(TokenKind::End);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Byte offset of the current position.
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.source_len, |(o, _)| *o)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn reset_save_point(&mut self) {
        self.save_offset = self.offset();
        self.save_line = self.line;
    }

    /// Span from the save point to the current position (half-open).
    fn span(&self) -> Span {
        Span::new(self.save_offset, self.save_line, self.offset(), self.line)
    }

    fn token(&mut self, kind: TokenKind) {
        let span = self.span();
        self.tokens.push(Token::new(kind, span));
        self.reset_save_point();
    }

    fn token_with_text(&mut self, kind: TokenKind, text: String) {
        let span = self.span();
        self.tokens.push(Token::with_text(kind, text, span));
        self.reset_save_point();
    }

    fn error(&mut self, error: CompileError) {
        self.errors.push(error);
        self.reset_save_point();
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        // Whitespace is skipped and moves the save point forward
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
            self.reset_save_point();
        }

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            '\n' => {
                self.line += 1;
                self.reset_save_point();
            }
            '\r' => {
                // A CRLF pair is one line ending
                self.match_char('\n');
                self.line += 1;
                self.reset_save_point();
            }

            '#' => self.token(TokenKind::Hash),
            '@' => self.token(TokenKind::Directive),
            '+' => self.token(TokenKind::Plus),
            '-' => self.token(TokenKind::Minus),
            '*' => self.token(TokenKind::Star),
            '(' => self.token(TokenKind::LParen),
            ')' => self.token(TokenKind::RParen),
            '[' => self.token(TokenKind::LBracket),
            ']' => self.token(TokenKind::RBracket),
            '{' => self.token(TokenKind::LCurly),
            '}' => self.token(TokenKind::RCurly),
            ';' => self.token(TokenKind::SemiColon),
            '^' => self.token(TokenKind::Pointer),
            ',' => self.token(TokenKind::Comma),

            '&' => self.decide('&', TokenKind::BAnd, TokenKind::LAnd),
            '|' => self.decide('|', TokenKind::BOr, TokenKind::LOr),
            '!' => self.decide('=', TokenKind::Bang, TokenKind::Neq),
            '=' => self.decide('=', TokenKind::Assign, TokenKind::Equals),
            ':' => self.decide('=', TokenKind::Colon, TokenKind::QuickAssign),

            '.' => {
                if self.match_char('.') {
                    if self.match_char('.') {
                        self.token(TokenKind::TripleDot);
                    } else {
                        self.token(TokenKind::DoubleDot);
                    }
                } else {
                    self.token(TokenKind::Dot);
                }
            }
            '>' => self.decide_angle(TokenKind::Greater, TokenKind::Geq, TokenKind::RShift, '>'),
            '<' => self.decide_angle(TokenKind::Less, TokenKind::Leq, TokenKind::LShift, '<'),

            '/' => self.scan_comment_or_div(),

            '"' | '\'' => self.scan_string(c),

            '0'..='9' => self.scan_number(c),

            _ if is_ident_start(c) => self.scan_word(c),

            _ => {
                let span = self.span();
                self.error(errors::unexpected_character(c, span));
            }
        }
    }

    // ========================================================================
    // Operator disambiguation
    // ========================================================================

    /// Longest-match rule for two-way operators: emit `compound` when the
    /// next character is `second`, else `simple`.
    fn decide(&mut self, second: char, simple: TokenKind, compound: TokenKind) {
        if self.match_char(second) {
            self.token(compound);
        } else {
            self.token(simple);
        }
    }

    /// `>`/`<` family: bare comparison, `=` suffix, or doubled shift.
    fn decide_angle(
        &mut self,
        simple: TokenKind,
        with_eq: TokenKind,
        doubled_kind: TokenKind,
        doubled: char,
    ) {
        if self.match_char('=') {
            self.token(with_eq);
        } else if self.match_char(doubled) {
            self.token(doubled_kind);
        } else {
            self.token(simple);
        }
    }

    // ========================================================================
    // Compound token scanners
    // ========================================================================

    fn scan_word(&mut self, first: char) {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match KEYWORDS.get(name.as_str()) {
            Some(kind) => self.token(kind.clone()),
            None => self.token_with_text(TokenKind::Identifier(name.clone()), name),
        }
    }

    /// Maximal run of digits, `.` and `_`. Runs with multiple decimal
    /// points are accepted here and rejected by the parser.
    fn scan_number(&mut self, first: char) {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.token_with_text(TokenKind::Number(text.clone()), text);
    }

    /// Strings open and close with the same delimiter (`'` or `"`).
    /// The closing delimiter is consumed and not included in the literal.
    fn scan_string(&mut self, delimiter: char) {
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span();
                    self.error(errors::unterminated_string(span));
                    return;
                }
                Some(c) if c == delimiter => break,
                Some('\n') => {
                    self.line += 1;
                    text.push('\n');
                    self.advance();
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some('r') => text.push('\r'),
                        Some('t') => text.push('\t'),
                        Some('\'') => text.push('\''),
                        Some('"') => text.push('"'),
                        Some(other) => text.push(other),
                        None => {
                            let span = self.span();
                            self.error(errors::unterminated_string(span));
                            return;
                        }
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        // Consume past the delimiter
        self.advance();
        self.token_with_text(TokenKind::StringLit(text.clone()), text);
    }

    /// `//` to end of line, `/* */` with a bounds-checked terminator
    /// scan, otherwise a division operator.
    fn scan_comment_or_div(&mut self) {
        if self.match_char('/') {
            while let Some(c) = self.peek() {
                if c == '\n' || c == '\r' {
                    break;
                }
                self.advance();
            }
            self.reset_save_point();
        } else if self.match_char('*') {
            // Scan for a literal `*/`; hitting end-of-input first is a
            // lex error, never an infinite loop.
            loop {
                if self.is_at_end() {
                    let span = self.span();
                    self.error(errors::unterminated_block_comment(span));
                    return;
                }
                if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                    self.advance();
                    self.advance();
                    break;
                }
                if self.peek() == Some('\n') {
                    self.line += 1;
                }
                self.advance();
            }
            self.reset_save_point();
        } else {
            self.token(TokenKind::Div);
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operator_disambiguation() {
        assert_eq!(kinds("&"), vec![TokenKind::BAnd, TokenKind::End]);
        assert_eq!(kinds("&&"), vec![TokenKind::LAnd, TokenKind::End]);
        assert_eq!(kinds("!="), vec![TokenKind::Neq, TokenKind::End]);
        assert_eq!(kinds("!"), vec![TokenKind::Bang, TokenKind::End]);
        assert_eq!(kinds("|"), vec![TokenKind::BOr, TokenKind::End]);
        assert_eq!(kinds("||"), vec![TokenKind::LOr, TokenKind::End]);
        assert_eq!(kinds("="), vec![TokenKind::Assign, TokenKind::End]);
        assert_eq!(kinds("=="), vec![TokenKind::Equals, TokenKind::End]);
        assert_eq!(kinds(":"), vec![TokenKind::Colon, TokenKind::End]);
        assert_eq!(kinds(":="), vec![TokenKind::QuickAssign, TokenKind::End]);
    }

    #[test]
    fn test_dot_and_angle_families() {
        assert_eq!(kinds("."), vec![TokenKind::Dot, TokenKind::End]);
        assert_eq!(kinds(".."), vec![TokenKind::DoubleDot, TokenKind::End]);
        assert_eq!(kinds("..."), vec![TokenKind::TripleDot, TokenKind::End]);
        assert_eq!(kinds(">"), vec![TokenKind::Greater, TokenKind::End]);
        assert_eq!(kinds(">="), vec![TokenKind::Geq, TokenKind::End]);
        assert_eq!(kinds(">>"), vec![TokenKind::RShift, TokenKind::End]);
        assert_eq!(kinds("<"), vec![TokenKind::Less, TokenKind::End]);
        assert_eq!(kinds("<="), vec![TokenKind::Leq, TokenKind::End]);
        assert_eq!(kinds("<<"), vec![TokenKind::LShift, TokenKind::End]);
    }

    #[test]
    fn test_keywords_and_identifier_fallback() {
        assert_eq!(kinds("ret"), vec![TokenKind::Ret, TokenKind::End]);
        assert_eq!(kinds("interface"), vec![TokenKind::Interface, TokenKind::End]);
        // A keyword followed by an identifier-continuation character is
        // a plain identifier with the full scanned text.
        assert_eq!(
            kinds("retx"),
            vec![TokenKind::Identifier("retx".to_string()), TokenKind::End]
        );
        assert_eq!(
            kinds("if_"),
            vec![TokenKind::Identifier("if_".to_string()), TokenKind::End]
        );
    }

    #[test]
    fn test_word_operators() {
        assert_eq!(kinds("and"), vec![TokenKind::LAnd, TokenKind::End]);
        assert_eq!(kinds("or"), vec![TokenKind::LOr, TokenKind::End]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1_000"),
            vec![TokenKind::Number("1_000".to_string()), TokenKind::End]
        );
        assert_eq!(
            kinds("3.5"),
            vec![TokenKind::Number("3.5".to_string()), TokenKind::End]
        );
        // Multiple decimal points are accepted lexically; the parser
        // rejects them.
        assert_eq!(
            kinds("1.2.3"),
            vec![TokenKind::Number("1.2.3".to_string()), TokenKind::End]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#""hello""#),
            vec![TokenKind::StringLit("hello".to_string()), TokenKind::End]
        );
        assert_eq!(
            kinds("'world'"),
            vec![TokenKind::StringLit("world".to_string()), TokenKind::End]
        );
        assert_eq!(
            kinds(r#""a\nb\tc""#),
            vec![TokenKind::StringLit("a\nb\tc".to_string()), TokenKind::End]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let errors = lex("\"abc").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unterminated string"));
    }

    #[test]
    fn test_comments() {
        assert_eq!(kinds("// comment\nx"), vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::End
        ]);
        assert_eq!(kinds("/* block */ x"), vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::End
        ]);
        assert_eq!(kinds("1 / 2"), vec![
            TokenKind::Number("1".to_string()),
            TokenKind::Div,
            TokenKind::Number("2".to_string()),
            TokenKind::End
        ]);
    }

    #[test]
    fn test_unterminated_block_comment_is_error() {
        // Must terminate with an error, not loop forever
        let errors = lex("/* never closed").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unterminated block comment"));

        // A `*` right before end-of-input must not read past the end
        let errors = lex("/* almost *").unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_line_tracking() {
        let tokens = lex("a\nb").unwrap();
        assert_eq!(tokens[0].span.start_line, 0);
        assert_eq!(tokens[1].span.start_line, 1);
    }

    #[test]
    fn test_crlf_counts_as_one_line() {
        let tokens = lex("a\r\nb\r\nc").unwrap();
        assert_eq!(tokens[0].span.start_line, 0);
        assert_eq!(tokens[1].span.start_line, 1);
        assert_eq!(tokens[2].span.start_line, 2);
    }

    #[test]
    fn test_bare_carriage_return_counts_as_one_line() {
        let tokens = lex("a\rb").unwrap();
        assert_eq!(tokens[1].span.start_line, 1);
    }

    #[test]
    fn test_spans_are_half_open_offsets() {
        let tokens = lex("ab cd").unwrap();
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, 2);
        assert_eq!(tokens[1].span.start, 3);
        assert_eq!(tokens[1].span.end, 5);
    }

    #[test]
    fn test_define_statement_stream() {
        assert_eq!(kinds("x : u8 = 2"), vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Colon,
            TokenKind::U8,
            TokenKind::Assign,
            TokenKind::Number("2".to_string()),
            TokenKind::End
        ]);
    }
}
