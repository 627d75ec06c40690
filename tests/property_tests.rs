//! Property-based tests for the Karst compiler
//!
//! These use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might
//! miss.

use karst::lexer::lex;
use karst::lexer::tokens::{TokenKind, KEYWORDS};
use karst::parser::parse;
use proptest::prelude::*;

proptest! {
    /// The lexer accepts arbitrary input without panicking, and any
    /// successful run ends in the end-of-input sentinel.
    #[test]
    fn lexer_total_over_arbitrary_input(source in ".*") {
        if let Ok(tokens) = lex(&source) {
            prop_assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::End)));
        }
    }

    /// Token spans are half-open, in bounds, and non-decreasing.
    #[test]
    fn token_spans_are_ordered_and_in_bounds(source in "[ -~\n]*") {
        if let Ok(tokens) = lex(&source) {
            let mut previous_end = 0;
            for token in &tokens {
                prop_assert!(token.span.start <= token.span.end);
                prop_assert!(token.span.end <= source.len());
                prop_assert!(token.span.start >= previous_end || matches!(token.kind, TokenKind::End));
                previous_end = token.span.end;
            }
        }
    }

    /// Any non-keyword identifier lexes to exactly [Identifier, End]
    /// with its text preserved.
    #[test]
    fn identifiers_roundtrip(name in "[a-zA-Z_][a-zA-Z0-9_]{0,20}") {
        prop_assume!(!KEYWORDS.contains_key(name.as_str()));
        let tokens = lex(&name).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        match &tokens[0].kind {
            TokenKind::Identifier(text) => prop_assert_eq!(text, &name),
            other => prop_assert!(false, "expected identifier, got {:?}", other),
        }
    }

    /// Digit runs lex to exactly [Number, End] with the text preserved.
    #[test]
    fn numbers_roundtrip(digits in "[0-9]{1,18}") {
        let tokens = lex(&digits).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        match &tokens[0].kind {
            TokenKind::Number(text) => prop_assert_eq!(text, &digits),
            other => prop_assert!(false, "expected number, got {:?}", other),
        }
    }

    /// The parser terminates on any token stream the lexer accepts and
    /// never panics; errors surface as data.
    #[test]
    fn parser_total_over_lexable_input(source in "[ -~\n]{0,200}") {
        if let Ok(tokens) = lex(&source) {
            let (_program, _errors) = parse(tokens);
        }
    }

    /// Well-formed define statements always compile clean end to end.
    #[test]
    fn simple_defines_always_check(value in 0u32..1_000_000, name in "[a-z][a-z0-9_]{0,8}") {
        prop_assume!(!KEYWORDS.contains_key(name.as_str()));
        let source = format!("{name} := {value};\n");
        let tokens = lex(&source).unwrap();
        let (program, parse_errors) = parse(tokens);
        prop_assert!(parse_errors.is_empty());
        let (symbols, type_errors) = karst::typechecker::check(&program);
        prop_assert!(type_errors.is_empty());
        prop_assert!(symbols.lookup(&name).is_some());
    }
}
