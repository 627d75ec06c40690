//! Token types for the Karst lexer

use crate::frontend::ast::Span;
use phf::phf_map;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Token types for Karst
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keywords ==========
    As,        // cast operator
    Break,     // break out of a loop
    Char,      // char type
    Continue,  // continue to the next loop iteration
    Defer,     // reserved
    Else,      // if-else branch
    F32,       // 32-bit float type
    F64,       // 64-bit float type
    For,       // loop statement
    False,     // false literal
    Fn,        // fn type
    If,        // if statement
    Interface, // interface literal/type
    In,        // reserved (loop headers)
    Include,   // include directive keyword
    Import,    // reserved
    Module,    // reserved
    Ret,       // return statement
    Run,       // run directive keyword
    S8,        // signed 8-bit type
    S32,       // signed 32-bit type
    S64,       // signed 64-bit type
    String,    // string type
    True,      // true literal
    Type,      // type-of-type keyword
    Typeof,    // reserved
    U8,        // unsigned 8-bit type
    U16,       // unsigned 16-bit type
    U32,       // unsigned 32-bit type
    U64,       // unsigned 64-bit type
    Use,       // reserved
    Xor,       // reserved logical xor

    // ========== Identifiers and Literals ==========
    Identifier(String),
    /// Raw numeric text; digits, `.` and `_` (validated by the parser)
    Number(String),
    StringLit(String),

    // ========== Operators ==========
    Hash,        // #
    Directive,   // @
    Plus,        // +
    Minus,       // -
    Star,        // *
    Div,         // /
    Pointer,     // ^
    SemiColon,   // ;
    Comma,       // ,
    BAnd,        // &
    LAnd,        // && (also the `and` keyword)
    BOr,         // |
    LOr,         // || (also the `or` keyword)
    Bang,        // !
    Neq,         // !=
    Assign,      // =
    Equals,      // ==
    Colon,       // :
    QuickAssign, // :=
    Dot,         // .
    DoubleDot,   // ..
    TripleDot,   // ...
    Greater,     // >
    Geq,         // >=
    RShift,      // >>
    Less,        // <
    Leq,         // <=
    LShift,      // <<

    // ========== Brackets ==========
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LCurly,   // {
    RCurly,   // }

    // ========== Special ==========
    End, // end-of-input sentinel
}

/// Keyword lookup table using a perfect hash map for O(1) lookup.
///
/// Maps source text to `TokenKind` variants. When the lexer scans a
/// maximal identifier run, it checks this map to decide keyword vs plain
/// identifier; because the run is maximal, a keyword followed by an
/// identifier-continuation character (e.g. `iff`) never matches.
///
/// `and`/`or` map onto the same kinds as `&&`/`||` so the parser only
/// ever sees one logical-operator spelling.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "as" => TokenKind::As,
    "and" => TokenKind::LAnd,
    "break" => TokenKind::Break,
    "char" => TokenKind::Char,
    "continue" => TokenKind::Continue,
    "defer" => TokenKind::Defer,
    "else" => TokenKind::Else,
    "f32" => TokenKind::F32,
    "f64" => TokenKind::F64,
    "for" => TokenKind::For,
    "false" => TokenKind::False,
    "fn" => TokenKind::Fn,
    "if" => TokenKind::If,
    "interface" => TokenKind::Interface,
    "in" => TokenKind::In,
    "include" => TokenKind::Include,
    "import" => TokenKind::Import,
    "module" => TokenKind::Module,
    "or" => TokenKind::LOr,
    "ret" => TokenKind::Ret,
    "run" => TokenKind::Run,
    "s8" => TokenKind::S8,
    "s32" => TokenKind::S32,
    "s64" => TokenKind::S64,
    "string" => TokenKind::String,
    "true" => TokenKind::True,
    "type" => TokenKind::Type,
    "typeof" => TokenKind::Typeof,
    "u8" => TokenKind::U8,
    "u16" => TokenKind::U16,
    "u32" => TokenKind::U32,
    "u64" => TokenKind::U64,
    "use" => TokenKind::Use,
    "xor" => TokenKind::Xor,
};

/// A token: kind, literal text, and source span.
///
/// `text` is populated for identifiers, numbers, and string literals;
/// operator and keyword tokens leave it empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            text: String::new(),
            span,
        }
    }

    pub fn with_text(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Short display name used in diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Identifier(name) => format!("identifier '{name}'"),
            TokenKind::Number(text) => format!("number '{text}'"),
            TokenKind::StringLit(_) => "string literal".to_string(),
            TokenKind::End => "end of input".to_string(),
            kind => format!("{kind:?}"),
        }
    }
}
