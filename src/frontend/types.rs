//! Type model for the Karst language.
//!
//! Types are structural, not nominal: two interfaces match because their
//! member types match, never because they share a name. A [`Type`] is a
//! closed [`TypeKind`] plus a set of orthogonal modifiers (constness,
//! pointer indirection, array-ness, and so on) that combine with any kind.
//!
//! Matching comes in two strengths:
//! - [`Type::matches_basic`] — top-level kind equality only, used for
//!   quick compatibility checks such as literal-vs-declared-type.
//! - [`Type::matches_deep`] — kind-specific structural comparison with a
//!   [`MatchMode`] selecting loose or exact interface matching.

use std::fmt;

/// Top-level type kind. Compound kinds own their signatures; a
/// signature's member/operand list is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeKind {
    #[default]
    Unknown,
    /// The type of a type expression (e.g. the right side of `t : type`)
    TypeOfType,
    /// A module/namespace reference
    Namespace,
    /// Unit/void
    U0,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    F32,
    F64,
    Char,
    String,
    Fn(FnSig),
    Interface(InterfaceSig),
    Pattern(PatternSig),
}

/// Function signature: operation types with slot 0 holding the return
/// type, plus a flag recording whether a return type was written at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FnSig {
    pub op_types: Vec<Type>,
    pub has_return: bool,
}

/// The signature of an interface is the ordered list of its member types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceSig {
    /// Interfaces are first class but still carry an identifier
    /// (anonymous ones get a generated name).
    pub name: String,
    pub members: Vec<Type>,
}

/// An ordered tuple of component types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternSig {
    pub types: Vec<Type>,
}

/// A type: kind plus orthogonal modifiers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Type {
    pub kind: TypeKind,
    /// Reserved for parametric definitions; no surface syntax sets it
    /// yet, so it only ever comes in through constructed types.
    pub is_generic: bool,
    pub is_constant: bool,
    /// Pointer indirection count (`^^u8` has indirection 2)
    pub indirection: u8,
    pub is_array: bool,
    /// Fixed length for `T[n]`; 0 for the unknown-length `T[]` form
    pub array_length: usize,
    pub is_pattern: bool,
}

/// Strength of a structural interface match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every left member must be satisfied somewhere on the right,
    /// order-independent. One right member may satisfy several left
    /// members.
    Loose,
    /// Identical member count and pairwise positional match.
    Exact,
}

/// Numeric category for naive casting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericCategory {
    Integer,
    Float,
    NonNumeric,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn unknown() -> Self {
        Self::new(TypeKind::Unknown)
    }

    /// The default type of an unlabelled integer literal.
    pub fn int_literal() -> Self {
        Self::new(TypeKind::S32)
    }

    /// The default type of an unlabelled float literal.
    pub fn float_literal() -> Self {
        Self::new(TypeKind::F64)
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    /// A tuple of component types, flagged as a pattern.
    pub fn pattern(types: Vec<Type>) -> Self {
        let mut ty = Self::new(TypeKind::Pattern(PatternSig { types }));
        ty.is_pattern = true;
        ty
    }

    /// Top-level kind equality, ignoring member/operand lists and
    /// modifiers.
    pub fn matches_basic(&self, other: &Type) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(&other.kind)
    }

    /// Kind-specific structural match.
    pub fn matches_deep(&self, other: &Type, mode: MatchMode) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Interface(lhs), TypeKind::Interface(rhs)) => match mode {
                MatchMode::Loose => lhs
                    .members
                    .iter()
                    .all(|m| rhs.members.iter().any(|r| m.matches_deep(r, mode))),
                MatchMode::Exact => {
                    lhs.members.len() == rhs.members.len()
                        && lhs
                            .members
                            .iter()
                            .zip(rhs.members.iter())
                            .all(|(a, b)| a.matches_deep(b, mode))
                }
            },
            // Slot 0 is the return type; arity and position both matter.
            (TypeKind::Fn(lhs), TypeKind::Fn(rhs)) => {
                lhs.op_types.len() == rhs.op_types.len()
                    && lhs
                        .op_types
                        .iter()
                        .zip(rhs.op_types.iter())
                        .all(|(a, b)| a.matches_deep(b, mode))
            }
            (TypeKind::Pattern(lhs), TypeKind::Pattern(rhs)) => {
                lhs.types.len() == rhs.types.len()
                    && lhs
                        .types
                        .iter()
                        .zip(rhs.types.iter())
                        .all(|(a, b)| a.matches_deep(b, mode))
            }
            _ => self.matches_basic(other),
        }
    }

    pub fn numeric_category(&self) -> NumericCategory {
        match self.kind {
            TypeKind::U8
            | TypeKind::S8
            | TypeKind::U16
            | TypeKind::S16
            | TypeKind::U32
            | TypeKind::S32
            | TypeKind::U64
            | TypeKind::S64 => NumericCategory::Integer,
            TypeKind::F32 | TypeKind::F64 => NumericCategory::Float,
            _ => NumericCategory::NonNumeric,
        }
    }

    /// Implicit conversion of an unlabelled literal's default type to a
    /// declared numeric target.
    ///
    /// Succeeds only within a numeric category (integer to integer,
    /// float to float); anything cross-category is a type error at the
    /// definition site and returns `None`.
    pub fn naive_cast(&self, target: &Type) -> Option<Type> {
        let from = self.numeric_category();
        let to = target.numeric_category();
        if from == NumericCategory::NonNumeric || from != to {
            return None;
        }
        let mut casted = target.clone();
        casted.is_constant = self.is_constant;
        Some(casted)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.indirection {
            write!(f, "^")?;
        }
        match &self.kind {
            TypeKind::Unknown => write!(f, "unknown")?,
            TypeKind::TypeOfType => write!(f, "type")?,
            TypeKind::Namespace => write!(f, "namespace")?,
            TypeKind::U0 => write!(f, "u0")?,
            TypeKind::U8 => write!(f, "u8")?,
            TypeKind::S8 => write!(f, "s8")?,
            TypeKind::U16 => write!(f, "u16")?,
            TypeKind::S16 => write!(f, "s16")?,
            TypeKind::U32 => write!(f, "u32")?,
            TypeKind::S32 => write!(f, "s32")?,
            TypeKind::U64 => write!(f, "u64")?,
            TypeKind::S64 => write!(f, "s64")?,
            TypeKind::F32 => write!(f, "f32")?,
            TypeKind::F64 => write!(f, "f64")?,
            TypeKind::Char => write!(f, "char")?,
            TypeKind::String => write!(f, "string")?,
            TypeKind::Fn(sig) => {
                write!(f, "fn(")?;
                for (i, op) in sig.op_types.iter().enumerate().skip(1) {
                    if i > 1 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{op}")?;
                }
                write!(f, ")")?;
                if sig.has_return {
                    if let Some(ret) = sig.op_types.first() {
                        write!(f, " {ret}")?;
                    }
                }
            }
            TypeKind::Interface(sig) => {
                write!(f, "interface {}", sig.name)?;
            }
            TypeKind::Pattern(sig) => {
                write!(f, "(")?;
                for (i, t) in sig.types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")?;
            }
        }
        if self.is_array {
            if self.array_length > 0 {
                write!(f, "[{}]", self.array_length)?;
            } else {
                write!(f, "[]")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Values
// ============================================================================

/// A literal's value: the textual representation from the source,
/// converted on demand to the target primitive representation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value {
    text: String,
}

impl Value {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Integer representation, ignoring `_` digit separators.
    pub fn as_u64(&self) -> Option<u64> {
        self.text.replace('_', "").parse().ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.text.replace('_', "").parse().ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.text.replace('_', "").parse().ok()
    }

    /// Number of decimal points in the raw text. The lexer accepts
    /// runs like `1.2.3`; the parser rejects anything with more than one.
    pub fn decimal_points(&self) -> usize {
        self.text.matches('.').count()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn interface(members: Vec<Type>) -> Type {
        Type::new(TypeKind::Interface(InterfaceSig {
            name: "anon".to_string(),
            members,
        }))
    }

    #[test]
    fn test_basic_match_ignores_signatures() {
        let a = interface(vec![Type::new(TypeKind::S32)]);
        let b = interface(vec![Type::new(TypeKind::String), Type::new(TypeKind::U8)]);
        assert!(a.matches_basic(&b));
        assert!(!a.matches_basic(&Type::new(TypeKind::S32)));
    }

    #[test]
    fn test_exact_interface_match_is_positional() {
        let a = interface(vec![Type::new(TypeKind::S32), Type::new(TypeKind::String)]);
        let b = interface(vec![Type::new(TypeKind::S32), Type::new(TypeKind::String)]);
        let c = interface(vec![Type::new(TypeKind::String), Type::new(TypeKind::S32)]);
        assert!(a.matches_deep(&b, MatchMode::Exact));
        assert!(!a.matches_deep(&c, MatchMode::Exact));
        // Loose mode is order-independent
        assert!(a.matches_deep(&c, MatchMode::Loose));
    }

    #[test]
    fn loose_interface_match_reuses_member() {
        // Two s32 requirements on the left, a single s32 on the right:
        // loose matching treats the right as satisfying both.
        let a = interface(vec![Type::new(TypeKind::S32), Type::new(TypeKind::S32)]);
        let b = interface(vec![Type::new(TypeKind::S32)]);
        assert!(a.matches_deep(&b, MatchMode::Loose));
        assert!(!a.matches_deep(&b, MatchMode::Exact));
    }

    #[test]
    fn test_fn_match_includes_return_slot() {
        let f1 = Type::new(TypeKind::Fn(FnSig {
            op_types: vec![Type::new(TypeKind::S32), Type::new(TypeKind::U8)],
            has_return: true,
        }));
        let f2 = Type::new(TypeKind::Fn(FnSig {
            op_types: vec![Type::new(TypeKind::S32), Type::new(TypeKind::U8)],
            has_return: true,
        }));
        let f3 = Type::new(TypeKind::Fn(FnSig {
            op_types: vec![Type::new(TypeKind::U0), Type::new(TypeKind::U8)],
            has_return: false,
        }));
        assert!(f1.matches_deep(&f2, MatchMode::Exact));
        assert!(!f1.matches_deep(&f3, MatchMode::Exact));
    }

    #[test]
    fn test_naive_cast_within_integer_category() {
        let lit = Type::int_literal();
        let target = Type::new(TypeKind::U8);
        let casted = lit.naive_cast(&target).unwrap();
        assert!(matches!(casted.kind, TypeKind::U8));
    }

    #[test]
    fn test_naive_cast_rejects_cross_category() {
        let lit = Type::int_literal();
        assert!(lit.naive_cast(&Type::new(TypeKind::String)).is_none());
        assert!(lit.naive_cast(&Type::new(TypeKind::F32)).is_none());
        let float_lit = Type::float_literal();
        assert!(float_lit.naive_cast(&Type::new(TypeKind::S32)).is_none());
        assert!(float_lit.naive_cast(&Type::new(TypeKind::F32)).is_some());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::new("1_000").as_u64(), Some(1000));
        assert_eq!(Value::new("3.5").as_f64(), Some(3.5));
        assert_eq!(Value::new("1.2.3").decimal_points(), 2);
    }
}
