//! Symbol table and scope management for Karst
//!
//! Scopes are numbered levels: 0 is the global scope and each nested
//! block increments the level. Lookup walks from the current level down
//! to 0 and returns the innermost match, so an inner `x` shadows an
//! outer one; duplicate detection only consults the current level, so
//! shadowing across levels is allowed while redefinition within a level
//! is not.

use std::collections::HashMap;

use crate::frontend::types::Type;

/// An entry in the symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub ty: Type,
    pub is_global: bool,
    pub is_constant: bool,
}

impl SymbolEntry {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            is_global: false,
            is_constant: false,
        }
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }
}

/// Scope-level-indexed symbol table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// One identifier map per scope level; index = level.
    levels: Vec<HashMap<String, SymbolEntry>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            levels: vec![HashMap::new()],
        }
    }

    /// Current scope level (0 = global).
    pub fn level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Enter a new scope, incrementing the level.
    pub fn enter_scope(&mut self) {
        self.levels.push(HashMap::new());
    }

    /// Exit the current scope.
    ///
    /// Clears every entry recorded at the level being left before
    /// decrementing, so re-entering a sibling block at the same level
    /// starts from a clean map. The global level is never popped.
    pub fn exit_scope(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
    }

    /// Insert a symbol at the current level, replacing any previous
    /// entry with the same name at that level.
    pub fn add_symbol(&mut self, name: impl Into<String>, entry: SymbolEntry) {
        let level = self.level();
        self.levels[level].insert(name.into(), entry);
    }

    /// Look up a symbol from the current level down to the global
    /// level, returning the innermost match.
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.levels.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Check only the current level, for duplicate-definition detection.
    pub fn defined_at_current_level(&self, name: &str) -> bool {
        self.levels[self.level()].contains_key(name)
    }

    /// All symbols at the global level, for hand-off to the backend.
    pub fn globals(&self) -> impl Iterator<Item = (&String, &SymbolEntry)> {
        self.levels[0].iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::{Type, TypeKind};

    #[test]
    fn test_lookup_finds_innermost_match() {
        let mut table = SymbolTable::new();
        table.add_symbol("x", SymbolEntry::new(Type::new(TypeKind::S32)));
        table.enter_scope();
        table.add_symbol("x", SymbolEntry::new(Type::new(TypeKind::U8)));

        let entry = table.lookup("x").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::U8));

        table.exit_scope();
        let entry = table.lookup("x").unwrap();
        assert!(matches!(entry.ty.kind, TypeKind::S32));
    }

    #[test]
    fn test_duplicate_check_is_per_level() {
        let mut table = SymbolTable::new();
        table.add_symbol("x", SymbolEntry::new(Type::new(TypeKind::S32)));
        assert!(table.defined_at_current_level("x"));

        table.enter_scope();
        // Shadowing across levels is fine
        assert!(!table.defined_at_current_level("x"));
        assert!(table.contains("x"));
    }

    #[test]
    fn test_exit_scope_clears_abandoned_level() {
        let mut table = SymbolTable::new();

        // First sibling block defines x at level 1
        table.enter_scope();
        table.add_symbol("x", SymbolEntry::new(Type::new(TypeKind::S32)));
        table.exit_scope();

        // Second sibling block at the same level must not see it
        table.enter_scope();
        assert!(!table.defined_at_current_level("x"));
        assert!(!table.contains("x"));
        table.exit_scope();
    }

    #[test]
    fn test_global_level_is_never_popped() {
        let mut table = SymbolTable::new();
        table.add_symbol("g", SymbolEntry::new(Type::new(TypeKind::S32)).global());
        table.exit_scope();
        assert_eq!(table.level(), 0);
        assert!(table.contains("g"));
        assert_eq!(table.globals().count(), 1);
    }
}
