//! Scoped symbol table.
//!
//! An ordered stack of maps from [`Symbol`] to [`SymbolRecord`]. The bottom of
//! the stack is the global scope, populated exclusively by the annotation
//! resolver; `for` and `for each` push a fresh scope at entry and pop it at
//! `done`. There is no shadowing: a name that resolves anywhere on the stack
//! may not be rebound, in any scope, in any class.

use std::collections::HashMap;

use ccl_base::Symbol;

use crate::symbol::SymbolRecord;

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<Symbol, SymbolRecord>>,
}

impl ScopeStack {
    /// A fresh stack holding only the (empty) global scope.
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "attempted to pop the global scope");
        self.scopes.pop();
    }

    /// Looks up `name`, walking from the innermost scope outward.
    pub fn lookup(&self, name: Symbol) -> Option<&SymbolRecord> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        self.lookup(name).is_some()
    }

    /// Binds `record` in the innermost scope without checking for collisions.
    /// Callers must check [`Self::is_defined`] first — the diagnostic wording
    /// for a collision depends on the calling context, so this type does not
    /// own it.
    pub fn bind(&mut self, record: SymbolRecord) {
        let name = record.name;
        self.scopes
            .last_mut()
            .expect("global scope always present")
            .insert(name, record);
    }

    /// Binds directly into the global (outermost) scope, regardless of how
    /// many scopes are currently pushed. Used by the annotation resolver,
    /// which always populates the global scope even while validating nested
    /// constraint expressions that may have pushed scopes of their own.
    pub fn bind_global(&mut self, record: SymbolRecord) {
        let name = record.name;
        self.scopes[0].insert(name, record);
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolClass;
    use crate::types::Type;
    use ccl_base::{Interner, Span};

    fn rec(name: Symbol, class: SymbolClass, ty: Type) -> SymbolRecord {
        SymbolRecord::new(name, class, ty, Span::default())
    }

    #[test]
    fn lookup_finds_global_binding() {
        let mut interner = Interner::new();
        let q = interner.intern("q");
        let mut scopes = ScopeStack::new();
        scopes.bind(rec(q, SymbolClass::ScalarVariable, Type::Int));
        assert!(scopes.lookup(q).is_some());
    }

    #[test]
    fn lookup_walks_innermost_to_outermost() {
        let mut interner = Interner::new();
        let i = interner.intern("i");
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.bind(rec(i, SymbolClass::LoopVariable, Type::Int));
        assert_eq!(scopes.lookup(i).unwrap().class, SymbolClass::LoopVariable);
    }

    #[test]
    fn pop_scope_removes_bindings() {
        let mut interner = Interner::new();
        let i = interner.intern("i");
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.bind(rec(i, SymbolClass::LoopVariable, Type::Int));
        scopes.pop_scope();
        assert!(scopes.lookup(i).is_none());
    }

    #[test]
    fn no_shadowing_name_visible_across_scopes() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let mut scopes = ScopeStack::new();
        scopes.bind(rec(a, SymbolClass::ObjectVariable, Type::Atom));
        scopes.push_scope();
        // The outer binding is still visible from the inner scope — nothing
        // shadows it, so a caller attempting to rebind `a` here must see
        // is_defined() return true and reject the rebinding itself.
        assert!(scopes.is_defined(a));
    }

    #[test]
    fn bind_global_reaches_bottom_scope_from_nested_depth() {
        let mut interner = Interner::new();
        let d = interner.intern("d");
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.bind_global(rec(d, SymbolClass::Substitution, Type::Float));
        scopes.pop_scope();
        assert!(scopes.lookup(d).is_some());
    }
}
