//! Lexical scope management
//!
//! A [`ScopeStack`] is a chain of symbol tables with function-frame barriers.
//! Name resolution walks from the innermost scope down to the current frame's
//! base, then falls through to the global scope only. The same type serves
//! the semantic analyzer (addresses absent) and the evaluator (addresses
//! assigned at declaration).

use crate::memory::value::Address;
use crate::parser::ast::Type;
use rustc_hash::FxHashMap;

/// A declared name with its static type and, at run time, its storage address.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    /// Nesting depth of the scope this symbol was declared in (global = 0)
    pub depth: usize,
    /// Base address of the symbol's storage; `None` during analysis
    pub address: Option<Address>,
}

/// One lexical scope: a flat name → symbol table
#[derive(Debug, Default)]
struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

/// Stack of scopes with frame barriers
///
/// Index 0 is always the global scope. `frame_bases` records, for each active
/// function call, the scope index at which its frame starts; resolution never
/// crosses the top barrier except to reach scope 0.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    frame_bases: Vec<usize>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a scope stack containing only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            frame_bases: Vec::new(),
        }
    }

    /// Current nesting depth (global scope = 0).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Push a new block scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope, returning its symbols so the caller can
    /// release their storage. Popping the global scope is a contract
    /// violation.
    pub fn exit_scope(&mut self) -> Vec<Symbol> {
        if self.scopes.len() == 1 {
            panic!("Attempted to pop the global scope");
        }
        let scope = match self.scopes.pop() {
            Some(scope) => scope,
            None => unreachable!(),
        };
        scope.symbols.into_values().collect()
    }

    /// Push a function frame: a barrier plus the frame's first scope
    /// (parameters and top-level locals live here).
    pub fn enter_frame(&mut self) {
        self.frame_bases.push(self.scopes.len());
        self.scopes.push(Scope::default());
    }

    /// Pop the current frame and every scope above its barrier, returning all
    /// dropped symbols.
    pub fn exit_frame(&mut self) -> Vec<Symbol> {
        let base = match self.frame_bases.pop() {
            Some(base) => base,
            None => panic!("Attempted to pop a frame with no frame active"),
        };
        let mut dropped = Vec::new();
        while self.scopes.len() > base {
            dropped.extend(self.exit_scope());
        }
        dropped
    }

    /// Declare a symbol in the innermost scope. Fails (returning the symbol
    /// back) if the name is already declared in that scope; shadowing an
    /// outer scope is allowed.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => unreachable!(),
        };
        if scope.symbols.contains_key(&symbol.name) {
            return Err(symbol);
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Resolve a name: innermost scope down to the current frame base, then
    /// the global scope. Scopes of enclosing calls are never visible.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let base = self.frame_bases.last().copied().unwrap_or(0);
        for scope in self.scopes[base..].iter().rev() {
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
        }
        if base > 0 {
            return self.scopes[0].symbols.get(name);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::BaseType;

    fn sym(name: &str) -> Symbol {
        Symbol {
            name: name.to_string(),
            ty: Type::new(BaseType::Int),
            depth: 0,
            address: None,
        }
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut scopes = ScopeStack::new();
        scopes.declare(sym("x")).unwrap();
        assert!(scopes.resolve("x").is_some());
        assert!(scopes.resolve("y").is_none());
    }

    #[test]
    fn test_shadowing() {
        let mut scopes = ScopeStack::new();
        let mut outer = sym("x");
        outer.depth = 0;
        scopes.declare(outer).unwrap();

        scopes.enter_scope();
        let mut inner = sym("x");
        inner.depth = 1;
        scopes.declare(inner).unwrap();
        assert_eq!(scopes.resolve("x").unwrap().depth, 1);

        scopes.exit_scope();
        assert_eq!(scopes.resolve("x").unwrap().depth, 0);
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scopes = ScopeStack::new();
        scopes.declare(sym("x")).unwrap();
        assert!(scopes.declare(sym("x")).is_err());
    }

    #[test]
    fn test_frame_barrier_hides_caller_locals() {
        let mut scopes = ScopeStack::new();
        scopes.declare(sym("global")).unwrap();

        scopes.enter_frame();
        scopes.declare(sym("caller_local")).unwrap();

        scopes.enter_frame();
        // Callee sees globals but not the caller's locals
        assert!(scopes.resolve("global").is_some());
        assert!(scopes.resolve("caller_local").is_none());
        scopes.exit_frame();

        assert!(scopes.resolve("caller_local").is_some());
    }

    #[test]
    fn test_exit_scope_returns_dropped_symbols() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare(sym("a")).unwrap();
        scopes.declare(sym("b")).unwrap();
        let dropped = scopes.exit_scope();
        assert_eq!(dropped.len(), 2);
    }

    #[test]
    fn test_exit_frame_pops_nested_scopes() {
        let mut scopes = ScopeStack::new();
        scopes.enter_frame();
        scopes.declare(sym("a")).unwrap();
        scopes.enter_scope();
        scopes.declare(sym("b")).unwrap();
        let dropped = scopes.exit_frame();
        assert_eq!(dropped.len(), 2);
        assert_eq!(scopes.depth(), 0);
    }

    #[test]
    #[should_panic]
    fn test_popping_global_scope_panics() {
        let mut scopes = ScopeStack::new();
        scopes.exit_scope();
    }
}
