//! Static context: lexically scoped bindings.
//!
//! [`StaticContext`] manages a stack of scopes, each carrying bindings and
//! metadata about the code it encloses (module top level, function body,
//! class body, block). A seeded context is cloned once per module so that
//! no module can leak bindings into another.

use std::collections::HashMap;

use shed_types::ast::{ModulePath, NodeId};

use crate::registry::TypeId;

// ══════════════════════════════════════════════════════════════════════════════
// Scope Kind
// ══════════════════════════════════════════════════════════════════════════════

/// What kind of code a scope encloses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Builtins seeded from a profile.
    Global,
    /// A module's top-level declarations and imports.
    Module,
    /// A function or lambda body, with its declared return type.
    Function { ret: TypeId },
    /// An `if`/`else`/`while` body.
    Block,
    /// A class body: parameters and members.
    Class,
}

// ══════════════════════════════════════════════════════════════════════════════
// Bindings
// ══════════════════════════════════════════════════════════════════════════════

/// What introduced a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Seeded by a builtin profile; spelled `js` in generated code.
    Builtin { js: String },
    /// Declared in Shed source.
    Declared(DeclKind),
    /// Introduced by `import module`.
    Import(ModulePath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Var,
    Fun,
    Class,
    Param,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// `None` while an unannotated top-level binding awaits its initialiser.
    pub ty: Option<TypeId>,
    pub origin: Origin,
    /// The `let`, `var`, `fun` or `class` declaration that introduced it.
    pub decl: Option<NodeId>,
}

impl Binding {
    pub fn new(ty: Option<TypeId>, origin: Origin) -> Self {
        Self {
            ty,
            origin,
            decl: None,
        }
    }

    pub fn declared_at(mut self, decl: NodeId) -> Self {
        self.decl = Some(decl);
        self
    }

    /// Only `var` bindings may be assigned.
    pub fn is_mutable(&self) -> bool {
        self.origin == Origin::Declared(DeclKind::Var)
    }
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    bindings: HashMap<String, Binding>,
}

// ══════════════════════════════════════════════════════════════════════════════
// StaticContext
// ══════════════════════════════════════════════════════════════════════════════

/// A stack of scopes for name resolution.
#[derive(Debug, Clone)]
pub struct StaticContext {
    scopes: Vec<Scope>,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticContext {
    /// A context with one empty [`ScopeKind::Global`] scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                bindings: HashMap::new(),
            }],
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            bindings: HashMap::new(),
        });
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope. Returns `false` (and leaves the
    /// existing binding) if that scope already has `name`; outer bindings
    /// may be shadowed freely.
    pub fn define(&mut self, name: &str, binding: Binding) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };
        if scope.bindings.contains_key(name) {
            return false;
        }
        scope.bindings.insert(name.to_string(), binding);
        true
    }

    /// The innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(name))
    }

    /// Whether the innermost scope binds `name`.
    pub fn defined_locally(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|s| s.bindings.contains_key(name))
    }

    /// Resolve a pending binding's type in the innermost scope that has it.
    pub fn set_type(&mut self, name: &str, ty: TypeId) {
        if let Some(binding) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|s| s.bindings.get_mut(name))
        {
            binding.ty = Some(ty);
        }
    }

    /// The declared return type of the innermost enclosing function, or
    /// `None` at module or class level.
    pub fn return_type(&self) -> Option<TypeId> {
        for scope in self.scopes.iter().rev() {
            match scope.kind {
                ScopeKind::Function { ret } => return Some(ret),
                ScopeKind::Class | ScopeKind::Module | ScopeKind::Global => return None,
                ScopeKind::Block => {}
            }
        }
        None
    }

    /// Names bound in the innermost scope, sorted for stable output.
    pub fn local_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .scopes
            .last()
            .map(|s| s.bindings.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(ty: TypeId) -> Binding {
        Binding::new(Some(ty), Origin::Declared(DeclKind::Var))
    }

    fn constant(ty: TypeId) -> Binding {
        Binding::new(Some(ty), Origin::Declared(DeclKind::Let))
    }

    #[test]
    fn test_define_and_lookup() {
        let mut ctx = StaticContext::new();
        assert!(ctx.define("x", constant(TypeId::NUMBER)));
        assert_eq!(ctx.lookup("x").and_then(|b| b.ty), Some(TypeId::NUMBER));
        assert!(ctx.lookup("y").is_none());
    }

    #[test]
    fn test_duplicate_in_same_scope_rejected() {
        let mut ctx = StaticContext::new();
        assert!(ctx.define("x", constant(TypeId::NUMBER)));
        assert!(!ctx.define("x", constant(TypeId::STRING)));
        assert_eq!(ctx.lookup("x").and_then(|b| b.ty), Some(TypeId::NUMBER));
    }

    #[test]
    fn test_shadowing_and_pop() {
        let mut ctx = StaticContext::new();
        ctx.define("x", constant(TypeId::NUMBER));
        ctx.push_scope(ScopeKind::Block);
        assert!(ctx.define("x", var(TypeId::STRING)));
        assert!(ctx.lookup("x").is_some_and(Binding::is_mutable));
        ctx.pop_scope();
        assert!(!ctx.lookup("x").is_some_and(Binding::is_mutable));
    }

    #[test]
    fn test_global_scope_survives_pop() {
        let mut ctx = StaticContext::new();
        ctx.define("print", constant(TypeId::UNIT));
        ctx.pop_scope();
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.lookup("print").is_some());
    }

    #[test]
    fn test_return_type_stops_at_class() {
        let mut ctx = StaticContext::new();
        ctx.push_scope(ScopeKind::Module);
        assert_eq!(ctx.return_type(), None);
        ctx.push_scope(ScopeKind::Function {
            ret: TypeId::NUMBER,
        });
        ctx.push_scope(ScopeKind::Block);
        assert_eq!(ctx.return_type(), Some(TypeId::NUMBER));
        ctx.push_scope(ScopeKind::Class);
        assert_eq!(ctx.return_type(), None);
    }

    #[test]
    fn test_set_type_resolves_pending() {
        let mut ctx = StaticContext::new();
        ctx.define("x", Binding::new(None, Origin::Declared(DeclKind::Let)));
        assert_eq!(ctx.lookup("x").and_then(|b| b.ty), None);
        ctx.set_type("x", TypeId::BOOLEAN);
        assert_eq!(ctx.lookup("x").and_then(|b| b.ty), Some(TypeId::BOOLEAN));
    }

    #[test]
    fn test_declaration_travels_with_binding() {
        let mut ctx = StaticContext::new();
        let decl = NodeId(7);
        ctx.define("x", constant(TypeId::NUMBER).declared_at(decl));
        ctx.define("print", constant(TypeId::UNIT));
        assert_eq!(ctx.lookup("x").and_then(|b| b.decl), Some(decl));
        assert_eq!(ctx.lookup("print").and_then(|b| b.decl), None);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut base = StaticContext::new();
        base.define("print", constant(TypeId::UNIT));
        let mut a = base.clone();
        a.define("x", constant(TypeId::NUMBER));
        assert!(base.lookup("x").is_none());
        assert!(a.lookup("print").is_some());
    }
}
