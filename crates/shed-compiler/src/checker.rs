//! Shed type checker: walks a parsed syntax tree and validates names and
//! types.
//!
//! Entry point: [`type_check`].
//!
//! Checking runs in two passes over the top level:
//! 1. Declare: every import, class, function and `let`/`var` is bound
//!    before any body is examined, so forward references resolve. Class
//!    nominal types are declared before any signature mentions them.
//! 2. Check: top-level and class-member initialisers in source order, then
//!    function and method bodies.
//!
//! Function declarations are visible throughout their block, so a value
//! can be reached before its declaration has run. Every read and write of
//! a declared name is recorded against the code that performs it, and once
//! a block is checked each of its statements is followed through the
//! functions and classes it references to find values it may touch before
//! they are initialised.
//!
//! A subtree that fails to check gets the `Unknown` type, which every rule
//! accepts silently, so one mistake produces one diagnostic.
//!
//! The tree is never mutated; results go to the [`TypeTable`] and the
//! [`ResolutionTable`], both keyed by node handle.

use std::collections::{HashMap, HashSet, VecDeque};

use shed_types::ast::*;
use shed_types::{CompilerError, Diagnostics, NodeLocations, Resolution, ResolutionTable};

use crate::env::{Binding, DeclKind, Origin, ScopeKind, StaticContext};
use crate::registry::{Member, MetaRegistry, ObjectKind, TypeId, TypeKind};

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

/// Expression node → inferred type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    entries: HashMap<NodeId, TypeId>,
}

impl TypeTable {
    pub fn insert(&mut self, node: NodeId, ty: TypeId) {
        self.entries.insert(node, ty);
    }

    pub fn get(&self, node: NodeId) -> Option<TypeId> {
        self.entries.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything checking one module produces.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name and Type diagnostics, in the order found.
    pub errors: Diagnostics,
    pub types: TypeTable,
    pub resolutions: ResolutionTable,
    /// The module's interface: an object type with one member per
    /// top-level declaration.
    pub interface: TypeId,
    pub success: bool,
}

/// Type-check a tree that parsed without errors.
///
/// `context` is the seeded builtin context (consumed; clone the base one
/// per module) and `imports` maps each imported module to its interface
/// type. A module missing from `imports` is bound as `Unknown`.
pub fn type_check(
    tree: &SyntaxTree,
    locations: &NodeLocations,
    context: StaticContext,
    registry: &mut MetaRegistry,
    module: &ModulePath,
    imports: &HashMap<ModulePath, TypeId>,
) -> CheckResult {
    let mut checker = TypeChecker {
        tree,
        locations,
        registry,
        context,
        errors: Diagnostics::new(),
        types: TypeTable::default(),
        resolutions: ResolutionTable::new(),
        classes: HashMap::new(),
        declared: HashSet::new(),
        resolved: HashMap::new(),
        units: Vec::new(),
        uses: HashMap::new(),
    };
    checker.context.push_scope(ScopeKind::Module);

    checker.declare_imports(imports);
    checker.declare_top_level();
    checker.check_initialisers();
    checker.check_bodies();
    checker.check_initialisation_order(&tree.source_file().declarations);
    let interface = checker.build_interface(module);

    let success = checker.errors.is_empty();
    tracing::debug!(
        module = %module,
        errors = checker.errors.len(),
        typed_nodes = checker.types.len(),
        "type checked"
    );
    CheckResult {
        errors: checker.errors,
        types: checker.types,
        resolutions: checker.resolutions,
        interface,
        success,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeChecker
// ══════════════════════════════════════════════════════════════════════════════

struct TypeChecker<'a> {
    tree: &'a SyntaxTree,
    locations: &'a NodeLocations,
    registry: &'a mut MetaRegistry,
    context: StaticContext,
    errors: Diagnostics,
    types: TypeTable,
    resolutions: ResolutionTable,
    /// Class declaration → instance type.
    classes: HashMap<NodeId, TypeId>,
    /// Top-level declarations whose name was bound without a clash.
    declared: HashSet<NodeId>,
    /// Type expression → denoted type. Annotations are read by both passes
    /// but must be reported once.
    resolved: HashMap<NodeId, TypeId>,
    /// Code currently being checked: the enclosing statements, up to the
    /// function or class body they belong to.
    units: Vec<NodeId>,
    /// Statement, function or class → the declarations it uses.
    uses: HashMap<NodeId, Vec<Use>>,
}

/// A reference to a declared name.
#[derive(Debug, Clone, Copy)]
struct Use {
    decl: NodeId,
    site: NodeId,
}

impl<'a> TypeChecker<'a> {
    fn node(&self, id: NodeId) -> &'a Node {
        self.tree.node(id)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Pass 1: declare
    // ══════════════════════════════════════════════════════════════════════

    fn declare_imports(&mut self, imports: &HashMap<ModulePath, TypeId>) {
        let tree = self.tree;
        for (id, import) in tree.imports() {
            let ty = imports.get(&import.path).copied().unwrap_or(TypeId::UNKNOWN);
            let name = import.binding_name();
            let binding = Binding::new(Some(ty), Origin::Import(import.path.clone()));
            if !self.context.define(name, binding) {
                self.error(CompilerError::name(format!("duplicate name '{name}'"), id));
            }
        }
    }

    fn declare_top_level(&mut self) {
        let tree = self.tree;
        let declarations = &tree.source_file().declarations;

        // Names first, in source order, so clashes are reported at the
        // later declaration.
        for &decl in declarations {
            let (name, binding) = match self.node(decl) {
                Node::Class(class) => {
                    let instance = self.registry.declare_object(&class.name, ObjectKind::Class);
                    self.classes.insert(decl, instance);
                    let meta = self.registry.meta_of(instance);
                    (&class.name, Binding::new(Some(meta), Origin::Declared(DeclKind::Class)))
                }
                Node::Fun(fun) => (&fun.name, Binding::new(None, Origin::Declared(DeclKind::Fun))),
                Node::Let(let_decl) => (
                    &let_decl.name,
                    Binding::new(None, Origin::Declared(let_kind(let_decl))),
                ),
                _ => continue,
            };
            if self.context.define(name, binding.declared_at(decl)) {
                self.declared.insert(decl);
            } else {
                self.error(CompilerError::name(format!("duplicate name '{name}'"), decl));
            }
        }

        // Then types, which may mention any class.
        for &decl in declarations {
            match self.node(decl) {
                Node::Class(class) => self.declare_class_members(decl, class),
                Node::Fun(fun) => {
                    let sig = self.signature(&fun.params, fun.ret);
                    if self.declared.contains(&decl) {
                        self.context.set_type(&fun.name, sig);
                    }
                }
                Node::Let(let_decl) => {
                    if let Some(ann) = let_decl.type_ann {
                        let ty = self.resolve_type(ann);
                        if self.declared.contains(&decl) {
                            self.context.set_type(&let_decl.name, ty);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn declare_class_members(&mut self, decl: NodeId, class: &'a ClassDecl) {
        let Some(&instance) = self.classes.get(&decl) else {
            return;
        };

        let mut constructor = Vec::with_capacity(class.params.len());
        for &param in &class.params {
            let Node::Param(p) = self.node(param) else {
                continue;
            };
            let ty = self.resolve_type(p.type_ann);
            constructor.push(ty);
            self.add_member(instance, &class.name, param, &p.name, Some(ty), false);
        }
        self.registry.set_constructor(instance, constructor);

        for &member in &class.members {
            match self.node(member) {
                Node::Let(m) => {
                    let ty = m.type_ann.map(|ann| self.resolve_type(ann));
                    self.add_member(instance, &class.name, member, &m.name, ty, m.mutable);
                }
                Node::Fun(m) => {
                    let sig = self.signature(&m.params, m.ret);
                    self.add_member(instance, &class.name, member, &m.name, Some(sig), false);
                }
                _ => {}
            }
        }
    }

    fn add_member(
        &mut self,
        instance: TypeId,
        class: &str,
        node: NodeId,
        name: &str,
        ty: Option<TypeId>,
        mutable: bool,
    ) {
        let member = Member {
            name: name.to_string(),
            ty,
            mutable,
        };
        if !self.registry.add_member(instance, member) {
            self.error(CompilerError::name(
                format!("duplicate member '{name}' in class '{class}'"),
                node,
            ));
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Pass 2: check
    // ══════════════════════════════════════════════════════════════════════

    fn check_initialisers(&mut self) {
        let tree = self.tree;
        for &decl in &tree.source_file().declarations {
            match self.node(decl) {
                Node::Let(let_decl) => {
                    let ty = self.in_unit(decl, |this| this.check_let_value(let_decl));
                    if let_decl.type_ann.is_none() && self.declared.contains(&decl) {
                        self.context.set_type(&let_decl.name, ty);
                    }
                }
                Node::Class(class) => {
                    let Some(&instance) = self.classes.get(&decl) else {
                        continue;
                    };
                    self.enter_class(instance);
                    for &member in &class.members {
                        if let Node::Let(m) = self.node(member) {
                            let ty = self.in_unit(decl, |this| this.check_let_value(m));
                            if m.type_ann.is_none() {
                                self.registry.set_member_type(instance, &m.name, ty);
                                self.context.set_type(&m.name, ty);
                            }
                        }
                    }
                    self.context.pop_scope();
                }
                _ => {}
            }
        }
    }

    fn check_bodies(&mut self) {
        let tree = self.tree;
        for &decl in &tree.source_file().declarations {
            match self.node(decl) {
                Node::Fun(fun) => self.in_unit(decl, |this| this.check_fun_body(decl, fun)),
                Node::Class(class) => {
                    let Some(&instance) = self.classes.get(&decl) else {
                        continue;
                    };
                    self.enter_class(instance);
                    for &member in &class.members {
                        if let Node::Fun(m) = self.node(member) {
                            self.in_unit(decl, |this| this.check_fun_body(member, m));
                        }
                    }
                    self.context.pop_scope();
                }
                _ => {}
            }
        }
    }

    /// Push a class scope holding the class's parameters and members.
    fn enter_class(&mut self, instance: TypeId) {
        self.context.push_scope(ScopeKind::Class);
        let members = self
            .registry
            .object(instance)
            .map(|o| o.members.clone())
            .unwrap_or_default();
        for member in members {
            let kind = if member.mutable {
                DeclKind::Var
            } else {
                DeclKind::Let
            };
            self.context
                .define(&member.name, Binding::new(member.ty, Origin::Declared(kind)));
        }
    }

    fn build_interface(&mut self, module: &ModulePath) -> TypeId {
        let interface = self
            .registry
            .declare_object(module.to_string(), ObjectKind::Module);
        let tree = self.tree;
        for &decl in &tree.source_file().declarations {
            if !self.declared.contains(&decl) {
                continue;
            }
            let (name, mutable) = match self.node(decl) {
                Node::Let(d) => (&d.name, d.mutable),
                Node::Fun(d) => (&d.name, false),
                Node::Class(d) => (&d.name, false),
                _ => continue,
            };
            let ty = self
                .context
                .lookup(name)
                .and_then(|b| b.ty)
                .unwrap_or(TypeId::UNKNOWN);
            self.registry.add_member(
                interface,
                Member {
                    name: name.clone(),
                    ty: Some(ty),
                    mutable,
                },
            );
        }
        interface
    }

    // ══════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════

    /// The function type of a parameter list and optional return annotation.
    fn signature(&mut self, params: &[NodeId], ret: Option<NodeId>) -> TypeId {
        let params = self.param_types(params);
        let ret = ret.map_or(TypeId::UNIT, |r| self.resolve_type(r));
        self.registry.function(params, ret)
    }

    fn param_types(&mut self, params: &[NodeId]) -> Vec<TypeId> {
        params
            .iter()
            .map(|&p| match self.node(p) {
                Node::Param(param) => self.resolve_type(param.type_ann),
                _ => TypeId::UNKNOWN,
            })
            .collect()
    }

    fn check_fun_body(&mut self, id: NodeId, fun: &'a FunDecl) {
        let param_types = self.param_types(&fun.params);
        let ret = fun.ret.map_or(TypeId::UNIT, |r| self.resolve_type(r));
        self.check_function_block(id, &fun.params, &param_types, ret, fun.body);
    }

    /// Check a block body in a fresh function scope holding the parameters.
    fn check_function_block(
        &mut self,
        id: NodeId,
        params: &[NodeId],
        param_types: &[TypeId],
        ret: TypeId,
        body: NodeId,
    ) {
        self.context.push_scope(ScopeKind::Function { ret });
        for (&param, &ty) in params.iter().zip(param_types) {
            if let Node::Param(p) = self.node(param) {
                self.context.define(
                    &p.name,
                    Binding::new(Some(ty), Origin::Declared(DeclKind::Param)),
                );
            }
        }
        self.check_stmts(body);
        self.context.pop_scope();

        if ret != TypeId::UNIT && !ret.is_unknown() && !self.block_returns(body) {
            self.error(CompilerError::type_error(
                format!(
                    "missing return: function must return {}",
                    self.registry.display(ret)
                ),
                id,
            ));
        }
    }

    /// Whether every path through a block ends in `return`.
    fn block_returns(&self, block: NodeId) -> bool {
        match self.node(block) {
            Node::Block(b) => b.stmts.last().is_some_and(|&s| self.stmt_returns(s)),
            _ => false,
        }
    }

    fn stmt_returns(&self, stmt: NodeId) -> bool {
        match self.node(stmt) {
            Node::Stmt(Stmt::Return(_)) => true,
            Node::Stmt(Stmt::If {
                then_block,
                else_branch: Some(else_branch),
                ..
            }) => {
                let else_returns = match self.node(*else_branch) {
                    Node::Block(_) => self.block_returns(*else_branch),
                    _ => self.stmt_returns(*else_branch),
                };
                self.block_returns(*then_block) && else_returns
            }
            _ => false,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    /// Check a block's statements in the current scope. Local functions
    /// are bound first so siblings may call each other.
    fn check_stmts(&mut self, block: NodeId) {
        let Node::Block(b) = self.node(block) else {
            return;
        };
        for &stmt in &b.stmts {
            if let Node::Fun(fun) = self.node(stmt) {
                let sig = self.signature(&fun.params, fun.ret);
                let binding =
                    Binding::new(Some(sig), Origin::Declared(DeclKind::Fun)).declared_at(stmt);
                if !self.context.define(&fun.name, binding) {
                    self.error(CompilerError::name(
                        format!("duplicate name '{}'", fun.name),
                        stmt,
                    ));
                }
            }
        }
        for &stmt in &b.stmts {
            self.units.push(stmt);
            self.check_stmt(stmt);
            self.units.pop();
        }
        self.check_initialisation_order(&b.stmts);
    }

    /// Check a block in its own scope.
    fn check_block(&mut self, block: NodeId) {
        self.context.push_scope(ScopeKind::Block);
        self.check_stmts(block);
        self.context.pop_scope();
    }

    fn check_stmt(&mut self, id: NodeId) {
        match self.node(id) {
            Node::Let(decl) => {
                // The initialiser sees the enclosing binding, not this one.
                let ty = self.check_let_value(decl);
                let binding =
                    Binding::new(Some(ty), Origin::Declared(let_kind(decl))).declared_at(id);
                if !self.context.define(&decl.name, binding) {
                    self.error(CompilerError::name(
                        format!("duplicate name '{}'", decl.name),
                        id,
                    ));
                }
            }
            // Bound by the enclosing block.
            Node::Fun(fun) => self.in_unit(id, |this| this.check_fun_body(id, fun)),
            Node::Stmt(stmt) => self.check_statement(id, stmt),
            _ => {}
        }
    }

    fn check_statement(&mut self, id: NodeId, stmt: &'a Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                self.check_expr(*expr);
            }
            Stmt::Return(value) => {
                let ty = match value {
                    Some(v) => self.check_expr(*v),
                    None => TypeId::UNIT,
                };
                match self.context.return_type() {
                    None => self.error(CompilerError::type_error(
                        "'return' outside of a function",
                        id,
                    )),
                    Some(ret) if !self.registry.is_assignable(ty, ret) => {
                        let message = format!(
                            "expected return type {}, got {}",
                            self.registry.display(ret),
                            self.registry.display(ty)
                        );
                        self.error(CompilerError::type_error(message, value.unwrap_or(id)));
                    }
                    Some(_) => {}
                }
            }
            Stmt::If {
                condition,
                then_block,
                else_branch,
            } => {
                self.check_condition(*condition, "if");
                self.check_block(*then_block);
                if let Some(else_branch) = *else_branch {
                    match self.node(else_branch) {
                        Node::Block(_) => self.check_block(else_branch),
                        _ => self.check_stmt(else_branch),
                    }
                }
            }
            Stmt::While { condition, body } => {
                self.check_condition(*condition, "while");
                self.check_block(*body);
            }
            Stmt::Assign { target, value } => self.check_assign(id, target, *value),
        }
    }

    fn check_condition(&mut self, condition: NodeId, keyword: &str) {
        let ty = self.check_expr(condition);
        if !self.registry.is_assignable(ty, TypeId::BOOLEAN) {
            let message = format!(
                "'{keyword}' condition must be Boolean, got {}",
                self.registry.display(ty)
            );
            self.error(CompilerError::type_error(message, condition));
        }
    }

    fn check_assign(&mut self, id: NodeId, target: &str, value: NodeId) {
        let value_ty = self.check_expr(value);
        let Some(binding) = self.context.lookup(target).cloned() else {
            self.error(CompilerError::name(format!("undefined name '{target}'"), id));
            return;
        };
        self.record_use(&binding, id);
        if !binding.is_mutable() {
            self.error(CompilerError::name(
                format!("cannot assign to '{target}': only 'var' bindings can be assigned"),
                id,
            ));
            return;
        }
        let Some(target_ty) = binding.ty else {
            self.error(CompilerError::name(
                format!("'{target}' is used before its type is known"),
                id,
            ));
            return;
        };
        if !self.registry.is_assignable(value_ty, target_ty) {
            let message = format!(
                "cannot assign {} to '{target}' of type {}",
                self.registry.display(value_ty),
                self.registry.display(target_ty)
            );
            self.error(CompilerError::type_error(message, value));
        }
    }

    /// Check a `let`/`var` initialiser against its annotation. Returns the
    /// binding's type: the annotation if present, else the inferred type.
    fn check_let_value(&mut self, decl: &'a LetDecl) -> TypeId {
        let value = self.check_expr(decl.value);
        let Some(ann) = decl.type_ann else {
            return value;
        };
        let declared = self.resolve_type(ann);
        if !self.registry.is_assignable(value, declared) {
            let message = format!(
                "'{}' is declared {} but initialised with {}",
                decl.name,
                self.registry.display(declared),
                self.registry.display(value)
            );
            self.error(CompilerError::type_error(message, decl.value));
        }
        declared
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn check_expr(&mut self, id: NodeId) -> TypeId {
        let ty = match self.node(id) {
            Node::Expr(expr) => self.infer(id, expr),
            _ => TypeId::UNKNOWN,
        };
        self.types.insert(id, ty);
        ty
    }

    fn infer(&mut self, id: NodeId, expr: &'a Expr) -> TypeId {
        match expr {
            // ── Literals ──
            Expr::Number(_) => TypeId::NUMBER,
            Expr::String(_) => TypeId::STRING,
            Expr::Bool(_) => TypeId::BOOLEAN,
            Expr::Unit => TypeId::UNIT,

            // ── Identifiers ──
            Expr::Ident(name) => self.check_ident(id, name),

            // ── Operators ──
            Expr::Binary { op, left, right } => self.check_binary(id, *op, *left, *right),
            Expr::Unary { op, operand } => self.check_unary(id, *op, *operand),

            // ── Calls and members ──
            Expr::Call { callee, args } => self.check_call(id, *callee, args),
            Expr::Member { object, member } => self.check_member(id, *object, member),

            // ── Lambda ──
            Expr::Lambda(lambda) => self.check_lambda(id, lambda),
        }
    }

    fn check_ident(&mut self, id: NodeId, name: &str) -> TypeId {
        let Some(binding) = self.context.lookup(name).cloned() else {
            self.error(CompilerError::name(format!("undefined name '{name}'"), id));
            return TypeId::UNKNOWN;
        };
        let resolution = match &binding.origin {
            Origin::Builtin { js } => Resolution::Builtin { js: js.clone() },
            Origin::Import(module) => Resolution::Import { module: module.clone() },
            Origin::Declared(_) => Resolution::Declared,
        };
        self.resolutions.insert(id, resolution);
        self.record_use(&binding, id);
        match binding.ty {
            Some(ty) => ty,
            None => {
                self.error(CompilerError::name(
                    format!("'{name}' is used before its type is known"),
                    id,
                ));
                TypeId::UNKNOWN
            }
        }
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn check_binary(&mut self, id: NodeId, op: BinaryOp, left: NodeId, right: NodeId) -> TypeId {
        let l = self.check_expr(left);
        let r = self.check_expr(right);
        if l.is_unknown() || r.is_unknown() {
            return TypeId::UNKNOWN;
        }

        let result = match op {
            BinaryOp::Add => match (l, r) {
                (TypeId::NUMBER, TypeId::NUMBER) => Some(TypeId::NUMBER),
                (TypeId::STRING, TypeId::STRING) => Some(TypeId::STRING),
                _ => None,
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                (l == TypeId::NUMBER && r == TypeId::NUMBER).then_some(TypeId::NUMBER)
            }
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                (l == TypeId::NUMBER && r == TypeId::NUMBER).then_some(TypeId::BOOLEAN)
            }
            BinaryOp::And | BinaryOp::Or => {
                (l == TypeId::BOOLEAN && r == TypeId::BOOLEAN).then_some(TypeId::BOOLEAN)
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                if l == r {
                    return TypeId::BOOLEAN;
                }
                let message = format!(
                    "cannot compare {} and {}",
                    self.registry.display(l),
                    self.registry.display(r)
                );
                self.error(CompilerError::type_error(message, id));
                return TypeId::UNKNOWN;
            }
        };

        result.unwrap_or_else(|| {
            let message = format!(
                "cannot apply '{}' to {} and {}",
                op.symbol(),
                self.registry.display(l),
                self.registry.display(r)
            );
            self.error(CompilerError::type_error(message, id));
            TypeId::UNKNOWN
        })
    }

    fn check_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) -> TypeId {
        let ty = self.check_expr(operand);
        let expected = match op {
            UnaryOp::Neg => TypeId::NUMBER,
            UnaryOp::Not => TypeId::BOOLEAN,
        };
        if ty.is_unknown() || ty == expected {
            return ty;
        }
        let message = format!(
            "cannot apply '{}' to {}",
            op.symbol(),
            self.registry.display(ty)
        );
        self.error(CompilerError::type_error(message, id));
        TypeId::UNKNOWN
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn check_call(&mut self, id: NodeId, callee: NodeId, args: &'a [NodeId]) -> TypeId {
        let callee_ty = self.check_expr(callee);
        let arg_types: Vec<TypeId> = args.iter().map(|&a| self.check_expr(a)).collect();
        if callee_ty.is_unknown() {
            return TypeId::UNKNOWN;
        }

        let (params, result) = match self.registry.kind(callee_ty).clone() {
            TypeKind::Function { params, ret } => (params, ret),
            TypeKind::Meta(instance) => {
                match self.registry.object(instance).and_then(|o| o.constructor.clone()) {
                    Some(params) => (params, instance),
                    None => return self.not_callable(id, callee_ty),
                }
            }
            _ => return self.not_callable(id, callee_ty),
        };

        if params.len() != args.len() {
            self.error(CompilerError::type_error(
                format!("expected {} arguments, got {}", params.len(), args.len()),
                id,
            ));
            return result;
        }
        for (index, ((&arg, &arg_ty), &param_ty)) in
            args.iter().zip(&arg_types).zip(&params).enumerate()
        {
            if !self.registry.is_assignable(arg_ty, param_ty) {
                let message = format!(
                    "argument {}: expected {}, got {}",
                    index + 1,
                    self.registry.display(param_ty),
                    self.registry.display(arg_ty)
                );
                self.error(CompilerError::type_error(message, arg));
            }
        }
        result
    }

    fn not_callable(&mut self, id: NodeId, ty: TypeId) -> TypeId {
        let message = format!("cannot call a value of type {}", self.registry.display(ty));
        self.error(CompilerError::type_error(message, id));
        TypeId::UNKNOWN
    }

    // ── Members ───────────────────────────────────────────────────────────

    fn check_member(&mut self, id: NodeId, object: NodeId, name: &str) -> TypeId {
        let object_ty = self.check_expr(object);
        if object_ty.is_unknown() {
            return TypeId::UNKNOWN;
        }
        match self.registry.member(object_ty, name).map(|m| m.ty) {
            Some(Some(ty)) => ty,
            Some(None) => {
                self.error(CompilerError::name(
                    format!("'{name}' is used before its type is known"),
                    id,
                ));
                TypeId::UNKNOWN
            }
            None => {
                let message = format!(
                    "type {} has no member '{name}'",
                    self.registry.display(object_ty)
                );
                self.error(CompilerError::type_error(message, id));
                TypeId::UNKNOWN
            }
        }
    }

    // ── Lambda ────────────────────────────────────────────────────────────

    fn check_lambda(&mut self, id: NodeId, lambda: &'a Lambda) -> TypeId {
        let param_types = self.param_types(&lambda.params);
        let declared_ret = lambda.ret.map(|r| self.resolve_type(r));

        let ret = match lambda.body {
            LambdaBody::Expr(body) => {
                self.context.push_scope(ScopeKind::Function {
                    ret: declared_ret.unwrap_or(TypeId::UNKNOWN),
                });
                for (&param, &ty) in lambda.params.iter().zip(&param_types) {
                    if let Node::Param(p) = self.node(param) {
                        self.context.define(
                            &p.name,
                            Binding::new(Some(ty), Origin::Declared(DeclKind::Param)),
                        );
                    }
                }
                let body_ty = self.check_expr(body);
                self.context.pop_scope();
                match declared_ret {
                    Some(ret) => {
                        if !self.registry.is_assignable(body_ty, ret) {
                            let message = format!(
                                "expected return type {}, got {}",
                                self.registry.display(ret),
                                self.registry.display(body_ty)
                            );
                            self.error(CompilerError::type_error(message, body));
                        }
                        ret
                    }
                    None => body_ty,
                }
            }
            LambdaBody::Block(body) => {
                let ret = declared_ret.unwrap_or(TypeId::UNIT);
                self.check_function_block(id, &lambda.params, &param_types, ret, body);
                ret
            }
        };
        self.registry.function(param_types, ret)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Initialisation order
    // ══════════════════════════════════════════════════════════════════════

    /// Check `check` as the body of `owner`: uses found inside belong to
    /// `owner` alone, not to the statement that declares it.
    fn in_unit<R>(&mut self, owner: NodeId, check: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.units, vec![owner]);
        let result = check(self);
        self.units = saved;
        result
    }

    fn record_use(&mut self, binding: &Binding, site: NodeId) {
        let Some(decl) = binding.decl else {
            return;
        };
        for &unit in &self.units {
            self.uses.entry(unit).or_default().push(Use { decl, site });
        }
    }

    /// Report each value in `steps` that a step can read or write before the
    /// value's own declaration has run, directly or through the functions
    /// and classes the step references.
    fn check_initialisation_order(&mut self, steps: &[NodeId]) {
        let tree = self.tree;
        let positions: HashMap<NodeId, usize> = steps
            .iter()
            .enumerate()
            .filter(|&(_, &step)| matches!(tree.node(step), Node::Let(_)))
            .map(|(i, &step)| (step, i))
            .collect();
        if positions.is_empty() {
            return;
        }

        for (index, &step) in steps.iter().enumerate() {
            // Declaring a function or class runs none of its code.
            if matches!(tree.node(step), Node::Fun(_) | Node::Class(_)) {
                continue;
            }
            let mut queue: VecDeque<(Use, Option<NodeId>)> = self
                .uses
                .get(&step)
                .map(|uses| uses.iter().map(|&u| (u, None)).collect())
                .unwrap_or_default();
            let mut expanded = HashSet::new();
            let mut reported = HashSet::new();

            while let Some((used, via)) = queue.pop_front() {
                match tree.node(used.decl) {
                    Node::Let(value) => {
                        let early = positions.get(&used.decl).is_some_and(|&p| p >= index);
                        // A direct read of a pending binding is reported when
                        // its type is looked up.
                        let pending = via.is_none() && value.type_ann.is_none();
                        if early && !pending && reported.insert(used.decl) {
                            let message = match via.map(|f| self.declared_name(f)) {
                                Some(through) => format!(
                                    "'{}' is used before it is initialised, through '{through}'",
                                    value.name
                                ),
                                None => format!("'{}' is used before it is initialised", value.name),
                            };
                            self.error(CompilerError::name(message, used.site));
                        }
                    }
                    Node::Fun(_) | Node::Class(_) => {
                        if expanded.insert(used.decl) {
                            let via = via.or(Some(used.decl));
                            if let Some(inner) = self.uses.get(&used.decl) {
                                queue.extend(
                                    inner.iter().map(|u| (Use { site: used.site, ..*u }, via)),
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn declared_name(&self, decl: NodeId) -> &'a str {
        match self.node(decl) {
            Node::Let(d) => &d.name,
            Node::Fun(d) => &d.name,
            Node::Class(d) => &d.name,
            _ => "",
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Type expressions
    // ══════════════════════════════════════════════════════════════════════

    fn resolve_type(&mut self, id: NodeId) -> TypeId {
        if let Some(&ty) = self.resolved.get(&id) {
            return ty;
        }
        let ty = self.resolve_type_uncached(id);
        self.resolved.insert(id, ty);
        ty
    }

    fn resolve_type_uncached(&mut self, id: NodeId) -> TypeId {
        match self.node(id) {
            Node::Type(TypeExpr::Named(name)) => {
                let Some(binding) = self.context.lookup(name) else {
                    self.error(CompilerError::name(format!("undefined type '{name}'"), id));
                    return TypeId::UNKNOWN;
                };
                match binding.ty.and_then(|t| self.registry.denoted(t)) {
                    Some(ty) => ty,
                    None => {
                        self.error(CompilerError::type_error(format!("'{name}' is not a type"), id));
                        TypeId::UNKNOWN
                    }
                }
            }
            Node::Type(TypeExpr::Function { params, ret }) => {
                let params: Vec<TypeId> = params.iter().map(|&p| self.resolve_type(p)).collect();
                let ret = self.resolve_type(*ret);
                self.registry.function(params, ret)
            }
            _ => TypeId::UNKNOWN,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Error Reporting
    // ══════════════════════════════════════════════════════════════════════

    fn error(&mut self, error: CompilerError) {
        if let shed_types::ErrorLocation::Node(node) = error.location {
            tracing::trace!(range = ?self.locations.locate(node), "{}", error);
        }
        self.errors.push(error);
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn let_kind(decl: &LetDecl) -> DeclKind {
    if decl.mutable {
        DeclKind::Var
    } else {
        DeclKind::Let
    }
}
