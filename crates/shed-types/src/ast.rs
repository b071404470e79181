//! Syntax tree for the Shed language.
//!
//! The tree is an arena of [`Node`]s addressed by [`NodeId`] handles.
//! Children are referenced by handle, so nodes carry no back-references and
//! no mutable annotations; source ranges live in the
//! [`NodeLocations`](crate::NodeLocations) side table and inferred types in
//! the checker's type table, both keyed by the same handles.

use std::fmt;

use serde::Serialize;

use crate::index_vec::{Idx, IndexVec};
use crate::locations::NodeLocations;
use crate::SourceRange;

// ══════════════════════════════════════════════════════════════════════════════
// Handles
// ══════════════════════════════════════════════════════════════════════════════

/// Opaque identity of a node within one [`SyntaxTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct NodeId(pub u32);

impl Idx for NodeId {
    fn new(raw: u32) -> Self {
        Self(raw)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Module paths
// ══════════════════════════════════════════════════════════════════════════════

/// A dotted module name such as `shed.core.strings`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(Vec<String>);

impl Serialize for ModulePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl ModulePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Split a dotted name. Empty segments are kept, so `"a..b"` never
    /// silently aliases `"a.b"`.
    pub fn parse(dotted: &str) -> Self {
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The last segment, used as the default import binding name.
    pub fn last(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// The relative file path of this module: `a/b/c.shed`.
    pub fn file_path(&self) -> String {
        format!("{}.shed", self.0.join("/"))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Nodes
// ══════════════════════════════════════════════════════════════════════════════

/// One syntax node. Every variant refers to its children by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    SourceFile(SourceFile),
    Import(Import),
    Let(LetDecl),
    Fun(FunDecl),
    Class(ClassDecl),
    Param(Param),
    Block(Block),
    Stmt(Stmt),
    Expr(Expr),
    Type(TypeExpr),
}

/// The root: imports first, then declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub imports: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
}

/// `import a.b.c [as name]`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: ModulePath,
    pub alias: Option<String>,
}

impl Import {
    /// The name this import binds in the importing module.
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.path.last())
    }
}

/// `let name [: Type] = value` or `var name [: Type] = value`
#[derive(Debug, Clone, PartialEq)]
pub struct LetDecl {
    pub mutable: bool,
    pub name: String,
    pub type_ann: Option<NodeId>,
    pub value: NodeId,
}

/// `fun name(params) [: Type] { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub params: Vec<NodeId>,
    pub ret: Option<NodeId>,
    pub body: NodeId,
}

/// `class Name(params) { members }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub params: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

/// A parameter: `name: Type`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_ann: NodeId,
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<NodeId>,
}

/// Statements that are not declarations. Nested `let`/`var`/`fun` appear in
/// blocks as [`Node::Let`] and [`Node::Fun`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `expr`
    Expr(NodeId),
    /// `return [expr]`
    Return(Option<NodeId>),
    /// `if cond { ... } [else { ... } | else if ...]`
    If {
        condition: NodeId,
        then_block: NodeId,
        else_branch: Option<NodeId>,
    },
    /// `while cond { ... }`
    While { condition: NodeId, body: NodeId },
    /// `name = value`
    Assign { target: String, value: NodeId },
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    Bool(bool),
    /// `()`
    Unit,
    Ident(String),
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Member {
        object: NodeId,
        member: String,
    },
    Lambda(Lambda),
}

/// `fun(params) [: Type] => expr` or `fun(params) [: Type] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<NodeId>,
    pub ret: Option<NodeId>,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LambdaBody {
    Expr(NodeId),
    Block(NodeId),
}

/// Type expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Number`, `Point`, ...
    Named(String),
    /// `(A, B) -> R`
    Function { params: Vec<NodeId>, ret: NodeId },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    /// The source spelling of this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tree
// ══════════════════════════════════════════════════════════════════════════════

/// An immutable syntax tree with a single root.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: IndexVec<NodeId, Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root node's contents.
    pub fn source_file(&self) -> &SourceFile {
        match &self.nodes[self.root] {
            Node::SourceFile(file) => file,
            other => unreachable!("tree root must be a source file, found {other:?}"),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The expression at `id`, if that node is an expression.
    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        match self.nodes.get(id) {
            Some(Node::Expr(expr)) => Some(expr),
            _ => None,
        }
    }

    /// Number of nodes in the arena, including any built during error
    /// recovery that are not reachable from the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Import declarations, in source order.
    pub fn imports(&self) -> impl Iterator<Item = (NodeId, &Import)> {
        self.source_file()
            .imports
            .iter()
            .filter_map(move |&id| match &self.nodes[id] {
                Node::Import(import) => Some((id, import)),
                _ => None,
            })
    }

    /// Direct children of a node, in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id] {
            Node::SourceFile(file) => file
                .imports
                .iter()
                .chain(file.declarations.iter())
                .copied()
                .collect(),
            Node::Import(_) => Vec::new(),
            Node::Let(decl) => decl.type_ann.into_iter().chain([decl.value]).collect(),
            Node::Fun(decl) => decl
                .params
                .iter()
                .copied()
                .chain(decl.ret)
                .chain([decl.body])
                .collect(),
            Node::Class(decl) => decl
                .params
                .iter()
                .chain(decl.members.iter())
                .copied()
                .collect(),
            Node::Param(param) => vec![param.type_ann],
            Node::Block(block) => block.stmts.clone(),
            Node::Stmt(stmt) => match stmt {
                Stmt::Expr(expr) => vec![*expr],
                Stmt::Return(value) => value.iter().copied().collect(),
                Stmt::If {
                    condition,
                    then_block,
                    else_branch,
                } => [*condition, *then_block]
                    .into_iter()
                    .chain(*else_branch)
                    .collect(),
                Stmt::While { condition, body } => vec![*condition, *body],
                Stmt::Assign { value, .. } => vec![*value],
            },
            Node::Expr(expr) => match expr {
                Expr::Number(_)
                | Expr::String(_)
                | Expr::Bool(_)
                | Expr::Unit
                | Expr::Ident(_) => Vec::new(),
                Expr::Binary { left, right, .. } => vec![*left, *right],
                Expr::Unary { operand, .. } => vec![*operand],
                Expr::Call { callee, args } => {
                    std::iter::once(*callee).chain(args.iter().copied()).collect()
                }
                Expr::Member { object, .. } => vec![*object],
                Expr::Lambda(lambda) => {
                    let body = match lambda.body {
                        LambdaBody::Expr(id) | LambdaBody::Block(id) => id,
                    };
                    lambda
                        .params
                        .iter()
                        .copied()
                        .chain(lambda.ret)
                        .chain([body])
                        .collect()
                }
            },
            Node::Type(ty) => match ty {
                TypeExpr::Named(_) => Vec::new(),
                TypeExpr::Function { params, ret } => {
                    params.iter().copied().chain([*ret]).collect()
                }
            },
        }
    }

    /// Every node reachable from the root, in pre-order.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

/// Builds a [`SyntaxTree`] and its [`NodeLocations`] together, so that every
/// node receives exactly one location when it is created.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: IndexVec<NodeId, Node>,
    ranges: IndexVec<NodeId, SourceRange>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and record its source range.
    pub fn add(&mut self, node: Node, range: SourceRange) -> NodeId {
        let id = self.nodes.push(node);
        let located = self.ranges.push(range);
        debug_assert_eq!(id, located);
        id
    }

    pub fn add_expr(&mut self, expr: Expr, range: SourceRange) -> NodeId {
        self.add(Node::Expr(expr), range)
    }

    pub fn add_stmt(&mut self, stmt: Stmt, range: SourceRange) -> NodeId {
        self.add(Node::Stmt(stmt), range)
    }

    /// The range recorded for a node added earlier.
    pub fn range(&self, id: NodeId) -> SourceRange {
        self.ranges[id]
    }

    /// Finish building with `root` as the tree root.
    pub fn finish(self, root: NodeId) -> (SyntaxTree, NodeLocations) {
        let tree = SyntaxTree {
            nodes: self.nodes,
            root,
        };
        (tree, NodeLocations::from_ranges(self.ranges))
    }
}
