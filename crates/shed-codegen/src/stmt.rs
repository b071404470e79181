//! Declaration and statement lowering.
//!
//! `let` lowers to `const` and `var` to `let`, so Shed's block scoping
//! carries over unchanged. A class lowers to a constructor function that
//! returns an object of its members.

use shed_types::ast::{ClassDecl, FunDecl, LetDecl, Node, NodeId, Stmt};

use crate::compiler::{property, Lowering};
use crate::error::{CodegenError, CodegenResult};
use crate::js::{JsExpr, JsFunction, JsStmt, VarKind};
use crate::names::js_name;

impl Lowering<'_> {
    /// Lower a statement list held by a block node.
    pub(crate) fn block(&self, id: NodeId) -> CodegenResult<Vec<JsStmt>> {
        match self.node(id) {
            Node::Block(block) => block.stmts.iter().map(|&s| self.statement(s)).collect(),
            _ => Err(CodegenError::UnexpectedNode {
                expected: "block",
                node: id,
            }),
        }
    }

    /// Lower a `let`, `var`, `fun` or `class` declaration.
    pub(crate) fn declaration(&self, id: NodeId) -> CodegenResult<JsStmt> {
        match self.node(id) {
            Node::Let(decl) => self.let_decl(decl),
            Node::Fun(decl) => self.fun_decl(decl),
            Node::Class(decl) => self.class_decl(decl),
            _ => Err(CodegenError::UnexpectedNode {
                expected: "declaration",
                node: id,
            }),
        }
    }

    /// Lower any statement that may appear in a block.
    pub(crate) fn statement(&self, id: NodeId) -> CodegenResult<JsStmt> {
        let stmt = match self.node(id) {
            Node::Let(_) | Node::Fun(_) => return self.declaration(id),
            Node::Stmt(stmt) => stmt,
            _ => {
                return Err(CodegenError::UnexpectedNode {
                    expected: "statement",
                    node: id,
                })
            }
        };

        Ok(match stmt {
            Stmt::Expr(expr) => JsStmt::Expr(self.expr(*expr)?),
            Stmt::Return(value) => JsStmt::Return(value.map(|v| self.expr(v)).transpose()?),
            Stmt::If {
                condition,
                then_block,
                else_branch,
            } => JsStmt::If {
                condition: self.expr(*condition)?,
                then_body: self.block(*then_block)?,
                else_body: else_branch.map(|e| self.else_branch(e)).transpose()?,
            },
            Stmt::While { condition, body } => JsStmt::While {
                condition: self.expr(*condition)?,
                body: self.block(*body)?,
            },
            Stmt::Assign { target, value } => JsStmt::Expr(JsExpr::Assign {
                target: js_name(target),
                value: Box::new(self.expr(*value)?),
            }),
        })
    }

    // ── Declarations ──────────────────────────────────────────────────────

    fn let_decl(&self, decl: &LetDecl) -> CodegenResult<JsStmt> {
        Ok(JsStmt::Var {
            kind: if decl.mutable {
                VarKind::Let
            } else {
                VarKind::Const
            },
            name: js_name(&decl.name),
            init: self.expr(decl.value)?,
        })
    }

    fn fun_decl(&self, decl: &FunDecl) -> CodegenResult<JsStmt> {
        Ok(JsStmt::Function(JsFunction {
            name: Some(js_name(&decl.name)),
            params: self.params(&decl.params)?,
            body: self.block(decl.body)?,
        }))
    }

    /// ```text
    /// function Counter(start) {
    ///     let count = start;
    ///     function bump() { ... }
    ///     return { start: start, get count() { return count; }, bump: bump };
    /// }
    /// ```
    fn class_decl(&self, decl: &ClassDecl) -> CodegenResult<JsStmt> {
        let mut body = Vec::with_capacity(decl.members.len() + 1);
        let mut fields = Vec::with_capacity(decl.params.len() + decl.members.len());

        for &param in &decl.params {
            fields.push(property(self.param_name(param)?, false));
        }
        for &member in &decl.members {
            body.push(self.declaration(member)?);
            let (name, mutable) = match self.node(member) {
                Node::Let(d) => (&d.name, d.mutable),
                Node::Fun(d) => (&d.name, false),
                _ => {
                    return Err(CodegenError::UnexpectedNode {
                        expected: "class member",
                        node: member,
                    })
                }
            };
            fields.push(property(name, mutable));
        }
        body.push(JsStmt::Return(Some(JsExpr::Object(fields))));

        Ok(JsStmt::Function(JsFunction {
            name: Some(js_name(&decl.name)),
            params: self.params(&decl.params)?,
            body,
        }))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn else_branch(&self, id: NodeId) -> CodegenResult<Vec<JsStmt>> {
        match self.node(id) {
            // `else if` chains stay chained.
            Node::Stmt(Stmt::If { .. }) => Ok(vec![self.statement(id)?]),
            _ => self.block(id),
        }
    }

    pub(crate) fn params(&self, params: &[NodeId]) -> CodegenResult<Vec<String>> {
        params
            .iter()
            .map(|&p| self.param_name(p).map(js_name))
            .collect()
    }

    fn param_name(&self, id: NodeId) -> CodegenResult<&str> {
        match self.node(id) {
            Node::Param(param) => Ok(&param.name),
            _ => Err(CodegenError::UnexpectedNode {
                expected: "parameter",
                node: id,
            }),
        }
    }
}
