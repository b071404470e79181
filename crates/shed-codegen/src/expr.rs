//! Expression lowering.
//!
//! Shed's operators map one-to-one onto JavaScript's, except that equality
//! is strict. Identifiers are spelled according to the checker's
//! resolution: host builtins by their host path, everything else by its
//! escaped Shed name.

use shed_types::ast::{BinaryOp, Expr, Lambda, LambdaBody, Node, NodeId, UnaryOp};
use shed_types::Resolution;

use crate::compiler::Lowering;
use crate::error::{CodegenError, CodegenResult};
use crate::js::{JsBinaryOp, JsExpr, JsFunction, JsStmt, JsUnaryOp};
use crate::names::js_name;

impl Lowering<'_> {
    pub(crate) fn expr(&self, id: NodeId) -> CodegenResult<JsExpr> {
        let expr = match self.node(id) {
            Node::Expr(expr) => expr,
            _ => {
                return Err(CodegenError::UnexpectedNode {
                    expected: "expression",
                    node: id,
                })
            }
        };

        Ok(match expr {
            // ── Literals ──────────────────────────────────────────────────
            Expr::Number(n) => JsExpr::Number(*n),
            Expr::String(s) => JsExpr::String(s.clone()),
            Expr::Bool(b) => JsExpr::Bool(*b),
            Expr::Unit => JsExpr::Undefined,

            // ── Names ─────────────────────────────────────────────────────
            Expr::Ident(name) => self.identifier(id, name)?,

            // ── Operators ─────────────────────────────────────────────────
            Expr::Binary { op, left, right } => JsExpr::Binary {
                op: binary_op(*op),
                left: Box::new(self.expr(*left)?),
                right: Box::new(self.expr(*right)?),
            },
            Expr::Unary { op, operand } => JsExpr::Unary {
                op: match op {
                    UnaryOp::Neg => JsUnaryOp::Neg,
                    UnaryOp::Not => JsUnaryOp::Not,
                },
                operand: Box::new(self.expr(*operand)?),
            },

            // ── Calls and members ─────────────────────────────────────────
            Expr::Call { callee, args } => JsExpr::call(
                self.expr(*callee)?,
                args.iter()
                    .map(|&a| self.expr(a))
                    .collect::<CodegenResult<_>>()?,
            ),
            Expr::Member { object, member } => JsExpr::member(self.expr(*object)?, member.clone()),

            Expr::Lambda(lambda) => self.lambda(lambda)?,
        })
    }

    fn identifier(&self, id: NodeId, name: &str) -> CodegenResult<JsExpr> {
        match self.resolutions.get(id) {
            Some(Resolution::Builtin { js }) => Ok(JsExpr::path(js)),
            Some(Resolution::Declared) | Some(Resolution::Import { .. }) => {
                Ok(JsExpr::ident(js_name(name)))
            }
            None => Err(CodegenError::UnresolvedIdentifier {
                name: name.to_string(),
                node: id,
            }),
        }
    }

    fn lambda(&self, lambda: &Lambda) -> CodegenResult<JsExpr> {
        let body = match lambda.body {
            LambdaBody::Expr(e) => vec![JsStmt::Return(Some(self.expr(e)?))],
            LambdaBody::Block(b) => self.block(b)?,
        };
        Ok(JsExpr::Function(Box::new(JsFunction {
            name: None,
            params: self.params(&lambda.params)?,
            body,
        })))
    }
}

fn binary_op(op: BinaryOp) -> JsBinaryOp {
    match op {
        BinaryOp::Add => JsBinaryOp::Add,
        BinaryOp::Sub => JsBinaryOp::Sub,
        BinaryOp::Mul => JsBinaryOp::Mul,
        BinaryOp::Div => JsBinaryOp::Div,
        BinaryOp::Mod => JsBinaryOp::Mod,
        BinaryOp::Eq => JsBinaryOp::StrictEq,
        BinaryOp::NotEq => JsBinaryOp::StrictNotEq,
        BinaryOp::Less => JsBinaryOp::Less,
        BinaryOp::LessEq => JsBinaryOp::LessEq,
        BinaryOp::Greater => JsBinaryOp::Greater,
        BinaryOp::GreaterEq => JsBinaryOp::GreaterEq,
        BinaryOp::And => JsBinaryOp::And,
        BinaryOp::Or => JsBinaryOp::Or,
    }
}
