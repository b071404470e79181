//! `SIMPLE` optimisations on the target tree.
//!
//! Literal-only constant folding and removal of branches whose condition
//! folds to a constant. Nothing here changes observable behaviour: calls,
//! assignments and other side effects are never folded away.

use crate::js::{JsBinaryOp, JsExpr, JsFunction, JsProgram, JsProperty, JsStmt, JsUnaryOp};

/// Fold constants and drop dead branches in place.
pub fn simplify(program: &mut JsProgram) {
    program.body = stmts(std::mem::take(&mut program.body));
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

fn stmts(body: Vec<JsStmt>) -> Vec<JsStmt> {
    body.into_iter().flat_map(stmt).collect()
}

/// One statement becomes zero or more.
fn stmt(stmt: JsStmt) -> Vec<JsStmt> {
    match stmt {
        JsStmt::Var { kind, name, init } => vec![JsStmt::Var {
            kind,
            name,
            init: expr(init),
        }],
        JsStmt::Function(function) => vec![JsStmt::Function(self::function(function))],
        JsStmt::Return(value) => vec![JsStmt::Return(value.map(expr))],
        JsStmt::If {
            condition,
            then_body,
            else_body,
        } => match expr(condition) {
            JsExpr::Bool(true) => splice(stmts(then_body)),
            JsExpr::Bool(false) => else_body.map(|b| splice(stmts(b))).unwrap_or_default(),
            condition => vec![JsStmt::If {
                condition,
                then_body: stmts(then_body),
                else_body: else_body.map(stmts),
            }],
        },
        JsStmt::While { condition, body } => match expr(condition) {
            JsExpr::Bool(false) => Vec::new(),
            condition => vec![JsStmt::While {
                condition,
                body: stmts(body),
            }],
        },
        JsStmt::Block(body) => vec![JsStmt::Block(stmts(body))],
        JsStmt::Expr(e) => vec![JsStmt::Expr(expr(e))],
    }
}

/// Inline a surviving branch, keeping a block around it if it declares
/// names that must stay scoped.
fn splice(body: Vec<JsStmt>) -> Vec<JsStmt> {
    let declares = body
        .iter()
        .any(|s| matches!(s, JsStmt::Var { .. } | JsStmt::Function(_)));
    if declares {
        vec![JsStmt::Block(body)]
    } else {
        body
    }
}

fn function(mut function: JsFunction) -> JsFunction {
    function.body = stmts(function.body);
    function
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

fn expr(e: JsExpr) -> JsExpr {
    match e {
        JsExpr::Binary { op, left, right } => binary(op, expr(*left), expr(*right)),
        JsExpr::Unary { op, operand } => match (op, expr(*operand)) {
            (JsUnaryOp::Neg, JsExpr::Number(n)) => JsExpr::Number(-n),
            (JsUnaryOp::Not, JsExpr::Bool(b)) => JsExpr::Bool(!b),
            (op, operand) => JsExpr::Unary {
                op,
                operand: Box::new(operand),
            },
        },
        JsExpr::Call { callee, args } => JsExpr::Call {
            callee: Box::new(expr(*callee)),
            args: args.into_iter().map(expr).collect(),
        },
        JsExpr::Member { object, property } => JsExpr::Member {
            object: Box::new(expr(*object)),
            property,
        },
        JsExpr::Function(f) => JsExpr::Function(Box::new(function(*f))),
        JsExpr::Object(properties) => JsExpr::Object(
            properties
                .into_iter()
                .map(|p| match p {
                    JsProperty::Value { key, value } => JsProperty::Value {
                        key,
                        value: expr(value),
                    },
                    JsProperty::Getter { key, value } => JsProperty::Getter {
                        key,
                        value: expr(value),
                    },
                })
                .collect(),
        ),
        JsExpr::Assign { target, value } => JsExpr::Assign {
            target,
            value: Box::new(expr(*value)),
        },
        literal => literal,
    }
}

fn binary(op: JsBinaryOp, left: JsExpr, right: JsExpr) -> JsExpr {
    use JsBinaryOp::*;
    use JsExpr::{Bool, Number, String};

    let folded = match (op, &left, &right) {
        (Add, Number(a), Number(b)) => Some(Number(a + b)),
        (Sub, Number(a), Number(b)) => Some(Number(a - b)),
        (Mul, Number(a), Number(b)) => Some(Number(a * b)),
        // Division by zero is left for the host to evaluate.
        (Div, Number(a), Number(b)) if *b != 0.0 => Some(Number(a / b)),
        (Mod, Number(a), Number(b)) if *b != 0.0 => Some(Number(a % b)),
        (Less, Number(a), Number(b)) => Some(Bool(a < b)),
        (LessEq, Number(a), Number(b)) => Some(Bool(a <= b)),
        (Greater, Number(a), Number(b)) => Some(Bool(a > b)),
        (GreaterEq, Number(a), Number(b)) => Some(Bool(a >= b)),
        (StrictEq, Number(a), Number(b)) => Some(Bool(a == b)),
        (StrictNotEq, Number(a), Number(b)) => Some(Bool(a != b)),

        (Add, String(a), String(b)) => Some(String(format!("{a}{b}"))),
        (StrictEq, String(a), String(b)) => Some(Bool(a == b)),
        (StrictNotEq, String(a), String(b)) => Some(Bool(a != b)),

        (StrictEq, Bool(a), Bool(b)) => Some(Bool(a == b)),
        (StrictNotEq, Bool(a), Bool(b)) => Some(Bool(a != b)),

        // Short-circuiting on a literal left operand.
        (And, Bool(false), _) => Some(Bool(false)),
        (And, Bool(true), _) => Some(right.clone()),
        (Or, Bool(true), _) => Some(Bool(true)),
        (Or, Bool(false), _) => Some(right.clone()),
        _ => None,
    };

    folded.unwrap_or_else(|| JsExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::VarKind;

    fn num(n: f64) -> JsExpr {
        JsExpr::Number(n)
    }

    fn bin(op: JsBinaryOp, l: JsExpr, r: JsExpr) -> JsExpr {
        JsExpr::Binary {
            op,
            left: Box::new(l),
            right: Box::new(r),
        }
    }

    fn call(name: &str) -> JsStmt {
        JsStmt::Expr(JsExpr::call(JsExpr::ident(name), vec![]))
    }

    #[test]
    fn test_folds_nested_arithmetic() {
        let e = bin(JsBinaryOp::Mul, bin(JsBinaryOp::Add, num(1.0), num(2.0)), num(4.0));
        assert_eq!(expr(e), num(12.0));
    }

    #[test]
    fn test_keeps_division_by_zero() {
        let e = bin(JsBinaryOp::Div, num(1.0), num(0.0));
        assert_eq!(expr(e.clone()), e);
        let e = bin(JsBinaryOp::Mod, num(1.0), num(0.0));
        assert_eq!(expr(e.clone()), e);
    }

    #[test]
    fn test_folds_strings_and_comparisons() {
        let e = bin(JsBinaryOp::Add, JsExpr::string("a"), JsExpr::string("b"));
        assert_eq!(expr(e), JsExpr::string("ab"));
        let e = bin(JsBinaryOp::Less, num(1.0), num(2.0));
        assert_eq!(expr(e), JsExpr::Bool(true));
        let e = bin(JsBinaryOp::StrictNotEq, JsExpr::Bool(true), JsExpr::Bool(true));
        assert_eq!(expr(e), JsExpr::Bool(false));
    }

    #[test]
    fn test_does_not_fold_mixed_or_non_literal_operands() {
        let e = bin(JsBinaryOp::Add, JsExpr::ident("x"), num(1.0));
        assert_eq!(expr(e.clone()), e);
        let e = bin(JsBinaryOp::StrictEq, num(1.0), JsExpr::string("1"));
        assert_eq!(expr(e.clone()), e);
    }

    #[test]
    fn test_short_circuit_keeps_right_side_effects() {
        let f = JsExpr::call(JsExpr::ident("f"), vec![]);
        assert_eq!(expr(bin(JsBinaryOp::And, JsExpr::Bool(true), f.clone())), f);
        assert_eq!(
            expr(bin(JsBinaryOp::Or, JsExpr::Bool(true), f)),
            JsExpr::Bool(true)
        );
    }

    #[test]
    fn test_unary_folding() {
        let neg = JsExpr::Unary {
            op: JsUnaryOp::Neg,
            operand: Box::new(num(3.0)),
        };
        assert_eq!(expr(neg), num(-3.0));
        let not = JsExpr::Unary {
            op: JsUnaryOp::Not,
            operand: Box::new(bin(JsBinaryOp::Greater, num(1.0), num(2.0))),
        };
        assert_eq!(expr(not), JsExpr::Bool(true));
    }

    #[test]
    fn test_constant_if_keeps_taken_branch() {
        let mut program = JsProgram {
            body: vec![JsStmt::If {
                condition: bin(JsBinaryOp::Less, num(1.0), num(2.0)),
                then_body: vec![call("a")],
                else_body: Some(vec![call("b")]),
            }],
        };
        simplify(&mut program);
        assert_eq!(program.body, vec![call("a")]);
    }

    #[test]
    fn test_false_if_without_else_vanishes() {
        let mut program = JsProgram {
            body: vec![
                JsStmt::If {
                    condition: JsExpr::Bool(false),
                    then_body: vec![call("a")],
                    else_body: None,
                },
                call("b"),
            ],
        };
        simplify(&mut program);
        assert_eq!(program.body, vec![call("b")]);
    }

    #[test]
    fn test_spliced_branch_with_declarations_stays_scoped() {
        let decl = JsStmt::Var {
            kind: VarKind::Const,
            name: "x".into(),
            init: num(1.0),
        };
        let mut program = JsProgram {
            body: vec![JsStmt::If {
                condition: JsExpr::Bool(true),
                then_body: vec![decl.clone()],
                else_body: None,
            }],
        };
        simplify(&mut program);
        assert_eq!(program.body, vec![JsStmt::Block(vec![decl])]);
    }

    #[test]
    fn test_while_false_removed_and_while_true_kept() {
        let mut program = JsProgram {
            body: vec![
                JsStmt::While {
                    condition: JsExpr::Bool(false),
                    body: vec![call("a")],
                },
                JsStmt::While {
                    condition: JsExpr::Bool(true),
                    body: vec![call("b")],
                },
            ],
        };
        simplify(&mut program);
        assert_eq!(program.body.len(), 1);
        assert!(matches!(
            program.body[0],
            JsStmt::While {
                condition: JsExpr::Bool(true),
                ..
            }
        ));
    }

    #[test]
    fn test_folds_inside_function_expressions() {
        let mut program = JsProgram {
            body: vec![JsStmt::Expr(JsExpr::Function(Box::new(JsFunction {
                name: None,
                params: vec![],
                body: vec![JsStmt::Return(Some(bin(JsBinaryOp::Sub, num(5.0), num(2.0))))],
            })))],
        };
        simplify(&mut program);
        let JsStmt::Expr(JsExpr::Function(f)) = &program.body[0] else {
            panic!("expected function expression");
        };
        assert_eq!(f.body, vec![JsStmt::Return(Some(num(3.0)))]);
    }
}
