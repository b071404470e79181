//! Renders a [`JsProgram`] as JavaScript text.
//!
//! Two layouts: pretty (four-space indentation, one statement per line) at
//! [`OptimisationLevel::None`], and compact (no optional whitespace) at
//! [`OptimisationLevel::Simple`]. Parentheses come from operator precedence,
//! never from the shape of the Shed source. Output always ends with a
//! newline.

use crate::js::{JsExpr, JsFunction, JsProgram, JsProperty, JsStmt, JsUnaryOp};
use crate::level::OptimisationLevel;

const INDENT: &str = "    ";

/// Precedence of call arguments and initialisers: anything but a comma
/// expression.
const ASSIGNMENT: u8 = 2;

/// Render `program` in the layout for `level`.
pub fn write(program: &JsProgram, level: OptimisationLevel) -> String {
    let writer = Writer {
        pretty: level == OptimisationLevel::None,
    };
    let mut out = writer.stmts(&program.body, 0);
    out.push('\n');
    out
}

struct Writer {
    pretty: bool,
}

impl Writer {
    // ══════════════════════════════════════════════════════════════════════
    // Layout
    // ══════════════════════════════════════════════════════════════════════

    fn space(&self) -> &'static str {
        if self.pretty {
            " "
        } else {
            ""
        }
    }

    fn comma(&self) -> &'static str {
        if self.pretty {
            ", "
        } else {
            ","
        }
    }

    fn indent(&self, depth: usize) -> String {
        if self.pretty {
            INDENT.repeat(depth)
        } else {
            String::new()
        }
    }

    /// Statements at `depth`, without a trailing newline.
    fn stmts(&self, body: &[JsStmt], depth: usize) -> String {
        let rendered: Vec<String> = body
            .iter()
            .map(|s| format!("{}{}", self.indent(depth), self.stmt(s, depth)))
            .collect();
        rendered.join(if self.pretty { "\n" } else { "" })
    }

    /// `{ body }` whose contents sit at `depth + 1` and whose closing brace
    /// lines up with `depth`.
    fn block(&self, body: &[JsStmt], depth: usize) -> String {
        if body.is_empty() {
            return "{}".to_string();
        }
        if self.pretty {
            format!(
                "{{\n{}\n{}}}",
                self.stmts(body, depth + 1),
                self.indent(depth)
            )
        } else {
            format!("{{{}}}", self.stmts(body, depth + 1))
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn stmt(&self, stmt: &JsStmt, depth: usize) -> String {
        let sp = self.space();
        match stmt {
            JsStmt::Var { kind, name, init } => format!(
                "{} {name}{sp}={sp}{};",
                kind.keyword(),
                self.expr(init, ASSIGNMENT, depth)
            ),
            JsStmt::Function(function) => self.function(function, depth),
            JsStmt::Return(None) => "return;".to_string(),
            JsStmt::Return(Some(value)) => {
                format!("return {};", self.expr(value, 0, depth))
            }
            JsStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                let mut out = format!(
                    "if{sp}({}){sp}{}",
                    self.expr(condition, 0, depth),
                    self.block(then_body, depth)
                );
                match else_body.as_deref() {
                    None => {}
                    Some([nested @ JsStmt::If { .. }]) => {
                        out.push_str(&format!("{sp}else {}", self.stmt(nested, depth)));
                    }
                    Some(body) => {
                        out.push_str(&format!("{sp}else{sp}{}", self.block(body, depth)));
                    }
                }
                out
            }
            JsStmt::While { condition, body } => format!(
                "while{sp}({}){sp}{}",
                self.expr(condition, 0, depth),
                self.block(body, depth)
            ),
            JsStmt::Block(body) => self.block(body, depth),
            JsStmt::Expr(expr) => {
                let rendered = self.expr(expr, 0, depth);
                // A leading `function` or `{` would parse as a declaration
                // or a block.
                if starts_ambiguously(expr) {
                    format!("({rendered});")
                } else {
                    format!("{rendered};")
                }
            }
        }
    }

    fn function(&self, function: &JsFunction, depth: usize) -> String {
        let sp = self.space();
        let name = function
            .name
            .as_deref()
            .map(|n| format!(" {n}"))
            .unwrap_or_default();
        format!(
            "function{name}({}){sp}{}",
            function.params.join(self.comma()),
            self.block(&function.body, depth)
        )
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Render `expr`, parenthesised if it binds more loosely than
    /// `min_precedence`.
    fn expr(&self, expr: &JsExpr, min_precedence: u8, depth: usize) -> String {
        let rendered = self.bare_expr(expr, depth);
        if expr.precedence() < min_precedence {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn bare_expr(&self, expr: &JsExpr, depth: usize) -> String {
        let sp = self.space();
        match expr {
            JsExpr::Number(n) => format_number(*n),
            JsExpr::String(s) => quote(s),
            JsExpr::Bool(b) => b.to_string(),
            JsExpr::Undefined => "undefined".to_string(),
            JsExpr::Ident(name) => name.clone(),

            JsExpr::Binary { op, left, right } => {
                let precedence = op.precedence();
                let left = self.expr(left, precedence, depth);
                // Left-associative: an equal-precedence right operand needs
                // parentheses.
                let right = self.expr(right, precedence + 1, depth);
                let symbol = op.symbol();
                if self.pretty {
                    format!("{left} {symbol} {right}")
                } else if symbol.ends_with(['+', '-']) && right.starts_with(['+', '-']) {
                    format!("{left}{symbol} {right}")
                } else {
                    format!("{left}{symbol}{right}")
                }
            }
            JsExpr::Unary { op, operand } => {
                let rendered = self.expr(operand, expr.precedence(), depth);
                // `- -x` must not become `--x`.
                if *op == JsUnaryOp::Neg && rendered.starts_with('-') {
                    format!("-({rendered})")
                } else {
                    format!("{}{rendered}", op.symbol())
                }
            }

            JsExpr::Call { callee, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|a| self.expr(a, ASSIGNMENT + 1, depth))
                    .collect();
                format!(
                    "{}({})",
                    self.expr(callee, expr.precedence(), depth),
                    args.join(self.comma())
                )
            }
            JsExpr::Member { object, property } => {
                let object_text = match object.as_ref() {
                    // `1.x` would read as a malformed number.
                    JsExpr::Number(_) => format!("({})", self.bare_expr(object, depth)),
                    other => self.expr(other, expr.precedence(), depth),
                };
                format!("{object_text}.{property}")
            }

            JsExpr::Function(function) => self.function(function, depth),
            JsExpr::Object(properties) => self.object(properties, depth),
            JsExpr::Assign { target, value } => {
                format!("{target}{sp}={sp}{}", self.expr(value, ASSIGNMENT, depth))
            }
        }
    }

    fn object(&self, properties: &[JsProperty], depth: usize) -> String {
        if properties.is_empty() {
            return "{}".to_string();
        }
        let sp = self.space();
        let entries: Vec<String> = properties
            .iter()
            .map(|p| {
                let entry = match p {
                    JsProperty::Value { key, value } => {
                        format!("{key}:{sp}{}", self.expr(value, ASSIGNMENT + 1, depth + 1))
                    }
                    JsProperty::Getter { key, value } => format!(
                        "get {key}(){sp}{}",
                        self.block(&[JsStmt::Return(Some(value.clone()))], depth + 1)
                    ),
                };
                format!("{}{entry}", self.indent(depth + 1))
            })
            .collect();

        if self.pretty {
            format!("{{\n{}\n{}}}", entries.join(",\n"), self.indent(depth))
        } else {
            format!("{{{}}}", entries.join(","))
        }
    }
}

/// Whether `expr`, placed at the start of a statement, would begin with
/// `function` or `{`.
fn starts_ambiguously(expr: &JsExpr) -> bool {
    match expr {
        JsExpr::Function(_) | JsExpr::Object(_) => true,
        JsExpr::Call { callee, .. } => starts_ambiguously(callee),
        JsExpr::Member { object, .. } => {
            !matches!(object.as_ref(), JsExpr::Number(_)) && starts_ambiguously(object)
        }
        JsExpr::Binary { left, .. } => {
            left.precedence() >= expr.precedence() && starts_ambiguously(left)
        }
        _ => false,
    }
}

/// JavaScript spelling of a number literal.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        n.to_string()
    }
}

/// A double-quoted JavaScript string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{JsBinaryOp, VarKind};

    fn bin(op: JsBinaryOp, l: JsExpr, r: JsExpr) -> JsExpr {
        JsExpr::Binary {
            op,
            left: Box::new(l),
            right: Box::new(r),
        }
    }

    fn pretty(body: Vec<JsStmt>) -> String {
        write(&JsProgram { body }, OptimisationLevel::None)
    }

    fn compact(body: Vec<JsStmt>) -> String {
        write(&JsProgram { body }, OptimisationLevel::Simple)
    }

    fn x() -> JsExpr {
        JsExpr::ident("x")
    }

    #[test]
    fn test_numbers() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
        assert_eq!(quote("\u{2028}"), r#""\u2028""#);
        assert_eq!(quote("héllo"), "\"héllo\"");
    }

    #[test]
    fn test_precedence_parentheses() {
        // (x + 1) * 2
        let e = bin(JsBinaryOp::Mul, bin(JsBinaryOp::Add, x(), JsExpr::Number(1.0)), JsExpr::Number(2.0));
        assert_eq!(pretty(vec![JsStmt::Expr(e)]), "(x + 1) * 2;\n");
        // x - (1 - 2) keeps its grouping; (x - 1) - 2 does not need it.
        let right = bin(JsBinaryOp::Sub, x(), bin(JsBinaryOp::Sub, JsExpr::Number(1.0), JsExpr::Number(2.0)));
        assert_eq!(pretty(vec![JsStmt::Expr(right)]), "x - (1 - 2);\n");
        let left = bin(JsBinaryOp::Sub, bin(JsBinaryOp::Sub, x(), JsExpr::Number(1.0)), JsExpr::Number(2.0));
        assert_eq!(pretty(vec![JsStmt::Expr(left)]), "x - 1 - 2;\n");
    }

    #[test]
    fn test_compact_separates_signs() {
        let e = bin(JsBinaryOp::Sub, x(), JsExpr::Number(-1.0));
        assert_eq!(compact(vec![JsStmt::Expr(e)]), "x- -1;\n");
        let e = bin(JsBinaryOp::Add, x(), JsExpr::Number(1.0));
        assert_eq!(compact(vec![JsStmt::Expr(e)]), "x+1;\n");
    }

    #[test]
    fn test_double_negation() {
        let e = JsExpr::Unary {
            op: JsUnaryOp::Neg,
            operand: Box::new(JsExpr::Number(-2.0)),
        };
        assert_eq!(pretty(vec![JsStmt::Expr(e)]), "-(-2);\n");
    }

    #[test]
    fn test_member_on_number_literal() {
        let e = JsExpr::member(JsExpr::Number(5.0), "x");
        assert_eq!(pretty(vec![JsStmt::Expr(e)]), "(5).x;\n");
    }

    #[test]
    fn test_function_expression_statement_is_wrapped() {
        let f = JsExpr::Function(Box::new(JsFunction {
            name: None,
            params: vec![],
            body: vec![],
        }));
        let stmt = JsStmt::Expr(JsExpr::call(f, vec![]));
        assert_eq!(pretty(vec![stmt]), "(function() {}());\n");
    }

    #[test]
    fn test_pretty_blocks() {
        let body = vec![JsStmt::Function(JsFunction {
            name: Some("f".into()),
            params: vec!["a".into(), "b".into()],
            body: vec![JsStmt::If {
                condition: x(),
                then_body: vec![JsStmt::Return(Some(JsExpr::ident("a")))],
                else_body: Some(vec![JsStmt::Return(None)]),
            }],
        })];
        assert_eq!(
            pretty(body),
            "function f(a, b) {\n    if (x) {\n        return a;\n    } else {\n        return;\n    }\n}\n"
        );
    }

    #[test]
    fn test_else_if_chain() {
        let inner = JsStmt::If {
            condition: JsExpr::ident("y"),
            then_body: vec![],
            else_body: None,
        };
        let outer = JsStmt::If {
            condition: x(),
            then_body: vec![],
            else_body: Some(vec![inner]),
        };
        assert_eq!(pretty(vec![outer.clone()]), "if (x) {} else if (y) {}\n");
        assert_eq!(compact(vec![outer]), "if(x){}else if(y){}\n");
    }

    #[test]
    fn test_object_layouts() {
        let object = JsExpr::Object(vec![
            JsProperty::Value {
                key: "a".into(),
                value: JsExpr::ident("a"),
            },
            JsProperty::Getter {
                key: "n".into(),
                value: JsExpr::ident("n"),
            },
        ]);
        let stmt = JsStmt::Var {
            kind: VarKind::Const,
            name: "o".into(),
            init: object,
        };
        assert_eq!(
            pretty(vec![stmt.clone()]),
            "const o = {\n    a: a,\n    get n() {\n        return n;\n    }\n};\n"
        );
        assert_eq!(compact(vec![stmt]), "const o={a:a,get n(){return n;}};\n");
    }

    #[test]
    fn test_empty_program_is_one_newline() {
        assert_eq!(pretty(vec![]), "\n");
        assert_eq!(compact(vec![]), "\n");
    }
}
