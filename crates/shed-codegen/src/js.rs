//! The JavaScript target tree.
//!
//! Purely structural: it knows nothing about Shed. The generator builds it
//! and the [`writer`](crate::writer) renders it.

/// A whole generated script or module body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsProgram {
    pub body: Vec<JsStmt>,
}

/// Declaration keyword for [`JsStmt::Var`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// Statements.
#[derive(Debug, Clone, PartialEq)]
pub enum JsStmt {
    /// `kind name = init;`
    Var {
        kind: VarKind,
        name: String,
        init: JsExpr,
    },
    /// `function name(params) { body }`
    Function(JsFunction),
    /// `return [value];`
    Return(Option<JsExpr>),
    /// `if (condition) { then_body } [else { else_body }]`
    If {
        condition: JsExpr,
        then_body: Vec<JsStmt>,
        else_body: Option<Vec<JsStmt>>,
    },
    /// `while (condition) { body }`
    While {
        condition: JsExpr,
        body: Vec<JsStmt>,
    },
    /// `{ ... }`
    Block(Vec<JsStmt>),
    /// `expr;`
    Expr(JsExpr),
}

/// A function, used both as a declaration and as an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsFunction {
    /// `None` for anonymous function expressions.
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<JsStmt>,
}

/// Binary operators, covering what Shed lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    StrictEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl JsBinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            JsBinaryOp::Add => "+",
            JsBinaryOp::Sub => "-",
            JsBinaryOp::Mul => "*",
            JsBinaryOp::Div => "/",
            JsBinaryOp::Mod => "%",
            JsBinaryOp::StrictEq => "===",
            JsBinaryOp::StrictNotEq => "!==",
            JsBinaryOp::Less => "<",
            JsBinaryOp::LessEq => "<=",
            JsBinaryOp::Greater => ">",
            JsBinaryOp::GreaterEq => ">=",
            JsBinaryOp::And => "&&",
            JsBinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            JsBinaryOp::Or => 3,
            JsBinaryOp::And => 4,
            JsBinaryOp::StrictEq | JsBinaryOp::StrictNotEq => 8,
            JsBinaryOp::Less | JsBinaryOp::LessEq | JsBinaryOp::Greater | JsBinaryOp::GreaterEq => 9,
            JsBinaryOp::Add | JsBinaryOp::Sub => 11,
            JsBinaryOp::Mul | JsBinaryOp::Div | JsBinaryOp::Mod => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsUnaryOp {
    Neg,
    Not,
}

impl JsUnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            JsUnaryOp::Neg => "-",
            JsUnaryOp::Not => "!",
        }
    }
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum JsExpr {
    Number(f64),
    String(String),
    Bool(bool),
    Undefined,
    Ident(String),
    Binary {
        op: JsBinaryOp,
        left: Box<JsExpr>,
        right: Box<JsExpr>,
    },
    Unary {
        op: JsUnaryOp,
        operand: Box<JsExpr>,
    },
    Call {
        callee: Box<JsExpr>,
        args: Vec<JsExpr>,
    },
    Member {
        object: Box<JsExpr>,
        property: String,
    },
    Function(Box<JsFunction>),
    Object(Vec<JsProperty>),
    /// `target = value`
    Assign {
        target: String,
        value: Box<JsExpr>,
    },
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum JsProperty {
    /// `key: value`
    Value { key: String, value: JsExpr },
    /// `get key() { return value; }`, for bindings that may be reassigned.
    Getter { key: String, value: JsExpr },
}

impl JsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        JsExpr::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        JsExpr::String(value.into())
    }

    pub fn member(object: JsExpr, property: impl Into<String>) -> Self {
        JsExpr::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn call(callee: JsExpr, args: Vec<JsExpr>) -> Self {
        JsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// A dotted host path such as `console.log`, as a member chain.
    pub fn path(dotted: &str) -> Self {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        parts.fold(JsExpr::ident(first), |object, part| JsExpr::member(object, part))
    }

    /// Binding strength of this expression as an operand; higher binds
    /// tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            JsExpr::Assign { .. } => 2,
            JsExpr::Binary { op, .. } => op.precedence(),
            JsExpr::Unary { .. } => 14,
            // A negative literal renders with a leading `-`.
            JsExpr::Number(n) if n.is_sign_negative() => 14,
            JsExpr::Call { .. } | JsExpr::Member { .. } => 17,
            _ => 20,
        }
    }
}
