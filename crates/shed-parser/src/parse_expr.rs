//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 7. `||`
//! 6. `&&`
//! 5. `==`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. unary `-`, `!`
//! 0. `.` (member access), `()` (call)
//!
//! All binary operators are left-associative. An infix or postfix operator
//! continues an expression only when it sits on the same line, because a
//! line break may end a statement.

use shed_lexer::TokenKind;
use shed_types::ast::*;

use crate::parser::Parser;

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<NodeId> {
        self.enter()?;
        let result = self.parse_or();
        self.leave();
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// One left-associative level: `operand { op operand }`.
    fn parse_binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        operand: fn(&mut Self) -> Option<NodeId>,
    ) -> Option<NodeId> {
        let mut left = operand(self)?;
        // Each operator deepens the left spine by one node.
        let mut links = 0;
        while let Some(&(_, op)) = operators
            .iter()
            .find(|(kind, _)| self.check_continuation(*kind))
        {
            if self.enter().is_none() {
                self.leave_many(links);
                return None;
            }
            links += 1;
            self.advance(); // consume operator
            let Some(right) = operand(self) else {
                self.leave_many(links);
                return None;
            };
            let range = self.builder.range(left).merge(self.builder.range(right));
            left = self.builder.add_expr(Expr::Binary { op, left, right }, range);
        }
        self.leave_many(links);
        Some(left)
    }

    /// `OrExpr = AndExpr { "||" AndExpr }`
    fn parse_or(&mut self) -> Option<NodeId> {
        self.parse_binary_level(&[(TokenKind::OrOr, BinaryOp::Or)], Self::parse_and)
    }

    /// `AndExpr = EqExpr { "&&" EqExpr }`
    fn parse_and(&mut self) -> Option<NodeId> {
        self.parse_binary_level(&[(TokenKind::AndAnd, BinaryOp::And)], Self::parse_equality)
    }

    /// `EqExpr = CmpExpr { ("==" | "!=") CmpExpr }`
    fn parse_equality(&mut self) -> Option<NodeId> {
        self.parse_binary_level(
            &[
                (TokenKind::EqEq, BinaryOp::Eq),
                (TokenKind::BangEq, BinaryOp::NotEq),
            ],
            Self::parse_comparison,
        )
    }

    /// `CmpExpr = AddExpr { ("<" | "<=" | ">" | ">=") AddExpr }`
    fn parse_comparison(&mut self) -> Option<NodeId> {
        self.parse_binary_level(
            &[
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEq, BinaryOp::LessEq),
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEq, BinaryOp::GreaterEq),
            ],
            Self::parse_add,
        )
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<NodeId> {
        self.parse_binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
            ],
            Self::parse_mul,
        )
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> Option<NodeId> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
            Self::parse_unary,
        )
    }

    /// `UnaryExpr = ("-" | "!") UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> Option<NodeId> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().range();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;
        let range = start.merge(self.builder.range(operand));
        Some(self.builder.add_expr(Expr::Unary { op, operand }, range))
    }

    /// `PostfixExpr = Primary { "(" args ")" | "." ident }`
    fn parse_postfix(&mut self) -> Option<NodeId> {
        let primary = self.parse_primary()?;
        let mut links = 0;
        let result = self.parse_postfix_chain(primary, &mut links);
        self.leave_many(links);
        result
    }

    /// Calls and member accesses applied to `expr`; every step counts as
    /// one level of nesting.
    fn parse_postfix_chain(&mut self, mut expr: NodeId, links: &mut u32) -> Option<NodeId> {
        loop {
            let call = self.check_continuation(TokenKind::LParen);
            if !call && !self.check_continuation(TokenKind::Dot) {
                return Some(expr);
            }
            self.enter()?;
            *links += 1;
            if call {
                let args = self.parse_args()?;
                let range = self.range_from(self.builder.range(expr));
                expr = self.builder.add_expr(Expr::Call { callee: expr, args }, range);
            } else {
                self.advance(); // eat `.`
                let member = self.expect_identifier()?;
                let range = self.range_from(self.builder.range(expr));
                expr = self
                    .builder
                    .add_expr(Expr::Member { object: expr, member }, range);
            }
        }
    }

    /// `( [ expr { , expr } ] )`
    fn parse_args(&mut self) -> Option<Vec<NodeId>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        match self.peek_kind() {
            TokenKind::Number => {
                let token = self.advance();
                let text = token.token.value.unwrap_or(token.token.raw);
                match text.parse::<f64>() {
                    Ok(value) => Some(self.builder.add_expr(Expr::Number(value), start)),
                    Err(_) => {
                        self.error_at(format!("invalid number literal '{text}'"), start);
                        None
                    }
                }
            }
            TokenKind::String => {
                let token = self.advance();
                let value = token.token.value.unwrap_or_default();
                Some(self.builder.add_expr(Expr::String(value), start))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.advance().kind() == TokenKind::True;
                Some(self.builder.add_expr(Expr::Bool(value), start))
            }
            TokenKind::Identifier => {
                let name = self.expect_identifier()?;
                Some(self.builder.add_expr(Expr::Ident(name), start))
            }
            TokenKind::LParen => {
                self.advance(); // eat `(`
                if self.eat(TokenKind::RParen) {
                    return Some(self.builder.add_expr(Expr::Unit, self.range_from(start)));
                }
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Some(inner)
            }
            TokenKind::Fun => self.parse_lambda(),
            other => {
                self.error_at_current(format!("expected expression, got '{other}'"));
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Lambda
    // ══════════════════════════════════════════════════════════════════════════

    /// `fun(params) [: Type] => expr` or `fun(params) [: Type] { ... }`
    fn parse_lambda(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `fun`
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let body = if self.eat(TokenKind::FatArrow) {
            LambdaBody::Expr(self.parse_expression()?)
        } else if self.check(TokenKind::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            self.error_at_current(format!(
                "expected '=>' or '{{' after lambda parameters, got '{}'",
                self.peek_kind()
            ));
            return None;
        };
        Some(self.builder.add_expr(
            Expr::Lambda(Lambda { params, ret, body }),
            self.range_from(start),
        ))
    }
}
