//! Statement parsing.

use crate::parser::Parser;
use shed_lexer::TokenKind;
use shed_types::ast::*;

impl Parser {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.expect(TokenKind::LBrace)?;
        self.enter()?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let statement_start = self.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(statement_start),
            }
        }
        self.leave();
        self.expect(TokenKind::RBrace)?;
        Some(self.builder.add(Node::Block(Block { stmts }), self.range_from(start)))
    }

    /// Parse a single statement. Nested `let`, `var` and `fun` declarations
    /// are statements too.
    pub(crate) fn parse_statement(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var => self.parse_let(),
            // `fun name(...)` declares; `fun (...)` is a lambda expression.
            TokenKind::Fun if self.look_ahead(1) == TokenKind::Identifier => self.parse_fun(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Identifier if self.look_ahead(1) == TokenKind::Eq => self.parse_assign(),
            _ => self.parse_expression_statement(),
        }
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `return`
        let has_value = !(self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.at_end()
            || self.at_line_start());
        let value = if has_value {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let range = self.range_from(start);
        self.expect_terminator()?;
        Some(self.builder.add_stmt(Stmt::Return(value), range))
    }

    /// `if cond { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `if`
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_branch = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                self.enter()?;
                let nested = self.parse_if();
                self.leave();
                Some(nested?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Some(self.builder.add_stmt(
            Stmt::If {
                condition,
                then_block,
                else_branch,
            },
            self.range_from(start),
        ))
    }

    /// `while cond { ... }`
    fn parse_while(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `while`
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Some(
            self.builder
                .add_stmt(Stmt::While { condition, body }, self.range_from(start)),
        )
    }

    /// `name = value`
    fn parse_assign(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        let target = self.expect_identifier()?;
        self.advance(); // eat `=`
        let value = self.parse_expression()?;
        let range = self.range_from(start);
        self.expect_terminator()?;
        Some(self.builder.add_stmt(Stmt::Assign { target, value }, range))
    }

    /// `expr`, rejecting `expr = value` where `expr` is not a plain name.
    fn parse_expression_statement(&mut self) -> Option<NodeId> {
        let expr = self.parse_expression()?;
        if self.check(TokenKind::Eq) {
            self.error_at_node("invalid assignment target", expr);
            return None;
        }
        let range = self.builder.range(expr);
        self.expect_terminator()?;
        Some(self.builder.add_stmt(Stmt::Expr(expr), range))
    }
}
