//! Type annotation parsing.

use shed_lexer::TokenKind;
use shed_types::ast::*;

use crate::parser::Parser;

impl Parser {
    /// Parse a type annotation.
    ///
    /// ```ebnf
    /// Type = Identifier
    ///      | "(" [ Type { "," Type } ] ")" "->" Type ;
    /// ```
    ///
    /// Whether a name actually denotes a type is decided by the checker.
    pub(crate) fn parse_type(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        match self.peek_kind() {
            TokenKind::Identifier => {
                let name = self.expect_identifier()?;
                Some(self.builder.add(Node::Type(TypeExpr::Named(name)), start))
            }
            TokenKind::LParen => {
                self.advance(); // eat `(`
                self.enter()?;
                let result = self.parse_function_type(start);
                self.leave();
                result
            }
            other => {
                self.error_at_current(format!("expected type, got '{other}'"));
                None
            }
        }
    }

    /// The rest of `(A, B) -> R` after the opening parenthesis.
    fn parse_function_type(&mut self, start: shed_types::SourceRange) -> Option<NodeId> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        Some(self.builder.add(
            Node::Type(TypeExpr::Function { params, ret }),
            self.range_from(start),
        ))
    }
}
