//! Top-level and declaration parsing.
//!
//! Handles the source file itself (imports, then declarations) and the
//! `let`/`var`, `fun` and `class` declarations, which may also appear
//! nested inside blocks and class bodies.

use std::collections::HashSet;

use shed_lexer::TokenKind;
use shed_types::ast::*;

use crate::parser::Parser;

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Source File
    // ══════════════════════════════════════════════════════════════════════════

    /// `SourceFile = { Import } { Declaration } End`
    ///
    /// Always returns a root, even after errors.
    pub(crate) fn parse_source_file(&mut self) -> NodeId {
        let start = self.current_range();
        let mut imports = Vec::new();
        let mut declarations = Vec::new();

        while !self.at_end() {
            let statement_start = self.position();
            let parsed = match self.peek_kind() {
                TokenKind::Import => {
                    let import = self.parse_import();
                    if let Some(id) = import {
                        if declarations.is_empty() {
                            imports.push(id);
                        } else {
                            self.error_at_node("imports must precede declarations", id);
                        }
                    }
                    import
                }
                TokenKind::Let | TokenKind::Var | TokenKind::Fun | TokenKind::Class => {
                    let decl = self.parse_declaration();
                    declarations.extend(decl);
                    decl
                }
                other => {
                    self.error_at_current(format!(
                        "expected 'import', 'let', 'var', 'fun' or 'class', got '{other}'"
                    ));
                    None
                }
            };
            if parsed.is_none() {
                self.synchronize(statement_start);
                // No declaration can start at a stray `}`; the failure
                // above already reported it.
                if self.check(TokenKind::RBrace) {
                    self.advance();
                }
            }
        }

        let range = if imports.is_empty() && declarations.is_empty() {
            self.current_range()
        } else {
            self.range_from(start)
        };
        self.builder.add(
            Node::SourceFile(SourceFile {
                imports,
                declarations,
            }),
            range,
        )
    }

    /// A `let`/`var`, `fun` or `class` declaration.
    pub(crate) fn parse_declaration(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var => self.parse_let(),
            TokenKind::Fun => self.parse_fun(),
            TokenKind::Class => self.parse_class(),
            other => {
                self.error_at_current(format!("expected declaration, got '{other}'"));
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Imports
    // ══════════════════════════════════════════════════════════════════════════

    /// `import a.b.c [as name]`
    fn parse_import(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `import`
        let mut segments = vec![self.expect_identifier()?];
        while self.eat(TokenKind::Dot) {
            segments.push(self.expect_identifier()?);
        }
        let alias = if self.eat(TokenKind::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let range = self.range_from(start);
        self.expect_terminator()?;
        Some(self.builder.add(
            Node::Import(Import {
                path: ModulePath::new(segments),
                alias,
            }),
            range,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `("let" | "var") name [: Type] = expr`
    pub(crate) fn parse_let(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        let mutable = self.advance().kind() == TokenKind::Var;
        let name = self.expect_identifier()?;
        let type_ann = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let range = self.range_from(start);
        self.expect_terminator()?;
        Some(self.builder.add(
            Node::Let(LetDecl {
                mutable,
                name,
                type_ann,
                value,
            }),
            range,
        ))
    }

    /// `fun name(params) [: Type] { body }`
    pub(crate) fn parse_fun(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `fun`
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let body = self.parse_block()?;
        Some(self.builder.add(
            Node::Fun(FunDecl {
                name,
                params,
                ret,
                body,
            }),
            self.range_from(start),
        ))
    }

    /// `class Name(params) [ { members } ]`, where members are `fun`, `let`
    /// and `var` declarations.
    fn parse_class(&mut self) -> Option<NodeId> {
        let start = self.current_range();
        self.advance(); // eat `class`
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;

        let mut members = Vec::new();
        if self.eat(TokenKind::LBrace) {
            self.enter()?;
            while !self.check(TokenKind::RBrace) && !self.at_end() {
                let member_start = self.position();
                let member = match self.peek_kind() {
                    TokenKind::Let | TokenKind::Var | TokenKind::Fun => self.parse_declaration(),
                    other => {
                        self.error_at_current(format!(
                            "expected 'let', 'var' or 'fun' in class body, got '{other}'"
                        ));
                        None
                    }
                };
                match member {
                    Some(id) => members.push(id),
                    None => self.synchronize(member_start),
                }
            }
            self.leave();
            self.expect(TokenKind::RBrace)?;
        }

        Some(self.builder.add(
            Node::Class(ClassDecl {
                name,
                params,
                members,
            }),
            self.range_from(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Parameters
    // ══════════════════════════════════════════════════════════════════════════

    /// `( [ name: Type { , name: Type } ] )`
    ///
    /// A repeated name is reported against the later parameter.
    pub(crate) fn parse_params(&mut self) -> Option<Vec<NodeId>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let start = self.current_range();
                let name = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let type_ann = self.parse_type()?;
                let id = self.builder.add(
                    Node::Param(Param {
                        name: name.clone(),
                        type_ann,
                    }),
                    self.range_from(start),
                );
                if !seen.insert(name.clone()) {
                    self.error_at_node(format!("duplicate parameter '{name}'"), id);
                }
                params.push(id);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Some(params)
    }

    /// `[ : Type ]` after a parameter list.
    pub(crate) fn parse_return_annotation(&mut self) -> Option<Option<NodeId>> {
        if self.eat(TokenKind::Colon) {
            Some(Some(self.parse_type()?))
        } else {
            Some(None)
        }
    }
}
