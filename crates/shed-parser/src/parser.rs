//! Core parser infrastructure: token cursor, error reporting, helpers.

use shed_lexer::{PositionedToken, Token, TokenKind};
use shed_types::ast::{NodeId, SyntaxTree, TreeBuilder};
use shed_types::{CompilerError, Diagnostics, NodeLocations, SourcePosition, SourceRange};

/// Deepest nesting accepted before the parser gives up on a construct.
/// Brackets, unary operators, blocks, binary operator chains and postfix
/// chains all count, so later passes can walk the tree recursively.
pub(crate) const MAX_NESTING: u32 = 200;

/// The Shed parser.
///
/// Consumes a token stream produced by the tokeniser and builds a syntax
/// tree together with its location table. Collects errors and recovers at
/// statement boundaries so one pass reports every independent problem.
pub struct Parser {
    /// Significant tokens only; always ends with [`TokenKind::End`].
    tokens: Vec<PositionedToken>,
    /// `newline_before[i]`: a line break separates `tokens[i]` from the
    /// significant token before it.
    newline_before: Vec<bool>,
    /// Current index into `tokens`.
    pos: usize,
    pub(crate) builder: TreeBuilder,
    errors: Diagnostics,
    /// Current expression/block nesting depth.
    pub(crate) depth: u32,
}

/// Result of parsing.
///
/// `tree` is always present for best-effort tooling, but must only be
/// type checked when `success` is true.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub locations: NodeLocations,
    pub errors: Diagnostics,
    pub success: bool,
}

/// Parse a token stream as produced by [`shed_lexer::tokenise`].
pub fn parse(tokens: &[PositionedToken]) -> ParseResult {
    Parser::new(tokens).parse()
}

impl Parser {
    /// Create a parser over `tokens`. Trivia and error tokens are dropped
    /// here; the tokeniser already reported the latter.
    pub fn new(tokens: &[PositionedToken]) -> Self {
        let mut significant = Vec::new();
        let mut newline_before = Vec::new();
        let mut saw_newline = false;
        for token in tokens {
            match token.kind() {
                TokenKind::Whitespace | TokenKind::Comment => {
                    saw_newline |= token.token.raw.contains('\n');
                }
                TokenKind::Error => {}
                TokenKind::End => break,
                _ => {
                    significant.push(token.clone());
                    newline_before.push(saw_newline);
                    saw_newline = false;
                }
            }
        }

        let end = tokens
            .iter()
            .rev()
            .find(|t| t.kind() == TokenKind::End)
            .or_else(|| tokens.last())
            .map(|t| t.end)
            .unwrap_or_else(SourcePosition::start);
        significant.push(PositionedToken {
            token: Token::new(TokenKind::End, "", None),
            start: end,
            end,
        });
        newline_before.push(saw_newline);

        Self {
            tokens: significant,
            newline_before,
            pos: 0,
            builder: TreeBuilder::new(),
            errors: Diagnostics::new(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &PositionedToken {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind()
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(PositionedToken::kind)
            .unwrap_or(TokenKind::End)
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> PositionedToken {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Returns the range of the current token.
    pub(crate) fn current_range(&self) -> SourceRange {
        self.peek().range()
    }

    /// Returns the previously consumed token's range.
    pub(crate) fn previous_range(&self) -> SourceRange {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.range(),
            None => SourceRange::point(SourcePosition::start()),
        }
    }

    /// The range from `start` up to the end of the previously consumed token.
    pub(crate) fn range_from(&self, start: SourceRange) -> SourceRange {
        start.merge(self.previous_range())
    }

    /// Returns `true` if the current token is `End`.
    pub(crate) fn at_end(&self) -> bool {
        self.peek_kind() == TokenKind::End
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// `true` if a line break precedes the current token.
    pub(crate) fn at_line_start(&self) -> bool {
        self.newline_before
            .get(self.pos)
            .copied()
            .unwrap_or(false)
    }

    /// Like [`check`](Self::check), but only for an infix or postfix token
    /// on the same line as the expression it continues.
    pub(crate) fn check_continuation(&self, kind: TokenKind) -> bool {
        self.check(kind) && !self.at_line_start()
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: TokenKind) -> Option<PositionedToken> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(format!(
                "expected '{}', got '{}'",
                expected,
                self.peek_kind()
            ));
            None
        }
    }

    /// Expect an identifier token. Returns the name.
    pub(crate) fn expect_identifier(&mut self) -> Option<String> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Some(token.token.value.unwrap_or(token.token.raw))
        } else {
            self.error_at_current(format!("expected identifier, got '{}'", self.peek_kind()));
            None
        }
    }

    /// A statement ends at `;`, a line break, a closing `}` or the end of
    /// input. Only `;` is consumed.
    pub(crate) fn expect_terminator(&mut self) -> Option<()> {
        if self.eat(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.at_end()
            || self.at_line_start()
        {
            Some(())
        } else {
            self.error_at_current(format!(
                "expected ';' or a line break, got '{}'",
                self.peek_kind()
            ));
            None
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one level of nesting. Reports and returns `None` past the limit.
    pub(crate) fn enter(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING {
            self.error_at_current(format!(
                "nesting is too deep (more than {MAX_NESTING} levels)"
            ));
            return None;
        }
        self.depth += 1;
        Some(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn leave_many(&mut self, levels: u32) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token.
    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.error_at(message, range);
    }

    /// Report an error at a specific range.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, range: SourceRange) {
        self.errors.push(CompilerError::syntax(message, range));
    }

    /// Report an error about a node that has already been built.
    pub(crate) fn error_at_node(&mut self, message: impl Into<String>, node: NodeId) {
        self.errors.push(CompilerError::syntax_at_node(message, node));
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Does this token kind begin a declaration or statement?
    fn starts_statement(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Let
                | TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Class
                | TokenKind::Import
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::While
        )
    }

    /// Skip tokens until a synchronization point after an error at token
    /// index `start`: past a `;`, or before a `}`, the end of input, a
    /// statement keyword or a token that begins a new line.
    ///
    /// Always consumes at least one token unless it stopped at a `}` or
    /// the end, so callers looping over statements make progress.
    pub(crate) fn synchronize(&mut self, start: usize) {
        loop {
            if self.at_end() || self.check(TokenKind::RBrace) {
                return;
            }
            if self.eat(TokenKind::Semicolon) {
                return;
            }
            let moved = self.pos > start;
            if moved && (Self::starts_statement(self.peek_kind()) || self.at_line_start()) {
                return;
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a syntax tree.
    pub fn parse(mut self) -> ParseResult {
        let root = self.parse_source_file();
        let (tree, locations) = self.builder.finish(root);
        let success = self.errors.is_empty();

        tracing::debug!(
            nodes = tree.len(),
            errors = self.errors.len(),
            success,
            "parsed source file"
        );

        ParseResult {
            tree,
            locations,
            errors: self.errors,
            success,
        }
    }
}
