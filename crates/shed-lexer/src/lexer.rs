//! Core Shed tokeniser: converts source text to a positioned token stream.
//!
//! Features:
//! - Trivia (whitespace, `//` and `/* */` comments) is emitted as tokens, so
//!   concatenating every token's raw text reproduces the input exactly
//! - Never fails: an unrecognised character becomes an [`TokenKind::Error`]
//!   token plus one lexical diagnostic, and scanning continues
//! - String escapes are decoded into the token value
//! - The stream always ends with a single [`TokenKind::End`] token

use shed_types::{CompilerError, Diagnostics, SourcePosition, SourceRange};

use crate::token::{PositionedToken, Token, TokenKind};

/// The Shed tokeniser.
pub struct Lexer<'src> {
    source: &'src str,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current character number within the line (1-based).
    character: u32,
    errors: Diagnostics,
}

/// Result of tokenising: tokens + any lexical errors.
#[derive(Debug, Clone)]
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::End`]).
    pub tokens: Vec<PositionedToken>,
    pub errors: Diagnostics,
}

/// Tokenise `text`.
pub fn tokenise(text: &str) -> LexResult {
    Lexer::new(text).lex()
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            character: 1,
            errors: Diagnostics::new(),
        }
    }

    /// Tokenise the whole source.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        while !self.at_end() {
            tokens.push(self.scan_token());
        }
        let end = self.position();
        tokens.push(PositionedToken {
            token: Token::new(TokenKind::End, "", None),
            start: end,
            end,
        });

        tracing::debug!(
            tokens = tokens.len(),
            errors = self.errors.len(),
            "tokenised source"
        );

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.character = 1;
        } else {
            self.character += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.character)
    }

    /// Build a token covering `start_offset..pos`.
    fn finish(
        &self,
        kind: TokenKind,
        start_offset: usize,
        start: SourcePosition,
        value: Option<String>,
    ) -> PositionedToken {
        PositionedToken {
            token: Token::new(kind, &self.source[start_offset..self.pos], value),
            start,
            end: self.position(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token. Must only be called when not at the end.
    fn scan_token(&mut self) -> PositionedToken {
        let start_offset = self.pos;
        let start = self.position();
        let Some(ch) = self.advance() else {
            return self.finish(TokenKind::End, start_offset, start, None);
        };

        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
                    self.advance();
                }
                self.finish(TokenKind::Whitespace, start_offset, start, None)
            }

            '/' if self.peek() == Some('/') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                self.finish(TokenKind::Comment, start_offset, start, None)
            }

            '/' if self.peek() == Some('*') => self.scan_block_comment(start_offset, start),

            '"' => self.scan_string(start_offset, start),

            '0'..='9' => {
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
                if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
                    self.advance();
                    while matches!(self.peek(), Some('0'..='9')) {
                        self.advance();
                    }
                }
                let text = self.source[start_offset..self.pos].to_string();
                self.finish(TokenKind::Number, start_offset, start, Some(text))
            }

            c if c.is_ascii_alphabetic() || c == '_' => {
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    self.advance();
                }
                let text = &self.source[start_offset..self.pos];
                let kind = TokenKind::from_keyword(text).unwrap_or(TokenKind::Identifier);
                let value = Some(text.to_string());
                self.finish(kind, start_offset, start, value)
            }

            _ => match self.scan_symbol(ch) {
                Some(kind) => self.finish(kind, start_offset, start, None),
                None => {
                    let token = self.finish(TokenKind::Error, start_offset, start, None);
                    self.errors.push(CompilerError::lexical(
                        format!("unrecognised character '{}'", ch.escape_default()),
                        token.range(),
                    ));
                    token
                }
            },
        }
    }

    /// Operators and punctuation. `first` has already been consumed.
    fn scan_symbol(&mut self, first: char) -> Option<TokenKind> {
        let two = |lexer: &mut Self, next: char, double: TokenKind, single: Option<TokenKind>| {
            if lexer.peek() == Some(next) {
                lexer.advance();
                Some(double)
            } else {
                single
            }
        };
        match first {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            ';' => Some(TokenKind::Semicolon),
            '.' => Some(TokenKind::Dot),
            '+' => Some(TokenKind::Plus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '-' => two(self, '>', TokenKind::Arrow, Some(TokenKind::Minus)),
            '!' => two(self, '=', TokenKind::BangEq, Some(TokenKind::Bang)),
            '<' => two(self, '=', TokenKind::LessEq, Some(TokenKind::Less)),
            '>' => two(self, '=', TokenKind::GreaterEq, Some(TokenKind::Greater)),
            '&' => two(self, '&', TokenKind::AndAnd, None),
            '|' => two(self, '|', TokenKind::OrOr, None),
            '=' => match self.peek() {
                Some('=') => {
                    self.advance();
                    Some(TokenKind::EqEq)
                }
                Some('>') => {
                    self.advance();
                    Some(TokenKind::FatArrow)
                }
                _ => Some(TokenKind::Eq),
            },
            _ => None,
        }
    }

    /// `/* ... */`, with the opening `/` consumed.
    fn scan_block_comment(&mut self, start_offset: usize, start: SourcePosition) -> PositionedToken {
        self.advance(); // consume '*'
        loop {
            match self.peek() {
                None => {
                    let token = self.finish(TokenKind::Comment, start_offset, start, None);
                    self.errors
                        .push(CompilerError::lexical("unterminated comment", token.range()));
                    return token;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return self.finish(TokenKind::Comment, start_offset, start, None);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// A string literal, with the opening `"` consumed.
    fn scan_string(&mut self, start_offset: usize, start: SourcePosition) -> PositionedToken {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let token = self.finish(TokenKind::String, start_offset, start, Some(buf));
                    self.errors.push(CompilerError::lexical(
                        "unterminated string literal",
                        token.range(),
                    ));
                    return token;
                }
                Some('"') => {
                    self.advance();
                    return self.finish(TokenKind::String, start_offset, start, Some(buf));
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Decode one escape sequence starting at the `\`.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start = self.position();
        self.advance(); // consume the '\'
        match self.peek() {
            Some('"') | Some('\\') => self.advance(),
            Some('n') => self.advance().map(|_| '\n'),
            Some('t') => self.advance().map(|_| '\t'),
            Some('r') => self.advance().map(|_| '\r'),
            // Leave the line break for the unterminated-string check.
            None | Some('\n') => None,
            Some(ch) => {
                self.advance();
                self.errors.push(CompilerError::lexical(
                    format!("invalid escape sequence '\\{}'", ch.escape_default()),
                    SourceRange::new(start, self.position()),
                ));
                Some(ch)
            }
        }
    }
}
