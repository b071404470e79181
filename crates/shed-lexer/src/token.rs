//! Token types for the Shed tokeniser.
//!
//! Defines [`TokenKind`] covering every lexeme in Shed, [`Token`] (kind, raw
//! text and decoded value) and [`PositionedToken`], which places a token in
//! the source.

use serde::Serialize;
use shed_types::{SourcePosition, SourceRange};
use std::fmt;

/// All reserved identifiers in Shed.
pub const ALL_KEYWORDS: &[&str] = &[
    "import", "as", "let", "var", "fun", "class", "return", "if", "else", "while", "true",
    "false",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single lexical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text of this token.
    pub raw: String,
    /// The decoded literal value: identifier and keyword names, number
    /// text, unescaped string contents. `None` for everything else.
    pub value: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, value: Option<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            value,
        }
    }
}

/// A token with its place in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionedToken {
    pub token: Token,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl PositionedToken {
    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn range(&self) -> SourceRange {
        SourceRange::new(self.start, self.end)
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every kind of token the tokeniser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Trivia ───────────────────────────────────────────────

    /// Spaces, tabs and line breaks.
    Whitespace,
    /// `// ...` or `/* ... */`
    Comment,

    // ── Literals & names ─────────────────────────────────────

    Identifier,
    Number,
    String,

    // ── Keywords ─────────────────────────────────────────────

    Import,
    As,
    Let,
    Var,
    Fun,
    Class,
    Return,
    If,
    Else,
    While,
    True,
    False,

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,

    // ── Punctuation ──────────────────────────────────────────

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `=`
    Eq,
    /// `=>`
    FatArrow,
    /// `->`
    Arrow,

    // ── Special ──────────────────────────────────────────────

    /// An unrecognised character.
    Error,
    /// End of input. Always the last token, with empty raw text.
    End,
}

impl TokenKind {
    /// Look up a reserved identifier.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "import" => TokenKind::Import,
            "as" => TokenKind::As,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "fun" => TokenKind::Fun,
            "class" => TokenKind::Class,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        })
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Import
                | TokenKind::As
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Class
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Whitespace and comments: kept in the token stream so the raw texts
    /// reproduce the input, but ignored by the parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// The coarse, stable tag used when tokens leave the compiler.
    pub fn category(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Error => "error",
            TokenKind::End => "end",
            k if k.is_keyword() => "keyword",
            _ => "symbol",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Import => "import",
            TokenKind::As => "as",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Fun => "fun",
            TokenKind::Class => "class",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Bang => "!",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eq => "=",
            TokenKind::FatArrow => "=>",
            TokenKind::Arrow => "->",
            TokenKind::Error => "unrecognised input",
            TokenKind::End => "end of input",
        };
        write!(f, "{s}")
    }
}
