//! Shed tokeniser: converts source text into a positioned token stream.

pub mod lexer;
pub mod token;

pub use lexer::{tokenise, LexResult, Lexer};
pub use token::{PositionedToken, Token, TokenKind, ALL_KEYWORDS};
