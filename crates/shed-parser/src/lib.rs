//! Shed parser: converts a token stream into a syntax tree and its
//! location table.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parse_type;
mod parser;

pub use parser::{parse, ParseResult, Parser};
