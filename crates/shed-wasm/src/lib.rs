//! Shed compiler as a WASM module for browser environments.
//!
//! This crate exposes single-snippet compilation via `wasm-bindgen`, in the
//! JSON shape the web front-end consumes.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { compile } from 'shed-wasm';
//!
//! await init();
//!
//! const result = JSON.parse(compile("let x = 1 + 2", "SIMPLE"));
//! // { tokens: [...], errors: [], javascript: "SHED.exportModule(...)", success: true }
//! ```
//!
//! Snippets compile with the browser builtin profile and the browser
//! import and module strategies.

use serde::Serialize;
use shed_compiler::{CompilationResult, OptimisationLevel, ParseLevelError, ShedCompiler};
use shed_lexer::PositionedToken;
use shed_types::{InternalError, ReportedError, SourcePosition};
use thiserror::Error;
use wasm_bindgen::prelude::*;

// ══════════════════════════════════════════════════════════════════════════════
// Wire format
// ══════════════════════════════════════════════════════════════════════════════

/// `{ line, character }`, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionDto {
    pub line: u32,
    pub character: u32,
}

impl From<SourcePosition> for PositionDto {
    fn from(p: SourcePosition) -> Self {
        Self {
            line: p.line,
            character: p.character,
        }
    }
}

/// `{ position, value, rawText, kind }`. `value` is empty when the token
/// carries no decoded literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub position: PositionDto,
    pub value: String,
    pub raw_text: String,
    pub kind: &'static str,
}

impl From<&PositionedToken> for TokenDto {
    fn from(t: &PositionedToken) -> Self {
        Self {
            position: t.start.into(),
            value: t.token.value.clone().unwrap_or_default(),
            raw_text: t.token.raw.clone(),
            kind: t.kind().category(),
        }
    }
}

/// `{ module, description, start, end }`. `module` names the module the
/// range belongs to: the snippet itself or a module it imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDto {
    pub module: String,
    pub description: String,
    pub start: PositionDto,
    pub end: PositionDto,
}

impl From<&ReportedError> for ErrorDto {
    fn from(e: &ReportedError) -> Self {
        Self {
            module: e.module.clone(),
            description: e.description.clone(),
            start: e.range.start.into(),
            end: e.range.end.into(),
        }
    }
}

/// A compile response. `javascript` is omitted unless `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileResponse {
    pub tokens: Vec<TokenDto>,
    pub errors: Vec<ErrorDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript: Option<String>,
    pub success: bool,
}

/// Convert a compilation result to its wire shape.
pub fn response_for(result: &CompilationResult) -> CompileResponse {
    CompileResponse {
        tokens: result.tokens.iter().map(TokenDto::from).collect(),
        errors: result.errors.iter().map(ErrorDto::from).collect(),
        javascript: result.javascript.clone(),
        success: result.success,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════════════════════

/// A request that could not be compiled at all.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Level(#[from] ParseLevelError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

/// Compile `source` at the named optimisation level (default `NONE`).
/// An unrecognised level is rejected, never replaced by the default.
pub fn compile_request(source: &str, level: Option<&str>) -> Result<CompileResponse, RequestError> {
    let level = match level {
        Some(name) => name.parse()?,
        None => OptimisationLevel::None,
    };
    let result = ShedCompiler::for_browser(level).compile_source(source)?;
    Ok(response_for(&result))
}

/// [`compile_request`] rendered as JSON: a [`CompileResponse`], or
/// `{ "error": "..." }` for a rejected request.
pub fn compile_json(source: &str, level: Option<&str>) -> String {
    let rendered = match compile_request(source, level) {
        Ok(response) => serde_json::to_string(&response),
        Err(e) => serde_json::to_string(&ErrorResponse {
            error: &e.to_string(),
        }),
    };
    rendered.unwrap_or_else(|e| {
        format!(
            r#"{{"error":{}}}"#,
            serde_json::Value::String(format!("serialization error: {e}"))
        )
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Exports
// ══════════════════════════════════════════════════════════════════════════════

/// Compile a Shed snippet to JavaScript.
///
/// `level` is `"NONE"` (default) or `"SIMPLE"`. Returns a JSON string:
/// ```json
/// {
///   "tokens": [{ "position": { "line": 1, "character": 1 }, "value": "let", "rawText": "let", "kind": "keyword" }],
///   "errors": [],
///   "javascript": "SHED.exportModule(\"snippet\", ...);\n",
///   "success": true
/// }
/// ```
#[wasm_bindgen]
pub fn compile(source: &str, level: Option<String>) -> String {
    compile_json(source, level.as_deref())
}

/// Return the compiler version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
