//! Shed JavaScript code generator: checked syntax tree to JavaScript text.
//!
//! # Architecture
//!
//! Generation runs in two steps:
//!
//! 1. [`CodeGenerator`] lowers a checked [`SyntaxTree`](shed_types::ast::SyntaxTree)
//!    into the [`js`] target tree, asking an [`ImportGenerator`] for each
//!    import and a [`ModuleWrapper`] for the module envelope. At
//!    [`OptimisationLevel::Simple`] the tree is then constant-folded.
//! 2. [`write`] renders the target tree, pretty-printed at
//!    [`OptimisationLevel::None`] and compact at [`OptimisationLevel::Simple`].
//!
//! ## Name spelling
//!
//! Shed identifiers that collide with JavaScript reserved words or host
//! globals get a `$` suffix ([`js_name`]). Object keys and member names keep
//! their Shed spelling so the published shape of a module or class is
//! exactly its Shed interface.

pub mod compiler;
pub mod error;
mod expr;
pub mod js;
pub mod level;
pub mod names;
mod optimise;
mod stmt;
pub mod strategy;
pub mod writer;

pub use compiler::CodeGenerator;
pub use error::{CodegenError, CodegenResult};
pub use level::{OptimisationLevel, ParseLevelError};
pub use names::js_name;
pub use strategy::{
    BrowserImports, BrowserModuleWrapper, CommonJsImports, CommonJsModuleWrapper,
    ImportGenerator, ModuleWrapper, NoWrapper,
};
pub use writer::write;
