//! Shared types for the Shed compiler.
//!
//! This crate defines the syntax tree arena and its node handles, source
//! positions and ranges, the location table, the diagnostic model, and the
//! resolution table that every later compiler stage shares.

pub mod ast;
mod error;
pub mod index_vec;
mod locations;
mod resolution;
mod span;

pub use error::{
    CompilerError, Diagnostics, ErrorKind, ErrorLocation, InternalError, ReportedError,
};
pub use locations::NodeLocations;
pub use resolution::{Resolution, ResolutionTable};
pub use span::{SourcePosition, SourceRange};
