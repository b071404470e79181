//! Codegen error types.

use shed_types::ast::NodeId;
use thiserror::Error;

/// Errors that can occur during JavaScript generation.
///
/// Generation only runs on trees that parsed and checked cleanly, so every
/// variant is a broken invariant upstream rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// An identifier has no entry in the resolution table.
    #[error("unresolved identifier '{name}' at {node}")]
    UnresolvedIdentifier { name: String, node: NodeId },

    /// A node handle pointed at a different kind of node than expected.
    #[error("expected {expected} at {node}")]
    UnexpectedNode { expected: &'static str, node: NodeId },
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
