use crate::ast::NodeId;
use crate::locations::NodeLocations;
use crate::SourceRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stage of the pipeline found the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// An input character the tokeniser does not recognise.
    Lexical,
    /// A grammar violation.
    Syntax,
    /// An undefined, duplicate or immutable binding.
    Name,
    /// An incompatible or unresolvable type.
    Type,
    /// An unresolvable import or an import cycle.
    ModuleResolution,
    /// A broken compiler invariant. Never reported as an ordinary diagnostic.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Name => write!(f, "name"),
            Self::Type => write!(f, "type"),
            Self::ModuleResolution => write!(f, "module resolution"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// How a diagnostic finds its place in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorLocation {
    /// A range known when the error was raised (tokens, lexemes).
    Range(SourceRange),
    /// A syntax node, looked up in the location table when reported.
    Node(NodeId),
}

/// A compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: ErrorLocation,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: ErrorLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn lexical(message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(ErrorKind::Lexical, message, ErrorLocation::Range(range))
    }

    pub fn syntax(message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(ErrorKind::Syntax, message, ErrorLocation::Range(range))
    }

    pub fn syntax_at_node(message: impl Into<String>, node: NodeId) -> Self {
        Self::new(ErrorKind::Syntax, message, ErrorLocation::Node(node))
    }

    pub fn name(message: impl Into<String>, node: NodeId) -> Self {
        Self::new(ErrorKind::Name, message, ErrorLocation::Node(node))
    }

    pub fn type_error(message: impl Into<String>, node: NodeId) -> Self {
        Self::new(ErrorKind::Type, message, ErrorLocation::Node(node))
    }

    pub fn module_resolution(message: impl Into<String>, location: ErrorLocation) -> Self {
        Self::new(ErrorKind::ModuleResolution, message, location)
    }

    /// The human-readable description shown to users, such as
    /// `Type error: cannot apply '+' to Number and String`.
    pub fn describe(&self) -> String {
        let kind = self.kind.to_string();
        let mut chars = kind.chars();
        let capitalised: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => kind,
        };
        format!("{capitalised} error: {}", self.message)
    }

    /// Resolve this diagnostic to a source range.
    ///
    /// A node with no location table entry is a broken invariant, and so is
    /// any diagnostic of kind [`ErrorKind::Internal`].
    pub fn resolve(&self, locations: &NodeLocations) -> Result<SourceRange, InternalError> {
        if self.kind == ErrorKind::Internal {
            return Err(InternalError::Invariant(self.message.clone()));
        }
        match self.location {
            ErrorLocation::Range(range) => Ok(range),
            ErrorLocation::Node(node) => locations
                .locate(node)
                .ok_or_else(|| InternalError::UnlocatedNode {
                    node,
                    message: self.message.clone(),
                }),
        }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

/// A fatal error that aborts a whole compile request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// A diagnostic referenced a node that has no recorded location.
    #[error("cannot locate error '{message}': {node} has no source location")]
    UnlocatedNode { node: NodeId, message: String },

    /// Some other compiler invariant did not hold.
    #[error("internal compiler error: {0}")]
    Invariant(String),
}

/// A diagnostic after location resolution, ready to show to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub kind: ErrorKind,
    /// The module the error was found in.
    pub module: String,
    pub description: String,
    pub range: SourceRange,
}

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.module, self.range.start, self.description)
    }
}

/// Diagnostics accumulated by one stage, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<CompilerError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CompilerError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilerError> {
        self.errors.iter()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn into_vec(self) -> Vec<CompilerError> {
        self.errors
    }
}

impl IntoIterator for Diagnostics {
    type Item = CompilerError;
    type IntoIter = std::vec::IntoIter<CompilerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<CompilerError> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = CompilerError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}
