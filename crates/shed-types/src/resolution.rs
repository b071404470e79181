use std::collections::HashMap;

use crate::ast::{ModulePath, NodeId};

/// What an identifier expression refers to, as decided by the type checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A binding declared in Shed source (local, top-level, parameter, class).
    Declared,
    /// A host binding seeded from a builtin profile, spelled `js` in output.
    Builtin { js: String },
    /// The binding introduced by an import of `module`.
    Import { module: ModulePath },
}

/// Identifier node → [`Resolution`], produced by checking and read by code
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionTable {
    entries: HashMap<NodeId, Resolution>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, resolution: Resolution) {
        self.entries.insert(node, resolution);
    }

    pub fn get(&self, node: NodeId) -> Option<&Resolution> {
        self.entries.get(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
