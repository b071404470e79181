use crate::ast::NodeId;
use crate::index_vec::IndexVec;
use crate::SourceRange;

/// Node handle → source range, filled in while parsing.
///
/// Only [`TreeBuilder`](crate::ast::TreeBuilder) can create one, and it
/// exposes no mutation, so the table is fixed once parsing completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLocations {
    ranges: IndexVec<NodeId, SourceRange>,
}

impl NodeLocations {
    pub(crate) fn from_ranges(ranges: IndexVec<NodeId, SourceRange>) -> Self {
        Self { ranges }
    }

    /// Look up the range of a node.
    pub fn locate(&self, id: NodeId) -> Option<SourceRange> {
        self.ranges.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
