use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in source text.
///
/// Both coordinates are 1-based. A `\n` ends a line; the character after it
/// is at `(line + 1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

impl SourcePosition {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// The position of the first character of any source text.
    pub fn start() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A half-open range of source text: `end` is the position just after the
/// last covered character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    /// Create a new range.
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Create a zero-width range at a single position.
    pub fn point(position: SourcePosition) -> Self {
        Self::new(position, position)
    }

    /// Merge two ranges into one that covers both.
    pub fn merge(self, other: SourceRange) -> SourceRange {
        SourceRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Returns `true` if `position` lies inside this range.
    pub fn contains(&self, position: SourcePosition) -> bool {
        self.start <= position && position < self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
