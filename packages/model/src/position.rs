use serde::{Deserialize, Serialize};

/// Child-index path from the document root to a node.
pub type NodePath = Vec<usize>;

/// A spot between nodes/characters inside a parent element.
///
/// Offsets are counted in model units: an element child occupies one
/// offset, a text run one offset per char.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub parent: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(parent: NodePath, offset: usize) -> Self {
        Self { parent, offset }
    }

    pub fn shifted(&self, by: usize) -> Self {
        Self {
            parent: self.parent.clone(),
            offset: self.offset + by,
        }
    }
}

/// Flat range between two positions under the same parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering `[offset, offset + length)` inside one parent.
    pub fn flat(parent: NodePath, offset: usize, length: usize) -> Self {
        Self {
            start: Position::new(parent.clone(), offset),
            end: Position::new(parent, offset + length),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}
