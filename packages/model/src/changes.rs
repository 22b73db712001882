use crate::node::AttrValue;
use crate::position::NodePath;
use serde::{Deserialize, Serialize};

/// Contiguous range of children under one parent, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRange {
    pub parent: NodePath,
    pub start: usize,
    pub end: usize,
}

impl ChildRange {
    pub fn new(parent: NodePath, start: usize, end: usize) -> Self {
        Self { parent, start, end }
    }

    pub fn single(parent: NodePath, index: usize) -> Self {
        Self::new(parent, index, index + 1)
    }
}

/// One atomic edit, reported in document order within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeRecord {
    /// A node appeared at `position`. `name` is the element name, or
    /// the text sentinel; `length` is the char count for text, 1 for
    /// elements.
    Insert {
        position: NodePath,
        name: String,
        length: usize,
    },

    /// A node disappeared. `position` is valid in the post-removal
    /// tree (standard splice semantics).
    Remove { position: NodePath, name: String },

    /// An attribute changed over a contiguous sibling range.
    Attribute {
        range: ChildRange,
        key: String,
        old_value: Option<AttrValue>,
        new_value: Option<AttrValue>,
    },
}

/// All change records produced by one transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub records: Vec<ChangeRecord>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
