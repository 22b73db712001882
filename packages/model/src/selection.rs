use crate::node::Attributes;
use crate::position::{Position, Range};

/// Editing selection: a collapsed caret or a flat range, plus the
/// attribute set active at the caret (what freshly typed text picks up).
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
    pub attributes: Attributes,
}

impl Selection {
    pub fn collapsed(position: Position, attributes: Attributes) -> Self {
        Self {
            start: position.clone(),
            end: position,
            attributes,
        }
    }

    pub fn ranged(start: Position, end: Position, attributes: Attributes) -> Self {
        Self {
            start,
            end,
            attributes,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn first_position(&self) -> &Position {
        &self.start
    }

    pub fn range(&self) -> Range {
        Range::new(self.start.clone(), self.end.clone())
    }
}
