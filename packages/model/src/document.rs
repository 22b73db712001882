use crate::changes::Batch;
use crate::commands::{Command, CommandSet};
use crate::node::{Attributes, Element, Node, ROOT_NAME};
use crate::position::{NodePath, Position, Range};
use crate::selection::Selection;
use crate::writer::Writer;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Mutable rich document: one root element, a selection, a command
/// registry, and a queue of change-record batches.
///
/// All mutation goes through [`Document::change`], which runs a closure
/// against a [`Writer`] and queues the records it produced as a single
/// batch. Delivery of queued batches to subscribers is driven by the
/// owner (see the editor crate's dispatch loop); nothing here is
/// asynchronous.
#[derive(Debug)]
pub struct Document {
    root: Element,
    selection: Selection,
    commands: CommandSet,
    pending: VecDeque<Batch>,
}

impl Document {
    /// Empty document: a root holding one empty paragraph, caret at its
    /// start.
    pub fn new() -> Self {
        let mut root = Element::new(ROOT_NAME);
        root.children.push(Node::element("paragraph"));
        Self {
            root,
            selection: Selection::collapsed(Position::new(vec![0], 0), Attributes::new()),
            commands: CommandSet::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn register_command(&mut self, name: impl Into<String>, command: Arc<dyn Command>) {
        self.commands.register(name, command);
    }

    /// Run `f` as one transaction and queue the resulting batch.
    /// Synchronous; no partial state is observable outside the closure.
    pub fn change<F: FnOnce(&mut Writer)>(&mut self, f: F) {
        let mut records = Vec::new();
        {
            let mut writer = Writer::new(self, &mut records);
            f(&mut writer);
        }
        trace!(records = records.len(), "transaction committed");
        self.pending.push_back(Batch { records });
    }

    /// Pop the next queued batch, if any.
    pub fn take_batch(&mut self) -> Option<Batch> {
        self.pending.pop_front()
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        self.root.descendant(path)
    }

    /// Element at `path`; the empty path is the root.
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        self.root.descendant_element(path)
    }

    /// Attribute set active at a position: the attributes of the text
    /// run right before it, else right after it, else empty.
    pub fn attributes_at(&self, position: &Position) -> Attributes {
        let Some(parent) = self.element_at(&position.parent) else {
            return Attributes::new();
        };
        let (index, inner) = parent.child_at_offset(position.offset);
        if inner > 0 {
            if let Some(run) = parent.children[index].as_text() {
                return run.attributes.clone();
            }
        } else if index > 0 {
            if let Some(run) = parent.children[index - 1].as_text() {
                return run.attributes.clone();
            }
        }
        parent
            .children
            .get(index)
            .and_then(Node::as_text)
            .map(|run| run.attributes.clone())
            .unwrap_or_default()
    }

    /// Whether a position sits in code-formatted content (inline `code`
    /// attribute or a `codeBlock` ancestor).
    pub fn in_code_context(&self, position: &Position) -> bool {
        if self.attributes_at(position).contains_key("code") {
            return true;
        }
        self.element_at(&position.parent)
            .is_some_and(|el| el.name == "codeBlock")
    }

    /// Whether every text run intersecting `range` carries `key`.
    pub fn range_has_attribute(&self, range: &Range, key: &str) -> bool {
        let Some(parent) = self.element_at(&range.start.parent) else {
            return false;
        };
        let (start, _) = parent.child_at_offset(range.start.offset);
        let (end, er) = parent.child_at_offset(range.end.offset);
        let last = if er > 0 { end + 1 } else { end };
        let mut saw_text = false;
        for child in &parent.children[start.min(parent.children.len())..last.min(parent.children.len())]
        {
            if let Node::Text(run) = child {
                saw_text = true;
                if !run.attributes.contains_key(key) {
                    return false;
                }
            }
        }
        saw_text
    }

    /// Path of the block the selection starts in (its direct parent
    /// element). `None` when the selection sits at the root itself.
    pub fn selection_block_path(&self) -> Option<NodePath> {
        let parent = &self.selection.start.parent;
        if parent.is_empty() {
            None
        } else {
            Some(parent.clone())
        }
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub(crate) fn set_selection_internal(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub(crate) fn set_selection_attributes_internal(&mut self, attributes: Attributes) {
        self.selection.attributes = attributes;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
