use crate::projected::{from_projection, project_element, project_node, ProjectedNode};
use overmark_model::{
    Attributes, Batch, ChangeRecord, Document, Node, Position, Selection, TEXT_SENTINEL,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Live mirror of the document tree as plain [`ProjectedNode`]s.
///
/// The mirror is built lazily on first [`get`](Self::get) and then kept
/// current by applying change records — never by re-walking unaffected
/// subtrees. Text effects (insert, remove, attribute change) are not
/// locally observable because the host merges and splits runs, so any
/// text-touching record refreshes all text children of the affected
/// parent from the live tree instead of attempting a precise patch.
///
/// A record whose path cannot be resolved means the mirror and the
/// document have diverged; that is a programming fault and panics —
/// callers persisting `get()` output must never receive corrupt state
/// silently.
#[derive(Debug, Default)]
pub struct ProjectionEngine {
    mirror: Option<ProjectedNode>,
}

impl ProjectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current projection of the whole document. Callers must treat the
    /// returned tree as read-only; clone before transforming.
    pub fn get(&mut self, doc: &Document) -> &ProjectedNode {
        &*self.mirror.get_or_insert_with(|| {
            debug!("building initial projection");
            project_element(doc.root())
        })
    }

    /// Replace the document's entire content with `tree`'s children,
    /// clearing the prior selection. Runs as a single transaction, so
    /// change-record subscribers (this engine included, once the batch
    /// is delivered) never observe a partial state.
    pub fn set(&mut self, doc: &mut Document, tree: &ProjectedNode) {
        debug!("replacing document content from projection");
        doc.change(|w| {
            let count = w.document().root().children.len();
            for _ in 0..count {
                w.remove_node(&[], 0);
            }
            for (i, child) in tree.child_nodes().iter().enumerate() {
                w.insert_node(&[], i, from_projection(child));
            }
            let position = match w.document().root().children.first() {
                Some(Node::Element(_)) => Position::new(vec![0], 0),
                _ => Position::new(vec![], 0),
            };
            w.set_selection(Selection::collapsed(position, Attributes::new()));
        });
    }

    /// Apply one batch of change records to the mirror, in emission
    /// order. Returns whether document data changed (callers fire their
    /// data-changed notification on `true`, once per batch).
    pub fn handle_batch(&mut self, doc: &Document, batch: &Batch) -> bool {
        if batch.is_empty() {
            return false;
        }
        if self.mirror.is_some() {
            for record in &batch.records {
                self.apply_record(doc, record);
            }
        }
        true
    }

    fn apply_record(&mut self, doc: &Document, record: &ChangeRecord) {
        trace!(?record, "applying change record");
        match record {
            ChangeRecord::Insert { position, name, .. } => {
                let Some((&index, parent_path)) = position.split_last() else {
                    panic!("insert record addressing the document root");
                };
                if name == TEXT_SENTINEL {
                    self.refresh_text(doc, parent_path);
                    return;
                }
                let live_parent = doc
                    .element_at(parent_path)
                    .unwrap_or_else(|| panic!("unresolvable record path {:?}", position));
                let Some(live_node) = live_parent.children.get(index) else {
                    panic!("unresolvable record path {:?}", position);
                };
                let projected = project_node(live_node);
                let children = self.mirror_children_mut(parent_path);
                let vec = children.get_or_insert_with(Vec::new);
                if index > vec.len() {
                    panic!("projection mirror desynchronized at {:?}", position);
                }
                vec.insert(index, projected);
                // the host may have re-split runs around the insertion
                let between_runs = index > 0
                    && live_parent.children[index - 1].is_text()
                    && live_parent
                        .children
                        .get(index + 1)
                        .is_some_and(Node::is_text);
                if between_runs {
                    self.refresh_text(doc, parent_path);
                }
            }

            ChangeRecord::Remove { position, name } => {
                let Some((&index, parent_path)) = position.split_last() else {
                    panic!("remove record addressing the document root");
                };
                if name == TEXT_SENTINEL {
                    self.refresh_text(doc, parent_path);
                    return;
                }
                let children = self.mirror_children_mut(parent_path);
                let Some(vec) = children else {
                    panic!("projection mirror desynchronized at {:?}", position);
                };
                if index >= vec.len() {
                    panic!("projection mirror desynchronized at {:?}", position);
                }
                vec.remove(index);
                if vec.is_empty() {
                    // empty containers never retain an empty list
                    *children = None;
                }
            }

            ChangeRecord::Attribute { range, .. } => {
                let live_parent = doc
                    .element_at(&range.parent)
                    .unwrap_or_else(|| panic!("unresolvable record path {:?}", range.parent));
                let any_text = live_parent
                    .children
                    .get(range.start..range.end)
                    .unwrap_or_else(|| panic!("attribute record range out of bounds at {:?}", range))
                    .iter()
                    .any(Node::is_text);
                // text runs may have merged or split; resync structure
                // before refreshing element snapshots at their indices
                if any_text {
                    self.refresh_text(doc, &range.parent);
                }
                for index in range.start..range.end {
                    let Some(Node::Element(live)) = live_parent.children.get(index) else {
                        continue;
                    };
                    let snapshot = if live.attributes.is_empty() {
                        None
                    } else {
                        Some(live.attributes.clone())
                    };
                    let children = self.mirror_children_mut(&range.parent);
                    let node = children
                        .as_mut()
                        .and_then(|vec| vec.get_mut(index))
                        .unwrap_or_else(|| {
                            panic!("projection mirror desynchronized at {:?}", range.parent)
                        });
                    match node {
                        ProjectedNode::Element { attribs, .. } => *attribs = snapshot,
                        ProjectedNode::Text { .. } => {
                            panic!("projection mirror desynchronized at {:?}", range.parent)
                        }
                    }
                }
            }
        }
    }

    /// Re-derive every text child of `parent_path` from the live tree,
    /// keeping the already-projected element children in order.
    fn refresh_text(&mut self, doc: &Document, parent_path: &[usize]) {
        let live = doc
            .element_at(parent_path)
            .unwrap_or_else(|| panic!("unresolvable record path {:?}", parent_path));
        let children = self.mirror_children_mut(parent_path);
        let mut kept: VecDeque<ProjectedNode> = children
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| !c.is_text())
            .collect();
        let mut rebuilt = Vec::with_capacity(live.children.len());
        for child in &live.children {
            match child {
                Node::Text(_) => rebuilt.push(project_node(child)),
                Node::Element(_) => rebuilt.push(kept.pop_front().unwrap_or_else(|| {
                    panic!("projection mirror desynchronized at {:?}", parent_path)
                })),
            }
        }
        if !kept.is_empty() {
            panic!("projection mirror desynchronized at {:?}", parent_path);
        }
        *children = if rebuilt.is_empty() {
            None
        } else {
            Some(rebuilt)
        };
    }

    fn mirror_children_mut(&mut self, path: &[usize]) -> &mut Option<Vec<ProjectedNode>> {
        let Some(mirror) = self.mirror.as_mut() else {
            panic!("projection mirror accessed before first build");
        };
        let mut node = mirror;
        for &index in path {
            node = match node {
                ProjectedNode::Element {
                    children: Some(children),
                    ..
                } => children.get_mut(index).unwrap_or_else(|| {
                    panic!("projection mirror desynchronized at {:?}", path)
                }),
                _ => panic!("projection mirror desynchronized at {:?}", path),
            };
        }
        match node {
            ProjectedNode::Element { children, .. } => children,
            ProjectedNode::Text { .. } => {
                panic!("projection mirror desynchronized at {:?}", path)
            }
        }
    }
}
