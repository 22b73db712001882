use crate::changes::{ChangeRecord, ChildRange};
use crate::document::Document;
use crate::node::{byte_of_char, AttrValue, Attributes, Element, Node, TextRun, TEXT_SENTINEL};
use crate::position::{NodePath, Position, Range};
use crate::selection::Selection;

/// Transaction handle over a [`Document`].
///
/// Every operation mutates the tree immediately and appends the change
/// records describing it, keeping the adjacent-compatible-runs
/// invariant by merging/splitting text as a side effect. Normalization
/// merges are reported as text removals so subscribers never see a
/// tree the records cannot explain. `Remove` positions follow splice
/// semantics: they are valid in the post-removal tree.
///
/// Invalid paths and positions panic; they are producer bugs, and a
/// silently skipped edit would desynchronize every subscriber.
#[derive(Debug)]
pub struct Writer<'a> {
    doc: &'a mut Document,
    records: &'a mut Vec<ChangeRecord>,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(doc: &'a mut Document, records: &'a mut Vec<ChangeRecord>) -> Self {
        Self { doc, records }
    }

    /// Read access to the document mid-transaction.
    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Insert text at a position, merging into a compatible run or
    /// splitting an incompatible one.
    pub fn insert_text(&mut self, position: &Position, text: &str, attributes: &Attributes) {
        if text.is_empty() {
            return;
        }
        let length = text.chars().count();
        let parent_path = position.parent.clone();
        let parent = resolve_element_mut(self.doc, &parent_path);
        let (index, inner) = parent.child_at_offset(position.offset);

        let target_index = if inner > 0 {
            let Some(run) = parent.children[index].as_text_mut() else {
                panic!("text position resolves inside non-text child at {:?}", parent_path);
            };
            if run.attributes == *attributes {
                let at = byte_of_char(&run.data, inner);
                run.data.insert_str(at, text);
                index
            } else {
                split_text_child(parent, index, inner);
                parent
                    .children
                    .insert(index + 1, Node::Text(TextRun::new(text, attributes.clone())));
                index + 1
            }
        } else {
            let prev_compatible = index > 0
                && parent.children[index - 1]
                    .as_text()
                    .is_some_and(|r| r.attributes == *attributes);
            let next_compatible = parent
                .children
                .get(index)
                .and_then(Node::as_text)
                .is_some_and(|r| r.attributes == *attributes);
            if prev_compatible {
                if let Some(run) = parent.children[index - 1].as_text_mut() {
                    run.data.push_str(text);
                }
                index - 1
            } else if next_compatible {
                if let Some(run) = parent.children[index].as_text_mut() {
                    run.data.insert_str(0, text);
                }
                index
            } else {
                parent
                    .children
                    .insert(index, Node::Text(TextRun::new(text, attributes.clone())));
                index
            }
        };

        self.records.push(ChangeRecord::Insert {
            position: child_path(&parent_path, target_index),
            name: TEXT_SENTINEL.to_string(),
            length,
        });
    }

    /// Insert an element at a position, splitting a text run when the
    /// position falls inside one.
    pub fn insert_element(&mut self, position: &Position, element: Element) {
        let parent_path = position.parent.clone();
        let parent = resolve_element_mut(self.doc, &parent_path);
        let (mut index, inner) = parent.child_at_offset(position.offset);
        if inner > 0 {
            split_text_child(parent, index, inner);
            index += 1;
        }
        let name = element.name.clone();
        parent.children.insert(index, Node::Element(element));
        self.records.push(ChangeRecord::Insert {
            position: child_path(&parent_path, index),
            name,
            length: 1,
        });
    }

    /// Splice a node in at a child index. Text nodes merge into a
    /// compatible neighbor instead of violating the run invariant.
    pub fn insert_node(&mut self, parent_path: &[usize], index: usize, node: Node) {
        let parent = resolve_element_mut(self.doc, parent_path);
        if index > parent.children.len() {
            panic!("insert index {} out of range at {:?}", index, parent_path);
        }
        match node {
            Node::Text(run) => {
                let length = run.char_len();
                if length == 0 {
                    return;
                }
                let prev_compatible = index > 0
                    && parent.children[index - 1]
                        .as_text()
                        .is_some_and(|r| r.attributes == run.attributes);
                let next_compatible = parent
                    .children
                    .get(index)
                    .and_then(Node::as_text)
                    .is_some_and(|r| r.attributes == run.attributes);
                let target_index = if prev_compatible {
                    if let Some(prev) = parent.children[index - 1].as_text_mut() {
                        prev.data.push_str(&run.data);
                    }
                    index - 1
                } else if next_compatible {
                    if let Some(next) = parent.children[index].as_text_mut() {
                        next.data.insert_str(0, &run.data);
                    }
                    index
                } else {
                    parent.children.insert(index, Node::Text(run));
                    index
                };
                self.records.push(ChangeRecord::Insert {
                    position: child_path(parent_path, target_index),
                    name: TEXT_SENTINEL.to_string(),
                    length,
                });
            }
            Node::Element(el) => {
                let name = el.name.clone();
                parent.children.insert(index, Node::Element(el));
                self.records.push(ChangeRecord::Insert {
                    position: child_path(parent_path, index),
                    name,
                    length: 1,
                });
            }
        }
    }

    /// Remove the child at `index`, merging the runs it separated.
    pub fn remove_node(&mut self, parent_path: &[usize], index: usize) {
        let parent = resolve_element_mut(self.doc, parent_path);
        if index >= parent.children.len() {
            panic!("remove index {} out of range at {:?}", index, parent_path);
        }
        let removed = parent.children.remove(index);
        self.records.push(ChangeRecord::Remove {
            position: child_path(parent_path, index),
            name: removed.name().to_string(),
        });
        self.merge_if_compatible(parent_path, index);
    }

    /// Remove everything inside a flat range: partial runs shrink,
    /// fully covered children are spliced out, and newly adjacent
    /// compatible runs merge (reported as a text removal).
    pub fn remove_range(&mut self, range: &Range) {
        if range.is_collapsed() {
            return;
        }
        if range.start.parent != range.end.parent {
            panic!("cross-parent ranges are not supported");
        }
        let parent_path = range.start.parent.clone();
        let parent = resolve_element_mut(self.doc, &parent_path);
        let (start_index, start_rem) = parent.child_at_offset(range.start.offset);
        let (end_index, end_rem) = parent.child_at_offset(range.end.offset);

        let mut cursor = start_index;

        if start_rem > 0 {
            let Some(run) = parent.children[cursor].as_text_mut() else {
                panic!("range start resolves inside non-text child at {:?}", parent_path);
            };
            if cursor == end_index {
                // entirely inside one run
                let from = byte_of_char(&run.data, start_rem);
                let to = byte_of_char(&run.data, end_rem);
                run.data.replace_range(from..to, "");
                self.records.push(ChangeRecord::Remove {
                    position: child_path(&parent_path, cursor),
                    name: TEXT_SENTINEL.to_string(),
                });
                return;
            }
            let from = byte_of_char(&run.data, start_rem);
            run.data.truncate(from);
            self.records.push(ChangeRecord::Remove {
                position: child_path(&parent_path, cursor),
                name: TEXT_SENTINEL.to_string(),
            });
            cursor += 1;
        }

        for _ in cursor..end_index {
            let parent = resolve_element_mut(self.doc, &parent_path);
            let removed = parent.children.remove(cursor);
            self.records.push(ChangeRecord::Remove {
                position: child_path(&parent_path, cursor),
                name: removed.name().to_string(),
            });
        }

        if end_rem > 0 {
            let parent = resolve_element_mut(self.doc, &parent_path);
            let Some(run) = parent.children[cursor].as_text_mut() else {
                panic!("range end resolves inside non-text child at {:?}", parent_path);
            };
            let to = byte_of_char(&run.data, end_rem);
            run.data.replace_range(..to, "");
            self.records.push(ChangeRecord::Remove {
                position: child_path(&parent_path, cursor),
                name: TEXT_SENTINEL.to_string(),
            });
        }

        self.merge_if_compatible(&parent_path, cursor);
    }

    /// Set (`Some`) or remove (`None`) an attribute over a flat range.
    /// Partially covered runs are split at the range boundaries and
    /// compatible neighbors re-merged afterwards; records are emitted
    /// with indices valid in the final tree.
    pub fn set_attribute(&mut self, range: &Range, key: &str, value: Option<AttrValue>) {
        if range.is_collapsed() {
            return;
        }
        if range.start.parent != range.end.parent {
            panic!("cross-parent ranges are not supported");
        }
        let parent_path = range.start.parent.clone();
        let parent = resolve_element_mut(self.doc, &parent_path);
        let (si, sr) = parent.child_at_offset(range.start.offset);
        let (ei, er) = parent.child_at_offset(range.end.offset);

        let mut start_index = si;
        let mut end_index = ei;
        if er > 0 {
            split_text_child(parent, ei, er);
            end_index = ei + 1;
        }
        if sr > 0 {
            split_text_child(parent, si, sr);
            start_index = si + 1;
            end_index += 1;
        }

        // Apply, remembering which children actually changed.
        let mut touched: Vec<(usize, Option<AttrValue>)> = Vec::new();
        for i in start_index..end_index {
            let attrs = match &mut parent.children[i] {
                Node::Element(el) => &mut el.attributes,
                Node::Text(run) => &mut run.attributes,
            };
            let old = attrs.get(key).cloned();
            if old == value {
                continue;
            }
            match &value {
                Some(v) => {
                    attrs.insert(key.to_string(), v.clone());
                }
                None => {
                    attrs.remove(key);
                }
            }
            touched.push((i, old));
        }

        // Re-merge runs made compatible by the change (including the
        // split leftovers when the change was a no-op for them).
        let mut i = start_index.saturating_sub(1).max(1);
        let mut bound = end_index + 1;
        while i < parent.children.len() && i < bound {
            let compatible = matches!(
                (&parent.children[i - 1], &parent.children[i]),
                (Node::Text(a), Node::Text(b)) if a.attributes == b.attributes
            );
            if compatible {
                if let Node::Text(right) = parent.children.remove(i) {
                    if let Some(left) = parent.children[i - 1].as_text_mut() {
                        left.data.push_str(&right.data);
                    }
                }
                for (idx, _) in touched.iter_mut() {
                    if *idx >= i {
                        *idx -= 1;
                    }
                }
                bound -= 1;
            } else {
                i += 1;
            }
        }

        let mut last_emitted = None;
        for (idx, old) in touched {
            if last_emitted == Some(idx) {
                continue;
            }
            last_emitted = Some(idx);
            self.records.push(ChangeRecord::Attribute {
                range: ChildRange::single(parent_path.clone(), idx),
                key: key.to_string(),
                old_value: old,
                new_value: value.clone(),
            });
        }
    }

    /// Set or remove an attribute on the single node at `path`.
    pub fn set_node_attribute(&mut self, path: &[usize], key: &str, value: Option<AttrValue>) {
        let Some((index, parent_path)) = path.split_last() else {
            panic!("cannot set attributes on the document root");
        };
        let parent = resolve_element_mut(self.doc, parent_path);
        let attrs = match &mut parent.children[*index] {
            Node::Element(el) => &mut el.attributes,
            Node::Text(run) => &mut run.attributes,
        };
        let old = attrs.get(key).cloned();
        if old == value {
            return;
        }
        match &value {
            Some(v) => {
                attrs.insert(key.to_string(), v.clone());
            }
            None => {
                attrs.remove(key);
            }
        }
        self.records.push(ChangeRecord::Attribute {
            range: ChildRange::single(parent_path.to_vec(), *index),
            key: key.to_string(),
            old_value: old,
            new_value: value,
        });
        self.merge_if_compatible(parent_path, *index + 1);
        self.merge_if_compatible(parent_path, *index);
    }

    /// Change an element's name in place. Reported as remove + insert
    /// at the same position, so subscribers re-derive the subtree.
    pub fn rename(&mut self, path: &[usize], new_name: &str) {
        let Some(node) = self.doc.root_mut().descendant_mut(path) else {
            panic!("unresolvable model path {:?}", path);
        };
        let Some(el) = node.as_element_mut() else {
            panic!("rename target at {:?} is not an element", path);
        };
        let old = std::mem::replace(&mut el.name, new_name.to_string());
        self.records.push(ChangeRecord::Remove {
            position: path.to_vec(),
            name: old,
        });
        self.records.push(ChangeRecord::Insert {
            position: path.to_vec(),
            name: new_name.to_string(),
            length: 1,
        });
    }

    /// Move the node at `path` into a fresh wrapper element taking its
    /// place. Reported like a rename: remove + insert at the position.
    pub fn wrap(&mut self, path: &[usize], wrapper_name: &str) {
        let Some((index, parent_path)) = path.split_last() else {
            panic!("cannot wrap the document root");
        };
        let parent = resolve_element_mut(self.doc, parent_path);
        let inner = parent.children.remove(*index);
        let inner_name = inner.name().to_string();
        let mut wrapper = Element::new(wrapper_name);
        wrapper.children.push(inner);
        parent.children.insert(*index, Node::Element(wrapper));
        self.records.push(ChangeRecord::Remove {
            position: path.to_vec(),
            name: inner_name,
        });
        self.records.push(ChangeRecord::Insert {
            position: path.to_vec(),
            name: wrapper_name.to_string(),
            length: 1,
        });
    }

    /// Replace the selection. Selection changes emit no records.
    pub fn set_selection(&mut self, selection: Selection) {
        self.doc.set_selection_internal(selection);
    }

    /// Replace only the attribute set carried by the caret.
    pub fn set_selection_attributes(&mut self, attributes: Attributes) {
        self.doc.set_selection_attributes_internal(attributes);
    }

    fn merge_if_compatible(&mut self, parent_path: &[usize], index: usize) {
        let parent = resolve_element_mut(self.doc, parent_path);
        if index == 0 || index >= parent.children.len() {
            return;
        }
        let compatible = matches!(
            (&parent.children[index - 1], &parent.children[index]),
            (Node::Text(a), Node::Text(b)) if a.attributes == b.attributes
        );
        if !compatible {
            return;
        }
        if let Node::Text(right) = parent.children.remove(index) {
            if let Some(left) = parent.children[index - 1].as_text_mut() {
                left.data.push_str(&right.data);
            }
            self.records.push(ChangeRecord::Remove {
                position: child_path(parent_path, index),
                name: TEXT_SENTINEL.to_string(),
            });
        }
    }
}

fn resolve_element_mut<'t>(doc: &'t mut Document, path: &[usize]) -> &'t mut Element {
    match doc.root_mut().descendant_element_mut(path) {
        Some(el) => el,
        None => panic!("unresolvable model path {:?}", path),
    }
}

/// Split the text child at `index` after `inner` chars. Both halves
/// keep the run's attributes; no record is emitted — callers report
/// the higher-level effect that caused the split.
fn split_text_child(parent: &mut Element, index: usize, inner: usize) {
    let Some(run) = parent.children[index].as_text_mut() else {
        panic!("split target at index {} is not a text run", index);
    };
    let at = byte_of_char(&run.data, inner);
    let right = run.data.split_off(at);
    let attrs = run.attributes.clone();
    parent
        .children
        .insert(index + 1, Node::Text(TextRun::new(right, attrs)));
}

fn child_path(parent: &[usize], index: usize) -> NodePath {
    let mut path = parent.to_vec();
    path.push(index);
    path
}
