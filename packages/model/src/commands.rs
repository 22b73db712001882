use crate::document::Document;
use crate::node::{AttrValue, Element, Node};
use crate::position::Position;
use crate::selection::Selection;
use crate::writer::Writer;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Optional parameters passed to a command (e.g. the heading level).
pub type CommandParams = BTreeMap<String, AttrValue>;

/// Build the common single-`value` parameter map.
pub fn value_param(value: impl Into<AttrValue>) -> CommandParams {
    let mut params = CommandParams::new();
    params.insert("value".to_string(), value.into());
    params
}

/// Named formatting command operating on the current selection.
///
/// Commands are infallible once enabled: `is_enabled` is the contract
/// for "can this run against the current selection context", and a
/// disabled command is simply not executed by callers.
pub trait Command: std::fmt::Debug + Send + Sync {
    fn is_enabled(&self, doc: &Document) -> bool;
    fn execute(&self, writer: &mut Writer<'_>, params: &CommandParams);
}

/// Registry of commands, keyed by name.
#[derive(Debug, Default)]
pub struct CommandSet {
    map: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, command: Arc<dyn Command>) {
        self.map.insert(name.into(), command);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.map.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

fn block_name(doc: &Document) -> Option<String> {
    let path = doc.selection_block_path()?;
    doc.element_at(&path).map(|el| el.name.clone())
}

fn is_headable(name: &str) -> bool {
    name == "paragraph" || name.starts_with("heading")
}

/// Toggle an inline formatting attribute (bold, italic, strikethrough,
/// inline code) over the selection. A collapsed selection only flips
/// the caret attribute set, so freshly typed text picks it up.
#[derive(Debug)]
pub struct AttributeToggleCommand {
    key: String,
}

impl AttributeToggleCommand {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for AttributeToggleCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        !doc.in_code_context(doc.selection().first_position())
    }

    fn execute(&self, writer: &mut Writer<'_>, _params: &CommandParams) {
        let sel = writer.document().selection().clone();
        if sel.is_collapsed() {
            let mut attrs = sel.attributes;
            if attrs.remove(&self.key).is_none() {
                attrs.insert(self.key.clone(), AttrValue::Bool(true));
            }
            writer.set_selection_attributes(attrs);
            return;
        }
        let range = sel.range();
        let value = if writer.document().range_has_attribute(&range, &self.key) {
            None
        } else {
            Some(AttrValue::Bool(true))
        };
        writer.set_attribute(&range, &self.key, value);
    }
}

/// Turn the selected block into a heading. The `value` parameter names
/// the target (`heading1`..`heading<levels>`).
#[derive(Debug)]
pub struct HeadingCommand {
    levels: u8,
}

impl HeadingCommand {
    pub fn new(levels: u8) -> Self {
        Self { levels }
    }
}

impl Command for HeadingCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        block_name(doc).as_deref().is_some_and(is_headable)
    }

    fn execute(&self, writer: &mut Writer<'_>, params: &CommandParams) {
        let Some(block) = writer.document().selection_block_path() else {
            return;
        };
        let target = params
            .get("value")
            .and_then(AttrValue::as_str)
            .unwrap_or("heading1")
            .to_string();
        let level: u8 = match target.strip_prefix("heading").and_then(|n| n.parse().ok()) {
            Some(level) => level,
            None => return,
        };
        if level == 0 || level > self.levels {
            return;
        }
        writer.rename(&block, &target);
    }
}

/// Turn the selected block into a list item of the given type.
#[derive(Debug)]
pub struct ListCommand {
    list_type: String,
}

impl ListCommand {
    pub fn new(list_type: impl Into<String>) -> Self {
        Self {
            list_type: list_type.into(),
        }
    }
}

impl Command for ListCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        block_name(doc).is_some_and(|name| name != "codeBlock")
    }

    fn execute(&self, writer: &mut Writer<'_>, _params: &CommandParams) {
        let Some(block) = writer.document().selection_block_path() else {
            return;
        };
        writer.rename(&block, "listItem");
        writer.set_node_attribute(&block, "listType", Some(self.list_type.as_str().into()));
        writer.set_node_attribute(&block, "listIndent", Some(AttrValue::Int(0)));
    }
}

/// Wrap the selected block in a block quote.
#[derive(Debug)]
pub struct BlockQuoteCommand;

impl Command for BlockQuoteCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        // only direct children of the root, no nested quoting here
        doc.selection_block_path().is_some_and(|p| p.len() == 1)
    }

    fn execute(&self, writer: &mut Writer<'_>, _params: &CommandParams) {
        let sel = writer.document().selection().clone();
        let Some(block) = writer.document().selection_block_path() else {
            return;
        };
        writer.wrap(&block, "blockQuote");
        // the block moved one level down; keep the caret inside it
        let mut inner = block;
        inner.push(0);
        writer.set_selection(Selection::collapsed(
            Position::new(inner, sel.start.offset),
            sel.attributes,
        ));
    }
}

/// Turn the selected block into a code block.
#[derive(Debug)]
pub struct CodeBlockCommand;

impl Command for CodeBlockCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        block_name(doc).as_deref().is_some_and(is_headable)
    }

    fn execute(&self, writer: &mut Writer<'_>, _params: &CommandParams) {
        let Some(block) = writer.document().selection_block_path() else {
            return;
        };
        writer.rename(&block, "codeBlock");
        writer.set_node_attribute(&block, "language", Some("plain".into()));
    }
}

/// Insert a horizontal rule right before the selected block.
#[derive(Debug)]
pub struct HorizontalRuleCommand;

impl Command for HorizontalRuleCommand {
    fn is_enabled(&self, doc: &Document) -> bool {
        doc.selection_block_path().is_some_and(|p| p.len() == 1)
    }

    fn execute(&self, writer: &mut Writer<'_>, _params: &CommandParams) {
        let sel = writer.document().selection().clone();
        let Some(block) = writer.document().selection_block_path() else {
            return;
        };
        if block.len() != 1 {
            return;
        }
        let index = block[0];
        writer.insert_node(&[], index, Node::Element(Element::new("horizontalRule")));
        // the block shifted one slot to the right
        writer.set_selection(Selection::collapsed(
            Position::new(vec![index + 1], sel.start.offset),
            sel.attributes,
        ));
    }
}
