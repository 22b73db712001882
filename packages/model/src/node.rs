use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name reported in change records for text insertions/removals.
pub const TEXT_SENTINEL: &str = "$text";

/// Name of the document root element.
pub const ROOT_NAME: &str = "$root";

/// Serializable attribute value (formatting flags, list types, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Attribute map shared by elements and text runs. BTreeMap keeps
/// serialization order stable.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Document tree node: a named element with ordered children, or a text run.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(TextRun),
}

/// Named element with an attribute map and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

/// Text run: a string payload plus formatting attributes.
///
/// Invariant (maintained by the writer): a parent never holds two
/// adjacent text runs with identical attribute sets.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub data: String,
    pub attributes: Attributes,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Total offset size of this element's content: elements count 1,
    /// text runs one per char.
    pub fn max_offset(&self) -> usize {
        self.children.iter().map(Node::offset_size).sum()
    }

    /// Resolve a model offset to `(child index, offset within child)`.
    ///
    /// An inner offset of 0 means "the gap right before child index";
    /// a non-zero inner offset is only possible inside a text run.
    /// `offset == max_offset()` resolves to `(children.len(), 0)`.
    ///
    /// Panics on an out-of-range offset; positions are producer errors,
    /// not recoverable input.
    pub fn child_at_offset(&self, offset: usize) -> (usize, usize) {
        let mut rem = offset;
        for (i, child) in self.children.iter().enumerate() {
            let size = child.offset_size();
            if rem < size {
                return (i, rem);
            }
            rem -= size;
        }
        if rem == 0 {
            (self.children.len(), 0)
        } else {
            panic!(
                "offset {} out of range for <{}> (max {})",
                offset,
                self.name,
                self.max_offset()
            );
        }
    }

    /// Model offset of the gap right before `child_index`.
    pub fn offset_of_child(&self, child_index: usize) -> usize {
        self.children[..child_index]
            .iter()
            .map(Node::offset_size)
            .sum()
    }

    /// Walk a child-index path below this element.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let child = self.children.get(*first)?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.as_element()?.descendant(rest)
        }
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let child = self.children.get_mut(*first)?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.as_element_mut()?.descendant_mut(rest)
        }
    }

    /// Like `descendant`, but an empty path resolves to this element.
    pub fn descendant_element(&self, path: &[usize]) -> Option<&Element> {
        if path.is_empty() {
            Some(self)
        } else {
            self.descendant(path)?.as_element()
        }
    }

    pub fn descendant_element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        if path.is_empty() {
            Some(self)
        } else {
            self.descendant_mut(path)?.as_element_mut()
        }
    }

    /// Text content of the leading text runs (stops at the first
    /// element child). Used for block-prefix matching.
    pub fn leading_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(run) => out.push_str(&run.data),
                Node::Element(_) => break,
            }
        }
        out
    }
}

impl TextRun {
    pub fn new(data: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            data: data.into(),
            attributes,
        }
    }

    pub fn plain(data: impl Into<String>) -> Self {
        Self::new(data, Attributes::new())
    }

    pub fn char_len(&self) -> usize {
        self.data.chars().count()
    }
}

impl Node {
    pub fn element(name: impl Into<String>) -> Self {
        Node::Element(Element::new(name))
    }

    pub fn text(data: impl Into<String>) -> Self {
        Node::Text(TextRun::plain(data))
    }

    pub fn text_with(data: impl Into<String>, attributes: Attributes) -> Self {
        Node::Text(TextRun::new(data, attributes))
    }

    /// Element name, or the text sentinel for runs.
    pub fn name(&self) -> &str {
        match self {
            Node::Element(el) => &el.name,
            Node::Text(_) => TEXT_SENTINEL,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn offset_size(&self) -> usize {
        match self {
            Node::Element(_) => 1,
            Node::Text(run) => run.char_len(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Element(_) => None,
        }
    }
}

/// Byte index of the `char_index`-th char of `s` (or `s.len()` at the end).
pub(crate) fn byte_of_char(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}
