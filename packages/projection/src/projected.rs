use overmark_model::{Attributes, Element, Node, TextRun};
use serde::{Deserialize, Serialize};

/// Plain, serializable mirror of a document node.
///
/// Field names are compact on purpose, and `attribs`/`children` are
/// omitted entirely when empty — `from_projection` treats a missing
/// field as "none", so an empty map/list must never be serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectedNode {
    Element {
        element: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribs: Option<Attributes>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        children: Option<Vec<ProjectedNode>>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribs: Option<Attributes>,
    },
}

impl ProjectedNode {
    pub fn is_text(&self) -> bool {
        matches!(self, ProjectedNode::Text { .. })
    }

    /// Children slice for elements, empty for text and childless
    /// elements.
    pub fn child_nodes(&self) -> &[ProjectedNode] {
        match self {
            ProjectedNode::Element {
                children: Some(children),
                ..
            } => children,
            _ => &[],
        }
    }
}

fn project_attrs(attrs: &Attributes) -> Option<Attributes> {
    if attrs.is_empty() {
        None
    } else {
        Some(attrs.clone())
    }
}

/// Project a full document subtree into its plain mirror.
pub fn project_node(node: &Node) -> ProjectedNode {
    match node {
        Node::Element(el) => project_element(el),
        Node::Text(run) => ProjectedNode::Text {
            text: run.data.clone(),
            attribs: project_attrs(&run.attributes),
        },
    }
}

pub fn project_element(el: &Element) -> ProjectedNode {
    let children = if el.children.is_empty() {
        None
    } else {
        Some(el.children.iter().map(project_node).collect())
    };
    ProjectedNode::Element {
        element: el.name.clone(),
        attribs: project_attrs(&el.attributes),
        children,
    }
}

/// Inverse transform: build document nodes from a projected tree.
pub fn from_projection(node: &ProjectedNode) -> Node {
    match node {
        ProjectedNode::Element {
            element,
            attribs,
            children,
        } => {
            let mut el = Element::new(element.clone());
            el.attributes = attribs.clone().unwrap_or_default();
            el.children = children
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(from_projection)
                .collect();
            Node::Element(el)
        }
        ProjectedNode::Text { text, attribs } => Node::Text(TextRun::new(
            text.clone(),
            attribs.clone().unwrap_or_default(),
        )),
    }
}
