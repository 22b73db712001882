//! Round-trip tests: `set(get())` must reproduce a structurally equal
//! document, through JSON and back, with no attribute-presence loss.

use crate::engine::ProjectionEngine;
use crate::projected::{project_element, ProjectedNode};
use overmark_model::{Attributes, Document, Element, Node, Position};

fn bold() -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("bold".to_string(), true.into());
    attrs
}

fn pump(doc: &mut Document, engine: &mut ProjectionEngine) {
    while let Some(batch) = doc.take_batch() {
        engine.handle_batch(doc, &batch);
    }
}

/// Document exercising every node shape: mixed runs, inline elements,
/// attribute-free elements, attribute-carrying blocks, empty blocks.
fn rich_document() -> Document {
    let mut doc = Document::new();
    doc.change(|w| {
        w.insert_text(&Position::new(vec![0], 0), "plain ", &Attributes::new());
        w.insert_text(&Position::new(vec![0], 6), "bold", &bold());
        w.insert_element(&Position::new(vec![0], 10), Element::new("softBreak"));
        w.insert_node(
            &[],
            1,
            Node::Element(Element::new("heading1").with_child(Node::text("title"))),
        );
        w.insert_node(&[], 2, Node::Element(Element::new("horizontalRule")));
        w.insert_node(
            &[],
            3,
            Node::Element(
                Element::new("listItem")
                    .with_attribute("listType", "numbered")
                    .with_attribute("listIndent", 0i64)
                    .with_child(Node::text("first")),
            ),
        );
        w.insert_node(&[], 4, Node::Element(Element::new("paragraph")));
    });
    doc
}

#[test]
fn test_set_get_round_trip_reproduces_tree() {
    let mut source = rich_document();
    let mut engine = ProjectionEngine::new();
    pump(&mut source, &mut engine);
    let snapshot = engine.get(&source).clone();

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: ProjectedNode = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);

    let mut restored = Document::new();
    let mut restored_engine = ProjectionEngine::new();
    restored_engine.set(&mut restored, &parsed);
    pump(&mut restored, &mut restored_engine);

    assert_eq!(restored.root(), source.root());
    assert_eq!(restored_engine.get(&restored), &snapshot);
}

#[test]
fn test_round_trip_keeps_attribute_presence_distinct() {
    let mut source = rich_document();
    let mut engine = ProjectionEngine::new();
    pump(&mut source, &mut engine);
    let json = serde_json::to_string(engine.get(&source)).unwrap();

    // attribute-free nodes must not gain an empty attribs map
    assert!(!json.contains(r#""attribs":{}"#));
    assert!(json.contains(r#"{"element":"horizontalRule"}"#));
    assert!(json.contains(r#""listType":"numbered""#));

    let parsed: ProjectedNode = serde_json::from_str(&json).unwrap();
    let mut restored = Document::new();
    ProjectionEngine::new().set(&mut restored, &parsed);
    while restored.take_batch().is_some() {}
    let hr = restored.element_at(&[2]).unwrap();
    assert!(hr.attributes.is_empty());
    let item = restored.element_at(&[3]).unwrap();
    assert_eq!(item.attributes.len(), 2);
}

#[test]
fn test_set_is_one_atomic_batch() {
    let mut source = rich_document();
    let mut engine = ProjectionEngine::new();
    pump(&mut source, &mut engine);
    let snapshot = engine.get(&source).clone();

    let mut restored = Document::new();
    let mut restored_engine = ProjectionEngine::new();
    restored_engine.set(&mut restored, &snapshot);

    let batch = restored.take_batch().unwrap();
    assert!(restored.take_batch().is_none());
    assert!(!batch.is_empty());
}

#[test]
fn test_set_clears_selection() {
    let mut doc = rich_document();
    while doc.take_batch().is_some() {}
    let mut engine = ProjectionEngine::new();
    let snapshot = engine.get(&doc).clone();

    let mut restored = Document::new();
    ProjectionEngine::new().set(&mut restored, &snapshot);
    let sel = restored.selection();
    assert!(sel.is_collapsed());
    assert_eq!(sel.start.parent, vec![0]);
    assert_eq!(sel.start.offset, 0);
    assert!(sel.attributes.is_empty());
}

#[test]
fn test_set_with_empty_tree_empties_the_root() {
    let mut doc = rich_document();
    while doc.take_batch().is_some() {}
    let mut engine = ProjectionEngine::new();
    engine.get(&doc);

    let empty = ProjectedNode::Element {
        element: "$root".to_string(),
        attribs: None,
        children: None,
    };
    engine.set(&mut doc, &empty);
    pump(&mut doc, &mut engine);
    assert!(doc.root().children.is_empty());
    assert_eq!(engine.get(&doc), &project_element(doc.root()));
}
