//! Incremental-maintenance tests: after any sequence of change records,
//! the mirror must equal a projection rebuilt from scratch by walking
//! the live tree.

use crate::engine::ProjectionEngine;
use crate::projected::project_element;
use overmark_model::{
    AttrValue, Attributes, Batch, ChangeRecord, ChildRange, Document, Element, Node, Position,
    Range,
};

fn bold() -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("bold".to_string(), AttrValue::Bool(true));
    attrs
}

fn pump(doc: &mut Document, engine: &mut ProjectionEngine) {
    while let Some(batch) = doc.take_batch() {
        engine.handle_batch(doc, &batch);
    }
}

fn assert_mirror_current(doc: &Document, engine: &mut ProjectionEngine) {
    let rebuilt = project_element(doc.root());
    assert_eq!(engine.get(doc), &rebuilt);
}

/// Engine primed with "plain bold plain" content in one paragraph.
fn primed() -> (Document, ProjectionEngine) {
    let mut doc = Document::new();
    doc.change(|w| {
        w.insert_text(&Position::new(vec![0], 0), "one ", &Attributes::new());
        w.insert_text(&Position::new(vec![0], 4), "two", &bold());
        w.insert_text(&Position::new(vec![0], 7), " three", &Attributes::new());
    });
    let mut engine = ProjectionEngine::new();
    pump(&mut doc, &mut engine);
    engine.get(&doc);
    (doc, engine)
}

#[test]
fn test_single_character_insert() {
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.insert_text(&Position::new(vec![0], 2), "X", &Attributes::new()));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_multi_character_programmatic_insert() {
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.insert_text(&Position::new(vec![0], 4), "pasted text", &bold()));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_deletion_at_run_boundaries() {
    // start of a run
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.remove_range(&Range::flat(vec![0], 4, 1)));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);

    // middle of a run
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.remove_range(&Range::flat(vec![0], 5, 1)));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);

    // end of a run
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.remove_range(&Range::flat(vec![0], 6, 1)));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_deletion_that_merges_two_runs() {
    let (mut doc, mut engine) = primed();
    // deleting the whole bold run merges its plain neighbors
    doc.change(|w| w.remove_range(&Range::flat(vec![0], 4, 3)));
    pump(&mut doc, &mut engine);
    assert_eq!(doc.element_at(&[0]).unwrap().children.len(), 1);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_attribute_change_spanning_element_and_text() {
    let (mut doc, mut engine) = primed();
    doc.change(|w| {
        w.insert_element(&Position::new(vec![0], 4), Element::new("softBreak"));
    });
    pump(&mut doc, &mut engine);
    doc.change(|w| {
        w.set_attribute(
            &Range::flat(vec![0], 2, 8),
            "highlight",
            Some(AttrValue::Bool(true)),
        );
    });
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_element_inserted_between_identical_runs() {
    let (mut doc, mut engine) = primed();
    // offset 2 is inside the first plain run: the host splits it into
    // two identical-attribute runs around the element
    doc.change(|w| {
        w.insert_element(&Position::new(vec![0], 2), Element::new("softBreak"));
    });
    pump(&mut doc, &mut engine);
    let children = &doc.element_at(&[0]).unwrap().children;
    assert!(children[0].is_text() && children[2].is_text());
    assert_eq!(children[1].name(), "softBreak");
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_element_removal_that_merges_neighbors() {
    let (mut doc, mut engine) = primed();
    doc.change(|w| {
        w.insert_element(&Position::new(vec![0], 2), Element::new("softBreak"));
    });
    pump(&mut doc, &mut engine);
    doc.change(|w| w.remove_node(&[0], 1));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_rename_reprojects_subtree() {
    let (mut doc, mut engine) = primed();
    doc.change(|w| w.rename(&[0], "heading1"));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_multi_node_attribute_range_record() {
    // Writers may report one attribute record covering several
    // siblings; the engine must handle the whole range.
    let (mut doc, mut engine) = primed();
    doc.change(|w| {
        w.insert_element(&Position::new(vec![0], 4), Element::new("softBreak"));
    });
    pump(&mut doc, &mut engine);

    // mutate silently, then feed a single wide-range record
    doc.change(|w| {
        w.set_attribute(
            &Range::flat(vec![0], 0, 11),
            "highlight",
            Some(AttrValue::Bool(true)),
        );
    });
    let _ = doc.take_batch();
    let children = doc.element_at(&[0]).unwrap().children.len();
    let batch = Batch {
        records: vec![ChangeRecord::Attribute {
            range: ChildRange::new(vec![0], 0, children),
            key: "highlight".to_string(),
            old_value: None,
            new_value: Some(AttrValue::Bool(true)),
        }],
    };
    engine.handle_batch(&doc, &batch);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_empty_children_are_pruned() {
    let mut doc = Document::new();
    doc.change(|w| w.insert_text(&Position::new(vec![0], 0), "x", &Attributes::new()));
    let mut engine = ProjectionEngine::new();
    pump(&mut doc, &mut engine);
    engine.get(&doc);

    doc.change(|w| w.remove_range(&Range::flat(vec![0], 0, 1)));
    pump(&mut doc, &mut engine);

    let json = serde_json::to_string(engine.get(&doc)).unwrap();
    assert_eq!(
        json,
        r#"{"element":"$root","children":[{"element":"paragraph"}]}"#
    );
    assert!(!json.contains("children\":[]"));
}

#[test]
fn test_batches_before_first_access_are_cheap() {
    // the mirror is built on first get(), not on document creation
    let mut doc = Document::new();
    let mut engine = ProjectionEngine::new();
    doc.change(|w| w.insert_text(&Position::new(vec![0], 0), "early", &Attributes::new()));
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}

#[test]
fn test_data_changed_signal_per_batch() {
    let mut doc = Document::new();
    let mut engine = ProjectionEngine::new();
    engine.get(&doc);

    doc.change(|w| {
        w.insert_text(&Position::new(vec![0], 0), "ab", &Attributes::new());
        w.insert_text(&Position::new(vec![0], 2), "cd", &bold());
    });
    let batch = doc.take_batch().unwrap();
    assert!(engine.handle_batch(&doc, &batch));
    assert!(!engine.handle_batch(&doc, &Batch::default()));
}

#[test]
fn test_insert_subtree_projects_wholesale() {
    let mut doc = Document::new();
    let mut engine = ProjectionEngine::new();
    engine.get(&doc);
    doc.change(|w| {
        let item = Element::new("listItem")
            .with_attribute("listType", "bulleted")
            .with_attribute("listIndent", 0i64)
            .with_child(Node::text("nested"));
        w.insert_node(&[], 1, Node::Element(item));
    });
    pump(&mut doc, &mut engine);
    assert_mirror_current(&doc, &mut engine);
}
