//! Block marker recognition: prefixes typed at the start of a plain
//! paragraph.

use crate::engine::MarkerEngine;
use crate::markers::MarkerDefinition;
use overmark_model::{
    value_param, AttrValue, AttributeToggleCommand, Attributes, BlockQuoteCommand,
    CodeBlockCommand, Document, HeadingCommand, HorizontalRuleCommand, ListCommand, Position,
    Selection,
};
use std::sync::Arc;

fn engine_with_defaults(doc: &mut Document) -> MarkerEngine {
    doc.register_command("bold", Arc::new(AttributeToggleCommand::new("bold")));
    doc.register_command("heading", Arc::new(HeadingCommand::new(3)));
    doc.register_command("bulletedList", Arc::new(ListCommand::new("bulleted")));
    doc.register_command("numberedList", Arc::new(ListCommand::new("numbered")));
    doc.register_command("blockQuote", Arc::new(BlockQuoteCommand));
    doc.register_command("codeBlock", Arc::new(CodeBlockCommand));
    doc.register_command("horizontalRule", Arc::new(HorizontalRuleCommand));

    let mut engine = MarkerEngine::new();
    engine.add("**", MarkerDefinition::inline("**", "bold"));
    for level in 1..=3u8 {
        let prefix = format!("{} ", "#".repeat(level as usize));
        engine.add(
            prefix.clone(),
            MarkerDefinition::block(prefix, "heading")
                .with_params(value_param(format!("heading{level}"))),
        );
    }
    engine.add("* ", MarkerDefinition::block("* ", "bulletedList"));
    engine.add("- ", MarkerDefinition::block("- ", "bulletedList"));
    engine.add("1. ", MarkerDefinition::block("1. ", "numberedList"));
    engine.add("> ", MarkerDefinition::block("> ", "blockQuote"));
    engine.add("```", MarkerDefinition::block("```", "codeBlock"));
    engine.add("---", MarkerDefinition::block("---", "horizontalRule"));
    engine
}

fn pump(doc: &mut Document, engine: &mut MarkerEngine) {
    while let Some(batch) = doc.take_batch() {
        engine.handle_batch(doc, &batch);
    }
}

fn type_char(doc: &mut Document, engine: &mut MarkerEngine, c: char) {
    let caret = doc.selection().start.clone();
    let attrs = doc.selection().attributes.clone();
    doc.change(|w| {
        w.insert_text(&caret, &c.to_string(), &attrs);
        w.set_selection(Selection::collapsed(caret.shifted(1), attrs.clone()));
    });
    pump(doc, engine);
}

fn type_str(doc: &mut Document, engine: &mut MarkerEngine, s: &str) {
    for c in s.chars() {
        type_char(doc, engine, c);
    }
}

#[test]
fn test_hash_space_converts_existing_text_to_heading() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "test");
    doc.change(|w| {
        w.set_selection(Selection::collapsed(
            Position::new(vec![0], 0),
            Attributes::new(),
        ));
    });
    pump(&mut doc, &mut engine);

    type_char(&mut doc, &mut engine, '#');
    // prefix incomplete, still a paragraph
    assert_eq!(doc.element_at(&[0]).unwrap().name, "paragraph");

    type_char(&mut doc, &mut engine, ' ');
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "heading1");
    assert_eq!(block.leading_text(), "test");
    assert_eq!(doc.selection().start, Position::new(vec![0], 0));
}

#[test]
fn test_deeper_heading_levels() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "## ");
    assert_eq!(doc.element_at(&[0]).unwrap().name, "heading2");

    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "### ");
    assert_eq!(doc.element_at(&[0]).unwrap().name, "heading3");
}

#[test]
fn test_dash_and_star_bullets() {
    for prefix in ["- ", "* "] {
        let mut doc = Document::new();
        let mut engine = engine_with_defaults(&mut doc);
        type_str(&mut doc, &mut engine, prefix);
        let block = doc.element_at(&[0]).unwrap();
        assert_eq!(block.name, "listItem");
        assert_eq!(
            block.attributes.get("listType"),
            Some(&AttrValue::from("bulleted"))
        );
        assert_eq!(
            block.attributes.get("listIndent"),
            Some(&AttrValue::Int(0))
        );
        assert!(block.children.is_empty());
    }
}

#[test]
fn test_numbered_list_prefix() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "1. first");
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "listItem");
    assert_eq!(
        block.attributes.get("listType"),
        Some(&AttrValue::from("numbered"))
    );
    assert_eq!(block.leading_text(), "first");
}

#[test]
fn test_quote_prefix_wraps_the_paragraph() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "> hi");
    assert_eq!(doc.element_at(&[0]).unwrap().name, "blockQuote");
    let inner = doc.element_at(&[0, 0]).unwrap();
    assert_eq!(inner.name, "paragraph");
    assert_eq!(inner.leading_text(), "hi");
    assert_eq!(doc.selection().start.parent, vec![0, 0]);
}

#[test]
fn test_triple_dash_inserts_horizontal_rule() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "---");
    assert_eq!(doc.root().children[0].name(), "horizontalRule");
    assert_eq!(doc.root().children[1].name(), "paragraph");
    assert!(doc.element_at(&[1]).unwrap().children.is_empty());
    assert_eq!(doc.selection().start, Position::new(vec![1], 0));
}

#[test]
fn test_code_fence_disables_inline_markers_inside() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "```");
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "codeBlock");
    assert_eq!(
        block.attributes.get("language"),
        Some(&AttrValue::from("plain"))
    );

    type_str(&mut doc, &mut engine, "**x**");
    assert_eq!(doc.element_at(&[0]).unwrap().leading_text(), "**x**");
}

#[test]
fn test_prefix_ignored_outside_plain_paragraphs() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    doc.change(|w| w.rename(&[0], "heading1"));
    pump(&mut doc, &mut engine);
    type_str(&mut doc, &mut engine, "- ");
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "heading1");
    assert_eq!(block.leading_text(), "- ");
}

#[test]
fn test_prefix_ignored_on_attributed_paragraphs() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    doc.change(|w| w.set_node_attribute(&[0], "alignment", Some("center".into())));
    pump(&mut doc, &mut engine);
    type_str(&mut doc, &mut engine, "# ");
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "paragraph");
    assert_eq!(block.leading_text(), "# ");
}

#[test]
fn test_prefix_typed_later_in_the_block_is_ignored() {
    let mut doc = Document::new();
    let mut engine = engine_with_defaults(&mut doc);
    type_str(&mut doc, &mut engine, "x - ");
    let block = doc.element_at(&[0]).unwrap();
    assert_eq!(block.name, "paragraph");
    assert_eq!(block.leading_text(), "x - ");
}
