use crate::config::EditorConfig;
use crate::errors::EditorError;
use overmark_autoformat::{MarkerDefinition, MarkerEngine};
use overmark_model::{
    value_param, AttributeToggleCommand, BlockQuoteCommand, CodeBlockCommand, CommandError,
    CommandParams, Document, HeadingCommand, HorizontalRuleCommand, ListCommand, Selection, Writer,
};
use overmark_projection::{ProjectedNode, ProjectionEngine};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type DataChangedListener = Box<dyn FnMut(&ProjectedNode)>;

/// Editor facade wiring the document, the projection mirror and the
/// marker engine together.
///
/// Every mutating entry point ends with [`pump`](Self::pump): queued
/// batches are delivered to the projection first (so data-changed
/// listeners observe a mirror consistent with the live tree), then to
/// the marker engine, whose conversions queue further batches that the
/// same loop drains. All of it is synchronous; when a call returns, the
/// document, the mirror and the listeners are settled.
pub struct Editor {
    document: Document,
    projection: ProjectionEngine,
    autoformat: MarkerEngine,
    listeners: Vec<DataChangedListener>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let mut document = Document::new();
        register_commands(&mut document, &config);
        let autoformat = build_markers(&config);
        Self {
            document,
            projection: ProjectionEngine::new(),
            autoformat,
            listeners: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        self.document.selection()
    }

    /// Subscribe to data changes. The listener fires once per delivered
    /// batch that changed document data, with the updated projection.
    pub fn on_data_changed(&mut self, listener: impl FnMut(&ProjectedNode) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Current projection of the document content.
    pub fn get_data(&mut self) -> &ProjectedNode {
        self.projection.get(&self.document)
    }

    /// Replace the document content from a projected tree.
    pub fn set_data(&mut self, tree: &ProjectedNode) {
        self.projection.set(&mut self.document, tree);
        self.pump();
    }

    /// JSON snapshot of the current content.
    pub fn get_data_json(&mut self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(self.get_data())?)
    }

    /// Restore content from a JSON snapshot produced by
    /// [`get_data_json`](Self::get_data_json).
    pub fn set_data_json(&mut self, json: &str) -> Result<(), EditorError> {
        let tree: ProjectedNode = serde_json::from_str(json)?;
        self.set_data(&tree);
        Ok(())
    }

    /// Insert text at the caret the way interactive typing does: one
    /// transaction per character, caret moved along, markers recognized
    /// after every character.
    pub fn type_text(&mut self, text: &str) {
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let caret = self.document.selection().start.clone();
            let attrs = self.document.selection().attributes.clone();
            self.document.change(|w| {
                w.insert_text(&caret, c.encode_utf8(&mut buf), &attrs);
                w.set_selection(Selection::collapsed(caret.shifted(1), attrs.clone()));
            });
            self.pump();
        }
    }

    /// Insert text at the caret as one programmatic transaction. Never
    /// triggers marker recognition.
    pub fn insert_text(&mut self, text: &str) {
        let caret = self.document.selection().start.clone();
        let attrs = self.document.selection().attributes.clone();
        let length = text.chars().count();
        self.document.change(|w| {
            w.insert_text(&caret, text, &attrs);
            w.set_selection(Selection::collapsed(caret.shifted(length), attrs.clone()));
        });
        self.pump();
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.document.change(|w| w.set_selection(selection));
        self.pump();
    }

    /// Run an arbitrary transaction against the document, then drain
    /// the dispatch loop.
    pub fn change<F: FnOnce(&mut Writer)>(&mut self, f: F) {
        self.document.change(f);
        self.pump();
    }

    /// Execute a registered command against the current selection.
    pub fn execute(&mut self, name: &str, params: &CommandParams) -> Result<(), EditorError> {
        let Some(command) = self.document.commands().get(name) else {
            return Err(CommandError::Unknown(name.to_string()).into());
        };
        if !command.is_enabled(&self.document) {
            return Err(CommandError::Disabled(name.to_string()).into());
        }
        debug!(command = name, "executing command");
        self.document.change(|w| command.execute(w, params));
        self.pump();
        Ok(())
    }

    /// Drain queued batches: projection first, listeners on data
    /// change, then marker recognition (whose conversions queue more
    /// batches for the same loop).
    fn pump(&mut self) {
        while let Some(batch) = self.document.take_batch() {
            let changed = self.projection.handle_batch(&self.document, &batch);
            if changed && !self.listeners.is_empty() {
                let snapshot = self.projection.get(&self.document).clone();
                for listener in &mut self.listeners {
                    listener(&snapshot);
                }
            }
            self.autoformat.handle_batch(&mut self.document, &batch);
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.document)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn register_commands(document: &mut Document, config: &EditorConfig) {
    document.register_command("bold", Arc::new(AttributeToggleCommand::new("bold")));
    document.register_command("italic", Arc::new(AttributeToggleCommand::new("italic")));
    document.register_command(
        "strikethrough",
        Arc::new(AttributeToggleCommand::new("strikethrough")),
    );
    document.register_command("code", Arc::new(AttributeToggleCommand::new("code")));
    document.register_command("heading", Arc::new(HeadingCommand::new(config.heading_levels)));
    document.register_command("bulletedList", Arc::new(ListCommand::new("bulleted")));
    document.register_command("numberedList", Arc::new(ListCommand::new("numbered")));
    document.register_command("blockQuote", Arc::new(BlockQuoteCommand));
    document.register_command("codeBlock", Arc::new(CodeBlockCommand));
    document.register_command("horizontalRule", Arc::new(HorizontalRuleCommand));
}

fn build_markers(config: &EditorConfig) -> MarkerEngine {
    let mut engine = MarkerEngine::new();
    if config.inline_formatting {
        engine.add("**", MarkerDefinition::inline("**", "bold"));
        engine.add("__", MarkerDefinition::inline("__", "bold"));
        engine.add("~", MarkerDefinition::inline("~", "strikethrough"));
        engine.add("*", MarkerDefinition::inline("*", "italic"));
        engine.add("_", MarkerDefinition::inline("_", "italic"));
        engine.add("`", MarkerDefinition::inline("`", "code"));
    }
    if config.block_formatting {
        for level in 1..=config.heading_levels {
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
    }
    engine
}
