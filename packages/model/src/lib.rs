//! # Overmark Model
//!
//! Mutable rich-document model: the tree, selection, transaction
//! writer, change-record stream and command registry that the
//! projection and autoformat engines operate against.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: tree + transactions                  │
//! │  - Element / text-run nodes with attributes │
//! │  - Writer: splice, attribute, rename, wrap  │
//! │  - ChangeRecord batches per transaction     │
//! │  - Selection + named formatting commands    │
//! └─────────────────────────────────────────────┘
//!                     ↓ batches
//! ┌─────────────────────────────────────────────┐
//! │ projection: plain-object mirror             │
//! │ autoformat: marker recognition              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core invariants
//!
//! 1. **One root per document**; all paths are child-index walks from it.
//! 2. **No adjacent compatible runs**: the writer merges text runs with
//!    identical attribute sets and reports every merge as a change
//!    record, so the record stream fully explains the tree.
//! 3. **Splice semantics**: `Remove` positions are valid in the
//!    post-removal tree; records must be consumed in emission order.
//! 4. **Synchronous transactions**: a batch is queued only after its
//!    closure finished; no partial state is observable.

mod changes;
mod commands;
mod document;
mod errors;
mod node;
mod position;
mod selection;
mod writer;

pub use changes::{Batch, ChangeRecord, ChildRange};
pub use commands::{
    value_param, AttributeToggleCommand, BlockQuoteCommand, CodeBlockCommand, Command,
    CommandParams, CommandSet, HeadingCommand, HorizontalRuleCommand, ListCommand,
};
pub use document::Document;
pub use errors::CommandError;
pub use node::{AttrValue, Attributes, Element, Node, TextRun, ROOT_NAME, TEXT_SENTINEL};
pub use position::{NodePath, Position, Range};
pub use selection::Selection;
pub use writer::Writer;
