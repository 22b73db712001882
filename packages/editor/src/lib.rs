//! # Overmark Editor
//!
//! Editor facade over the model, projection and autoformat crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor: facade + dispatch loop              │
//! │  - typing / programmatic insertion          │
//! │  - command registry wiring per config       │
//! │  - data snapshot (get/set, JSON)            │
//! │  - data-changed listeners, once per batch   │
//! └─────────────────────────────────────────────┘
//!             ↓ batches            ↓ batches
//! ┌──────────────────────┐ ┌──────────────────────┐
//! │ projection: mirror   │ │ autoformat: markers  │
//! └──────────────────────┘ └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use overmark_editor::{Editor, EditorConfig};
//!
//! let mut editor = Editor::new(EditorConfig::default());
//! editor.type_text("**important**");
//! let json = editor.get_data_json().unwrap();
//! assert!(json.contains("important"));
//! ```

mod config;
mod editor;
mod errors;

pub use config::EditorConfig;
pub use editor::Editor;
pub use errors::EditorError;
