//! Marker Recognition Engine: markdown-style autoformatting. Typed
//! delimiters (`**bold**`, `` `code` ``) and block prefixes (`# `,
//! `- `, ` ``` `) are recognized from the change-record stream and
//! converted into formatting-command executions, transactionally.

pub mod engine;
pub mod markers;

#[cfg(test)]
mod tests_block;


pub use engine::MarkerEngine;
pub use markers::{MarkerDefinition, MarkerKind};
