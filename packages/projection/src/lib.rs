//! Live Tree Projection Engine: a plain, serializable mirror of the
//! document tree, updated incrementally from change records and
//! replaceable wholesale through `set`.
//!
//! Surrounding glue uses this to snapshot/restore editor content far
//! faster than serializing to the final output format.

pub mod engine;
pub mod projected;

#[cfg(test)]
mod tests_incremental;

#[cfg(test)]
mod tests_roundtrip;

pub use engine::ProjectionEngine;
pub use projected::{from_projection, project_element, project_node, ProjectedNode};
