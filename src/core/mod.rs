//! Core data types for structscope.
//!
//! The structure tree produced by the engine, its nodes, the handles that
//! address them, and the byte ranges they occupy.

pub mod byte_range;
pub mod handle;
pub mod node;
pub mod tree;

pub use byte_range::ByteRange;
pub use handle::{NodeHandle, TreeId};
pub use node::{NodeFlags, StructureNode};
pub use tree::{NodeShape, StructureTree, ROOT_NAME};
