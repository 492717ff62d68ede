//! Opaque node identifiers.
//!
//! A handle pairs the node's arena index with the id of the tree that
//! issued it. Every build mints a fresh `TreeId`, so handles held by a view
//! across a refresh stop resolving instead of pointing at unrelated nodes.

use std::fmt;
use uuid::Uuid;

/// Identity of one structure tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(Uuid);

impl TreeId {
    pub(crate) fn generate() -> Self {
        TreeId(Uuid::new_v4())
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree:{}", self.0)
    }
}

/// Stable identifier of a `StructureNode` within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    tree: TreeId,
    index: u32,
}

impl NodeHandle {
    pub(crate) fn new(tree: TreeId, index: u32) -> Self {
        Self { tree, index }
    }

    /// The tree that issued this handle.
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Insertion position of the node; the root is 0.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}
