//! The structure tree: an arena of nodes addressed by handles.
//!
//! Nodes are stored in insertion order, which the engine guarantees to be
//! breadth-first, so a parent always sits at a lower index than its
//! children. Once a build finishes the tree is never mutated.

use crate::core::handle::{NodeHandle, TreeId};
use crate::core::node::{NodeFlags, StructureNode};
use crate::error::{InspectError, Result};

/// Name of the synthetic root node.
pub const ROOT_NAME: &str = "root";

/// Handle-free copy of a node, for comparing trees built at different times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    pub parent_index: Option<usize>,
    pub name: String,
    pub description: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone)]
pub struct StructureTree {
    id: TreeId,
    nodes: Vec<StructureNode>,
    children: Vec<Vec<u32>>,
}

impl StructureTree {
    /// An empty tree; the first node pushed becomes the root.
    pub(crate) fn new() -> Self {
        Self {
            id: TreeId::generate(),
            nodes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a node. A `None` parent is only accepted for the first node.
    pub(crate) fn push(
        &mut self,
        parent: Option<NodeHandle>,
        name: String,
        description: String,
        start: Option<u64>,
        end: Option<u64>,
        flags: NodeFlags,
    ) -> Result<NodeHandle> {
        match parent {
            None if !self.nodes.is_empty() => {
                return Err(InspectError::Internal(format!(
                    "{} already has a root",
                    self.id
                )));
            }
            Some(p) if self.get(p).is_none() => {
                return Err(InspectError::Internal(format!(
                    "parent {} is not part of {}",
                    p, self.id
                )));
            }
            _ => {}
        }
        let index = u32::try_from(self.nodes.len()).map_err(|_| InspectError::ResourceExhausted {
            resource: "node handles".to_string(),
            used: self.nodes.len(),
            limit: u32::MAX as usize,
        })?;
        let handle = NodeHandle::new(self.id, index);
        self.nodes.push(StructureNode {
            handle,
            parent,
            name,
            description,
            start,
            end,
            flags,
        });
        self.children.push(Vec::new());
        if let Some(p) = parent {
            self.children[p.index()].push(index);
        }
        Ok(handle)
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// The synthetic root.
    ///
    /// Panics on a tree that is still empty, which only the engine can
    /// observe while it is building.
    pub fn root(&self) -> &StructureNode {
        &self.nodes[0]
    }

    /// Resolve a handle; handles issued by another tree resolve to `None`.
    pub fn get(&self, handle: NodeHandle) -> Option<&StructureNode> {
        if handle.tree() != self.id {
            return None;
        }
        self.nodes.get(handle.index())
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<&StructureNode> {
        self.get(handle)?.parent.and_then(|p| self.get(p))
    }

    /// Children in enumeration order.
    pub fn children(&self, handle: NodeHandle) -> impl Iterator<Item = &StructureNode> + '_ {
        let indices: &[u32] = match self.get(handle) {
            Some(_) => &self.children[handle.index()],
            None => &[],
        };
        indices.iter().map(move |&i| &self.nodes[i as usize])
    }

    /// All nodes in insertion (breadth-first) order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureNode> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges between the root and `handle`.
    pub fn depth(&self, handle: NodeHandle) -> Option<usize> {
        let mut node = self.get(handle)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Dot-joined names from the root, e.g. `root.entries.[0]`.
    pub fn path(&self, handle: NodeHandle) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            let node = self.get(h)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Some(names.join("."))
    }

    /// Find a node by its dotted path.
    pub fn find_path(&self, path: &str) -> Option<&StructureNode> {
        let mut parts = path.split('.');
        if parts.next()? != ROOT_NAME {
            return None;
        }
        let mut node = self.root();
        for part in parts {
            node = self.children(node.handle).find(|c| c.name == part)?;
        }
        Some(node)
    }

    /// Nodes whose offsets were suppressed by relativity detection.
    pub fn invalidated_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.offsets_invalid()).count()
    }

    /// The tree without its handles, for structural comparison.
    pub fn shape(&self) -> Vec<NodeShape> {
        self.nodes
            .iter()
            .map(|n| NodeShape {
                parent_index: n.parent.map(|p| p.index()),
                name: n.name.clone(),
                description: n.description.clone(),
                start: n.start,
                end: n.end,
                flags: n.flags,
            })
            .collect()
    }
}
