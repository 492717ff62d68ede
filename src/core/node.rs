//! One visible element of a decoded structure.

use crate::core::byte_range::ByteRange;
use crate::core::handle::NodeHandle;
use bitflags::bitflags;

bitflags! {
    /// Display and correlation flags of a structure node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Display-only field that never owns bytes
        const PSEUDO = 0b001;
        /// Children are positional elements rather than named fields
        const ARRAY = 0b010;
        /// Offsets were suppressed after a relative-offset artifact
        const OFFSETS_INVALID = 0b100;
    }
}

/// A node of a `StructureTree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureNode {
    pub handle: NodeHandle,
    /// `None` only for the root
    pub parent: Option<NodeHandle>,
    pub name: String,
    pub description: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub flags: NodeFlags,
}

impl StructureNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_pseudo(&self) -> bool {
        self.flags.contains(NodeFlags::PSEUDO)
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(NodeFlags::ARRAY)
    }

    pub fn offsets_invalid(&self) -> bool {
        self.flags.contains(NodeFlags::OFFSETS_INVALID)
    }

    /// The bytes this node occupies, if they are known.
    ///
    /// Pseudo nodes never own bytes. Nodes with a missing or inverted bound
    /// have no range.
    pub fn byte_range(&self) -> Option<ByteRange> {
        if self.is_pseudo() {
            return None;
        }
        ByteRange::from_bounds(self.start, self.end)
    }
}
