//! Offset correlation engine.
//!
//! Walks a decoded value graph breadth-first and produces a
//! `StructureTree` whose byte ranges can be trusted against the buffer.
//!
//! Some decoders re-parse length-prefixed sub-structures from an extracted
//! slice and then report offsets relative to that slice. The signature is a
//! named child at offset 0 under a parent that is not known to start at
//! offset 0, which is impossible for absolute offsets. Such a child, and
//! everything below it, is emitted without offsets.

pub mod budget;

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::{BuildConfig, RelativityPolicy};
use crate::core::{NodeFlags, NodeHandle, StructureTree, ROOT_NAME};
use crate::decode::Decoder;
use crate::error::Result;
use crate::span_trace;

pub use budget::CancelToken;

/// One unit of pending work.
struct TraversalFrame<'v, V> {
    parent: Option<NodeHandle>,
    name: String,
    value: &'v V,
    start: Option<u64>,
    end: Option<u64>,
    is_pseudo: bool,
    is_array: bool,
    offsets_invalid: bool,
}

impl<V> TraversalFrame<'_, V> {
    /// Offsets to publish: none at all once the lineage is invalidated.
    fn offsets(&self) -> (Option<u64>, Option<u64>) {
        if self.offsets_invalid {
            (None, None)
        } else {
            (self.start, self.end)
        }
    }

    fn flags(&self) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::PSEUDO, self.is_pseudo);
        flags.set(NodeFlags::ARRAY, self.is_array);
        flags.set(NodeFlags::OFFSETS_INVALID, self.offsets_invalid);
        flags
    }
}

/// Build a tree with default limits.
pub fn build<D: Decoder>(root: &D::Value, decoder: &D) -> Result<StructureTree> {
    build_with(root, decoder, &BuildConfig::default(), None)
}

/// Build a tree, aborting on decode errors, exhausted limits or cancellation.
///
/// The tree is only returned once every frame has been processed; a failed
/// build leaves nothing behind.
pub fn build_with<D: Decoder>(
    root: &D::Value,
    decoder: &D,
    config: &BuildConfig,
    cancel: Option<&CancelToken>,
) -> Result<StructureTree> {
    let span = span_trace!("build_structure_tree");
    let _guard = span.enter();

    let mut budget = budget::BuildBudget::new(config, cancel);
    let mut tree = StructureTree::new();
    let mut queue = VecDeque::new();
    queue.push_back(TraversalFrame {
        parent: None,
        name: ROOT_NAME.to_string(),
        value: root,
        start: Some(0),
        end: None,
        is_pseudo: false,
        is_array: false,
        offsets_invalid: false,
    });

    while let Some(frame) = queue.pop_front() {
        budget.check(tree.len())?;

        let (start, end) = frame.offsets();
        let handle = tree.push(
            frame.parent,
            frame.name.clone(),
            decoder.describe(frame.value),
            start,
            end,
            frame.flags(),
        )?;
        trace!(node = %handle, name = %frame.name, ?start, ?end, "Added structure node");

        if frame.is_array {
            for (i, element) in decoder.elements(frame.value)?.into_iter().enumerate() {
                queue.push_back(TraversalFrame {
                    parent: Some(handle),
                    name: format!("[{}]", i),
                    value: element.value,
                    start: element.start,
                    end: element.end,
                    is_pseudo: false,
                    is_array: false,
                    offsets_invalid: frame.offsets_invalid,
                });
            }
            continue;
        }

        // Only a parent known to sit at offset 0 may have a child there
        let starts_at_zero = start == Some(0);
        let mut carried = frame.offsets_invalid;
        for field in decoder.children(frame.value)? {
            let mut offsets_invalid = carried;
            if !starts_at_zero && field.start == Some(0) {
                if !offsets_invalid {
                    warn!(
                        parent = %handle,
                        parent_start = ?start,
                        child = %field.name,
                        "Relative offsets detected, suppressing byte ranges"
                    );
                }
                offsets_invalid = true;
                if config.relativity == RelativityPolicy::FollowingSiblings {
                    carried = true;
                }
            }
            queue.push_back(TraversalFrame {
                parent: Some(handle),
                name: field.name,
                value: field.value,
                start: field.start,
                end: field.end,
                is_pseudo: field.is_pseudo,
                is_array: field.is_array,
                offsets_invalid,
            });
        }
    }

    debug!(
        nodes = tree.len(),
        invalidated = tree.invalidated_count(),
        elapsed_ms = budget.elapsed().as_millis() as u64,
        "Built structure tree"
    );
    Ok(tree)
}
