//! The raw-byte/tree view collaborator.

use crate::core::{ByteRange, NodeHandle, StructureNode};

/// Commands a view understands, as produced by `Session::goto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    Highlight(ByteRange),
    ScrollIntoView { offset: u64, emphasize: bool },
}

impl ViewCommand {
    pub fn apply(&self, view: &mut dyn HexView) {
        match *self {
            ViewCommand::Highlight(range) => view.highlight(range),
            ViewCommand::ScrollIntoView { offset, emphasize } => {
                view.scroll_into_view(offset, emphasize)
            }
        }
    }
}

/// A display surface showing the buffer next to its structure tree.
pub trait HexView {
    /// Drop the displayed tree and bytes.
    fn reset(&mut self);

    /// Show the raw bytes of a freshly bound buffer.
    fn populate_bytes(&mut self, bytes: &[u8]);

    /// Add one tree item; called parent-before-child.
    fn add_node(&mut self, node: &StructureNode);

    fn highlight(&mut self, range: ByteRange);

    fn scroll_into_view(&mut self, offset: u64, emphasize: bool);

    fn report_error(&mut self, message: &str);

    fn set_status(&mut self, message: &str);
}

/// Everything a `RecordingView` was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Reset,
    Bytes(usize),
    Node {
        handle: NodeHandle,
        parent: Option<NodeHandle>,
        name: String,
        description: String,
        start: Option<u64>,
        end: Option<u64>,
        is_pseudo: bool,
    },
    Highlight(ByteRange),
    Scroll { offset: u64, emphasize: bool },
    Error(String),
    Status(String),
}

/// Headless view that logs every call, for scripting and tests.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node names in the order they were added since the last reset.
    pub fn node_names(&self) -> Vec<&str> {
        let since_reset = self
            .events
            .iter()
            .rposition(|e| *e == ViewEvent::Reset)
            .map_or(0, |i| i + 1);
        self.events[since_reset..]
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Node { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Error(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Status(m) => Some(m.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl HexView for RecordingView {
    fn reset(&mut self) {
        self.events.push(ViewEvent::Reset);
    }

    fn populate_bytes(&mut self, bytes: &[u8]) {
        self.events.push(ViewEvent::Bytes(bytes.len()));
    }

    fn add_node(&mut self, node: &StructureNode) {
        self.events.push(ViewEvent::Node {
            handle: node.handle,
            parent: node.parent,
            name: node.name.clone(),
            description: node.description.clone(),
            start: node.start,
            end: node.end,
            is_pseudo: node.is_pseudo(),
        });
    }

    fn highlight(&mut self, range: ByteRange) {
        self.events.push(ViewEvent::Highlight(range));
    }

    fn scroll_into_view(&mut self, offset: u64, emphasize: bool) {
        self.events.push(ViewEvent::Scroll { offset, emphasize });
    }

    fn report_error(&mut self, message: &str) {
        self.events.push(ViewEvent::Error(message.to_string()));
    }

    fn set_status(&mut self, message: &str) {
        self.events.push(ViewEvent::Status(message.to_string()));
    }
}
