//! Inspection session: the published tree, its buffer, and the commands a
//! view issues against them.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::InspectorConfig;
use crate::core::{ByteRange, NodeHandle, StructureTree};
use crate::correlate::view::{HexView, ViewCommand};
use crate::decode::{Decoder, FormatRegistry, GraphDecoder};
use crate::engine::{self, CancelToken};
use crate::error::{InspectError, Result};
use crate::io::{ByteBuffer, IOLimits, MappedBuffer};
use crate::{log_error, span_trace};

/// User interactions routed through `Session::dispatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Refresh,
    StructureSelected(NodeHandle),
    Goto(u64),
}

/// Where the most recent population read its bytes from.
#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Memory(Bytes),
}

#[derive(Debug, Clone)]
struct Source {
    origin: Origin,
    format: String,
}

/// A tree together with the buffer it was built against.
struct Published {
    tree: StructureTree,
    buffer: Box<dyn ByteBuffer>,
}

pub struct Session {
    config: InspectorConfig,
    registry: FormatRegistry,
    cancel: Option<CancelToken>,
    source: Option<Source>,
    published: Option<Published>,
}

impl Session {
    /// A session over the built-in formats.
    pub fn new(config: InspectorConfig) -> Self {
        Self::with_registry(config, FormatRegistry::with_builtin())
    }

    pub fn with_registry(config: InspectorConfig, registry: FormatRegistry) -> Self {
        Self {
            config,
            registry,
            cancel: None,
            source: None,
            published: None,
        }
    }

    /// Poll `token` during every subsequent build.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Swap the token polled by later builds; `None` disables cancellation.
    pub fn set_cancel_token(&mut self, token: Option<CancelToken>) {
        self.cancel = token;
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FormatRegistry {
        &mut self.registry
    }

    /// The published tree, if any build has succeeded.
    pub fn tree(&self) -> Option<&StructureTree> {
        self.published.as_ref().map(|p| &p.tree)
    }

    /// The buffer the published tree was built against.
    pub fn buffer(&self) -> Option<&dyn ByteBuffer> {
        self.published.as_ref().map(|p| &*p.buffer)
    }

    /// Format of the most recent population request.
    pub fn current_format(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.format.as_str())
    }

    /// Path of the most recent population, unless it came from memory.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.source.as_ref()?.origin {
            Origin::File(path) => Some(path.as_path()),
            Origin::Memory(_) => None,
        }
    }

    /// Byte range of a node in the published tree.
    ///
    /// `None` for pseudo nodes, nodes with suppressed offsets, and handles
    /// from a tree that has since been replaced.
    pub fn select(&self, handle: NodeHandle) -> Option<ByteRange> {
        self.tree()?.get(handle)?.byte_range()
    }

    /// The bytes a node covers in the published buffer.
    pub fn node_bytes(&self, handle: NodeHandle) -> Option<Bytes> {
        let range = self.select(handle)?;
        Some(self.buffer()?.read_at(range.start, range.len()))
    }

    /// Scroll to and emphasize an absolute offset; the tree is not consulted.
    pub fn goto(&self, offset: u64) -> ViewCommand {
        ViewCommand::ScrollIntoView {
            offset,
            emphasize: true,
        }
    }

    /// Rebuild from a decoded value and bind the result to `buffer`.
    ///
    /// On failure the previous tree and buffer stay published. A cancelled
    /// build re-arms the session's token, so the next request runs.
    pub fn refresh<D: Decoder>(
        &mut self,
        root: &D::Value,
        decoder: &D,
        buffer: Box<dyn ByteBuffer>,
    ) -> Result<&StructureTree> {
        let tree = match engine::build_with(root, decoder, &self.config.build, self.cancel.as_ref())
        {
            Ok(tree) => tree,
            Err(e @ InspectError::Cancelled { .. }) => {
                if let Some(token) = &self.cancel {
                    token.reset();
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        info!(
            origin = %buffer.origin(),
            nodes = tree.len(),
            invalidated = tree.invalidated_count(),
            "Publishing structure tree"
        );
        let published = self.published.insert(Published { tree, buffer });
        Ok(&published.tree)
    }

    /// Load `path`, decode it as `format`, and publish the result to `view`.
    ///
    /// Recoverable failures (unknown format, decode errors, aborted builds)
    /// are reported through `view.report_error` before being returned; the
    /// view keeps showing the previous tree. I/O errors are returned as-is.
    pub fn populate<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: &str,
        view: &mut dyn HexView,
    ) -> Result<()> {
        let path = path.as_ref();
        let span = span_trace!("populate", path = %path.display(), format = %format);
        let _guard = span.enter();

        self.source = Some(Source {
            origin: Origin::File(path.to_path_buf()),
            format: format.to_string(),
        });

        let buffer = MappedBuffer::open(path, &IOLimits::from(&self.config.io))
            .map_err(|e| log_error!(InspectError::from(e), "Failed to bind buffer"))?;
        debug!(size = buffer.size(), "Buffer bound");

        self.populate_from(format, Box::new(buffer), view)
    }

    /// `populate` for bytes already in memory, such as a captured packet.
    ///
    /// The configured file size limit does not apply.
    pub fn populate_memory(
        &mut self,
        data: Bytes,
        format: &str,
        view: &mut dyn HexView,
    ) -> Result<()> {
        let span = span_trace!("populate", origin = "<memory>", size = data.len(), format = %format);
        let _guard = span.enter();

        self.source = Some(Source {
            origin: Origin::Memory(data.clone()),
            format: format.to_string(),
        });
        self.populate_from(format, Box::new(data), view)
    }

    fn populate_from(
        &mut self,
        format: &str,
        buffer: Box<dyn ByteBuffer>,
        view: &mut dyn HexView,
    ) -> Result<()> {
        match self.decode_and_build(format, buffer) {
            Ok(()) => {
                self.publish(view);
                view.set_status("Loaded");
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Population failed, keeping previous tree");
                view.report_error(&e.to_string());
                Err(e)
            }
            Err(e) => Err(log_error!(e, "Population failed")),
        }
    }

    /// `populate` with the configured default format.
    pub fn populate_default<P: AsRef<Path>>(&mut self, path: P, view: &mut dyn HexView) -> Result<()> {
        let format = self.config.default_format.clone();
        self.populate(path, &format, view)
    }

    /// Re-run the most recent population request.
    pub fn reload(&mut self, view: &mut dyn HexView) -> Result<()> {
        let source = self.source.clone().ok_or(InspectError::NotPopulated)?;
        view.set_status("Refreshing...");
        match source.origin {
            Origin::File(path) => self.populate(&path, &source.format, view),
            Origin::Memory(data) => self.populate_memory(data, &source.format, view),
        }
    }

    /// Route a view event to the matching operation.
    pub fn dispatch(&mut self, event: Event, view: &mut dyn HexView) -> Result<()> {
        match event {
            Event::Refresh => self.reload(view),
            Event::StructureSelected(handle) => {
                match self.select(handle) {
                    Some(range) => {
                        view.highlight(range);
                        view.scroll_into_view(range.start, false);
                    }
                    None => debug!(node = %handle, "Selected node has no byte range"),
                }
                Ok(())
            }
            Event::Goto(offset) => {
                self.goto(offset).apply(view);
                view.set_status(&format!("Jumping to offset {:#x} ({})", offset, offset));
                Ok(())
            }
        }
    }

    /// Replay the published tree and its bytes into `view`.
    pub fn publish(&self, view: &mut dyn HexView) {
        let Some(published) = &self.published else {
            return;
        };
        view.reset();
        view.populate_bytes(published.buffer.as_bytes());
        for node in published.tree.iter() {
            view.add_node(node);
        }
    }

    fn decode_and_build(&mut self, format: &str, buffer: Box<dyn ByteBuffer>) -> Result<()> {
        let value = self.registry.get(format)?.parse(buffer.as_bytes())?;
        self.refresh(&value, &GraphDecoder, buffer)?;
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("source", &self.source)
            .field("registry", &self.registry)
            .field("nodes", &self.tree().map(StructureTree::len))
            .finish()
    }
}
