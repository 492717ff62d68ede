//! structscope: structure-tree and offset correlation for binary inspection.
//!
//! A decoded value graph is walked breadth-first into a [`StructureTree`]
//! whose nodes carry absolute byte ranges, with offsets that a decoder
//! reported relative to a sub-buffer detected and suppressed. A
//! [`Session`] publishes that tree next to its buffer and answers
//! selection and navigation requests from a hex view.

pub mod config;
pub mod core;
pub mod correlate;
pub mod decode;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;

pub use crate::config::{BuildConfig, InspectorConfig, RelativityPolicy};
pub use crate::core::{ByteRange, NodeHandle, StructureNode, StructureTree};
pub use crate::correlate::{Event, HexView, Session, ViewCommand};
pub use crate::decode::{DecodeError, Decoder, FormatDecoder, FormatRegistry, GraphDecoder};
pub use crate::engine::{build, build_with, CancelToken};
pub use crate::error::{InspectError, Result};
