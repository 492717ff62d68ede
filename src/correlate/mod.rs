//! Correlation between the structure tree and the raw-byte view.
//!
//! `Session` owns the published tree and the buffer it was built against,
//! and turns view events into view commands.

pub mod session;
pub mod view;

pub use session::{Event, Session};
pub use view::{HexView, RecordingView, ViewCommand, ViewEvent};
