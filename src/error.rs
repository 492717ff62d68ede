//! Error types for the structscope inspector.
//!
//! Decoder failures are expected and recoverable at the population boundary;
//! everything else is surfaced to the caller unchanged.

use crate::decode::DecodeError;
use crate::io::error::IoError;
use thiserror::Error;

/// Main error type for structscope operations.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The decoder could not interpret the buffer
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No decoder registered under the requested format id
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Build aborted through its cancellation token
    #[error("Structure build cancelled after {nodes} nodes")]
    Cancelled { nodes: usize },

    /// Build exceeded its time budget
    #[error("Structure build timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Resource limit exceeded
    #[error("Resource limit exceeded: {resource} ({used}/{limit})")]
    ResourceExhausted {
        resource: String,
        used: usize,
        limit: usize,
    },

    /// Buffer I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing has been populated yet
    #[error("No file has been populated")]
    NotPopulated,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InspectError {
    /// True for failures the session reports and survives.
    ///
    /// A build that fails with one of these leaves the previously published
    /// tree in place; any other error is fatal for the current operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InspectError::Decode(_)
                | InspectError::UnknownFormat(_)
                | InspectError::Cancelled { .. }
                | InspectError::Timeout { .. }
                | InspectError::ResourceExhausted { .. }
        )
    }
}

/// Result type alias for structscope operations
pub type Result<T> = std::result::Result<T, InspectError>;
