//! Byte buffers bound to a population cycle.
//!
//! A structure tree only means something against the buffer it was built
//! from. `ByteBuffer` is the narrow view the engine and session need;
//! `MappedBuffer` provides it for files through a read-only memory map with
//! a size limit, and plain owned byte containers provide it in memory.

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default ceiling for files opened for inspection (256MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Defines the resource limits for opening buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Byte-addressable contents valid for the lifetime of one population.
pub trait ByteBuffer {
    /// The full contents.
    fn as_bytes(&self) -> &[u8];

    /// Where the bytes came from, for status and log output.
    fn origin(&self) -> String {
        "<memory>".to_string()
    }

    fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Copies out up to `len` bytes starting at `offset`, clamped at the end.
    fn read_at(&self, offset: u64, len: u64) -> Bytes {
        let data = self.as_bytes();
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= data.len() {
            return Bytes::new();
        }
        let end = start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
        Bytes::copy_from_slice(&data[start..end.min(data.len())])
    }
}

impl ByteBuffer for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl ByteBuffer for Bytes {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn read_at(&self, offset: u64, len: u64) -> Bytes {
        let size = self.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(size);
        let end = start
            .saturating_add(usize::try_from(len).unwrap_or(usize::MAX))
            .min(size);
        // Shares the allocation instead of copying
        self.slice(start..end)
    }
}

/// A read-only memory map of a file on disk.
pub struct MappedBuffer {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl MappedBuffer {
    /// Opens and memory-maps a file.
    ///
    /// Fails with `IoError::FileTooLarge` if the file exceeds
    /// `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Mapping file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; callers must not truncate
            // the file while the buffer is bound.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    /// Path the buffer was mapped from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapped file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }
}

impl ByteBuffer for MappedBuffer {
    fn as_bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        }
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

impl std::fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("path", &self.path)
            .field("size", &self.file_size)
            .finish()
    }
}
