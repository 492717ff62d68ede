//! Absolute byte ranges into an inspected buffer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` range of absolute file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    /// First byte covered (inclusive)
    pub start: u64,
    /// One past the last byte covered (exclusive)
    pub end: u64,
}

impl ByteRange {
    /// Create a range, rejecting `end < start`.
    pub fn new(start: u64, end: u64) -> Result<Self, String> {
        if end < start {
            return Err(format!(
                "Range end {:#x} precedes start {:#x}",
                end, start
            ));
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional bounds as reported by a decoder.
    ///
    /// Returns `None` if either bound is missing or the bounds are inverted.
    pub fn from_bounds(start: Option<u64>, end: Option<u64>) -> Option<Self> {
        Self::new(start?, end?).ok()
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if `offset` falls inside the range.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if `other` lies completely within this range.
    ///
    /// Empty ranges are contained by any range whose bounds enclose them.
    pub fn contains_range(&self, other: &ByteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}-{:#x}", self.start, self.end)
    }
}
