//! Decoder collaborators.
//!
//! The engine is generic over `Decoder`, which only has to describe values
//! and enumerate their fields or elements. Concrete binary formats implement
//! `FormatDecoder`, which turns a buffer into the generic `DecodedValue`
//! graph, and are selected by id through a `FormatRegistry`.

pub mod formats;
pub mod registry;
pub mod stream;
pub mod value;

use thiserror::Error;

pub use registry::FormatRegistry;
pub use stream::{ByteStream, StructBuilder};
pub use value::{DecodedElement, DecodedField, DecodedStruct, DecodedValue, GraphDecoder};

/// Failures a decoder reports for data it cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Truncated at offset {offset:#x}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedShape { expected: String, found: String },

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// A named child of a structured value.
#[derive(Debug, Clone)]
pub struct Field<'v, V> {
    pub name: String,
    pub value: &'v V,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub is_pseudo: bool,
    pub is_array: bool,
}

/// A positional element of an array value.
#[derive(Debug, Clone)]
pub struct Element<'v, V> {
    pub value: &'v V,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Read access to a decoded value graph.
///
/// Offsets are whatever the underlying parser recorded; the engine decides
/// whether to trust them.
pub trait Decoder {
    type Value;

    /// Short display text for a value.
    fn describe(&self, value: &Self::Value) -> String;

    /// Named children of a non-array value, in declaration order.
    fn children<'v>(&self, value: &'v Self::Value) -> Result<Vec<Field<'v, Self::Value>>>;

    /// Elements of a value flagged as an array.
    fn elements<'v>(&self, value: &'v Self::Value) -> Result<Vec<Element<'v, Self::Value>>>;
}

/// A binary format that can parse a whole buffer.
pub trait FormatDecoder: Send + Sync {
    /// Identifier used to select the format.
    fn id(&self) -> &str;

    /// Human-readable format name.
    fn description(&self) -> &str;

    fn parse(&self, data: &[u8]) -> Result<DecodedValue>;
}
