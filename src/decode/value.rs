//! The generic decoded value graph and its `Decoder`.

use crate::decode::{DecodeError, Decoder, Element, Field, Result};

/// Number of bytes shown before a byte value's description is cut short.
pub const MAX_DESCRIBED_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Unsigned(u64),
    Signed(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    /// A raw integer with a symbolic name
    Enum { name: String, raw: u64 },
    Struct(DecodedStruct),
    Array(Vec<DecodedElement>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStruct {
    pub type_name: String,
    pub fields: Vec<DecodedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    pub name: String,
    pub value: DecodedValue,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub is_pseudo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedElement {
    pub value: DecodedValue,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl DecodedValue {
    /// Short name of the value's type.
    pub fn kind_name(&self) -> &str {
        match self {
            DecodedValue::Unsigned(_) => "uint",
            DecodedValue::Signed(_) => "int",
            DecodedValue::Bool(_) => "bool",
            DecodedValue::Bytes(_) => "bytes",
            DecodedValue::Text(_) => "str",
            DecodedValue::Enum { .. } => "enum",
            DecodedValue::Struct(s) => &s.type_name,
            DecodedValue::Array(_) => "array",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DecodedValue::Array(_))
    }

    pub fn as_struct(&self) -> Option<&DecodedStruct> {
        match self {
            DecodedValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            DecodedValue::Unsigned(v) => Some(*v),
            DecodedValue::Enum { raw, .. } => Some(*raw),
            _ => None,
        }
    }
}

impl DecodedStruct {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl From<u8> for DecodedValue {
    fn from(v: u8) -> Self {
        DecodedValue::Unsigned(v.into())
    }
}

impl From<u16> for DecodedValue {
    fn from(v: u16) -> Self {
        DecodedValue::Unsigned(v.into())
    }
}

impl From<u32> for DecodedValue {
    fn from(v: u32) -> Self {
        DecodedValue::Unsigned(v.into())
    }
}

impl From<u64> for DecodedValue {
    fn from(v: u64) -> Self {
        DecodedValue::Unsigned(v)
    }
}

impl From<bool> for DecodedValue {
    fn from(v: bool) -> Self {
        DecodedValue::Bool(v)
    }
}

impl From<&[u8]> for DecodedValue {
    fn from(v: &[u8]) -> Self {
        DecodedValue::Bytes(v.to_vec())
    }
}

impl From<DecodedStruct> for DecodedValue {
    fn from(v: DecodedStruct) -> Self {
        DecodedValue::Struct(v)
    }
}

fn describe_bytes(bytes: &[u8]) -> String {
    if bytes.len() > MAX_DESCRIBED_BYTES {
        format!(
            "{}... ({} bytes)",
            hex::encode(&bytes[..MAX_DESCRIBED_BYTES]),
            bytes.len()
        )
    } else {
        format!("{} ({} bytes)", hex::encode(bytes), bytes.len())
    }
}

/// `Decoder` over a `DecodedValue` graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphDecoder;

impl Decoder for GraphDecoder {
    type Value = DecodedValue;

    fn describe(&self, value: &DecodedValue) -> String {
        match value {
            DecodedValue::Unsigned(v) => format!("{:#x} ({})", v, v),
            DecodedValue::Signed(v) => v.to_string(),
            DecodedValue::Bool(v) => v.to_string(),
            DecodedValue::Bytes(b) => describe_bytes(b),
            DecodedValue::Text(s) => format!("{:?}", s),
            DecodedValue::Enum { name, raw } => format!("{} ({:#x})", name, raw),
            DecodedValue::Struct(s) => s.type_name.clone(),
            DecodedValue::Array(items) => {
                let kind = items.first().map_or("empty", |e| e.value.kind_name());
                format!("{}[{}]", kind, items.len())
            }
        }
    }

    fn children<'v>(&self, value: &'v DecodedValue) -> Result<Vec<Field<'v, DecodedValue>>> {
        let fields = match value {
            DecodedValue::Struct(s) => &s.fields,
            _ => return Ok(Vec::new()),
        };
        Ok(fields
            .iter()
            .map(|f| Field {
                name: f.name.clone(),
                value: &f.value,
                start: f.start,
                end: f.end,
                is_pseudo: f.is_pseudo,
                is_array: f.value.is_array(),
            })
            .collect())
    }

    fn elements<'v>(&self, value: &'v DecodedValue) -> Result<Vec<Element<'v, DecodedValue>>> {
        match value {
            DecodedValue::Array(items) => Ok(items
                .iter()
                .map(|e| Element {
                    value: &e.value,
                    start: e.start,
                    end: e.end,
                })
                .collect()),
            other => Err(DecodeError::UnexpectedShape {
                expected: "array".to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }
}
