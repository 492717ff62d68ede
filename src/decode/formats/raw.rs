//! Fallback format: the whole buffer as one byte field.

use crate::decode::stream::{ByteStream, StructBuilder};
use crate::decode::value::DecodedValue;
use crate::decode::{FormatDecoder, Result};

pub const RAW_FORMAT_ID: &str = "raw";

#[derive(Debug, Default)]
pub struct RawFormat;

impl FormatDecoder for RawFormat {
    fn id(&self) -> &str {
        RAW_FORMAT_ID
    }

    fn description(&self) -> &str {
        "Unstructured bytes"
    }

    fn parse(&self, data: &[u8]) -> Result<DecodedValue> {
        let mut io = ByteStream::new(data);
        let mut root = StructBuilder::new("Raw");
        root.nested("data", &mut io, |io| Ok(io.read_bytes_full().into()))?;
        root.pseudo("size", DecodedValue::Unsigned(data.len() as u64));
        Ok(root.finish())
    }
}
