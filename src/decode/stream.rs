//! Positioned big-endian reader and field recorder used by format decoders.
//!
//! `ByteStream::substream` hands out a stream over an extracted slice whose
//! positions restart at zero. Structures decoded from such a stream report
//! offsets relative to the slice, which is exactly the artifact the engine
//! detects.

use crate::decode::value::{DecodedField, DecodedStruct, DecodedValue};
use crate::decode::{DecodeError, Result};

/// Cursor over a byte slice with big-endian integer and bit reads.
#[derive(Debug, Clone)]
pub struct ByteStream<'a> {
    data: &'a [u8],
    pos: usize,
    bits: u64,
    bits_left: u32,
}

impl<'a> ByteStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bits: 0,
            bits_left: 0,
        }
    }

    /// Current byte position, relative to this stream's first byte.
    pub fn pos(&self) -> u64 {
        self.pos as u64
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_eof(&self) -> bool {
        self.bits_left == 0 && self.pos >= self.data.len()
    }

    /// Drop any partially consumed byte left by bit reads.
    pub fn align_to_byte(&mut self) {
        self.bits = 0;
        self.bits_left = 0;
    }

    pub fn read_bytes(&mut self, n: u64) -> Result<&'a [u8]> {
        self.align_to_byte();
        let available = (self.data.len() - self.pos) as u64;
        if n > available {
            return Err(DecodeError::Truncated {
                offset: self.pos(),
                needed: n,
                available,
            });
        }
        let start = self.pos;
        self.pos += n as usize;
        Ok(&self.data[start..self.pos])
    }

    /// All bytes up to the end of the stream.
    pub fn read_bytes_full(&mut self) -> &'a [u8] {
        self.align_to_byte();
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read `n` bits (at most 32), most significant bit first.
    ///
    /// Whole bytes are consumed as soon as any of their bits is needed, so
    /// `pos` moves past a byte on its first bit read.
    pub fn read_bits_be(&mut self, n: u32) -> Result<u64> {
        if n > 32 {
            return Err(DecodeError::Unsupported(format!("{}-bit read", n)));
        }
        if n > self.bits_left {
            let bytes_needed = (n - self.bits_left).div_ceil(8) as usize;
            let available = self.data.len() - self.pos;
            if bytes_needed > available {
                return Err(DecodeError::Truncated {
                    offset: self.pos(),
                    needed: bytes_needed as u64,
                    available: available as u64,
                });
            }
            for &b in &self.data[self.pos..self.pos + bytes_needed] {
                self.bits = (self.bits << 8) | u64::from(b);
            }
            self.pos += bytes_needed;
            self.bits_left += 8 * bytes_needed as u32;
        }
        let shift = self.bits_left - n;
        let mask = (1u64 << n) - 1;
        let value = (self.bits >> shift) & mask;
        self.bits_left = shift;
        self.bits &= (1u64 << shift) - 1;
        Ok(value)
    }

    /// Extract `n` bytes into a new stream whose positions start at zero.
    pub fn substream(&mut self, n: u64) -> Result<ByteStream<'a>> {
        self.read_bytes(n).map(ByteStream::new)
    }
}

/// Collects the fields of one structure together with the stream positions
/// they were read from.
#[derive(Debug)]
pub struct StructBuilder {
    type_name: String,
    fields: Vec<DecodedField>,
}

impl StructBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Read a scalar field and return its value for later use.
    pub fn field<'a, T, F>(&mut self, name: &str, io: &mut ByteStream<'a>, read: F) -> Result<T>
    where
        T: Clone + Into<DecodedValue>,
        F: FnOnce(&mut ByteStream<'a>) -> Result<T>,
    {
        let start = io.pos();
        let value = read(io)?;
        let end = io.pos();
        self.push(name, value.clone().into(), Some(start), Some(end), false);
        Ok(value)
    }

    /// Read a compound field (a nested struct or an array).
    pub fn nested<'a, F>(&mut self, name: &str, io: &mut ByteStream<'a>, read: F) -> Result<()>
    where
        F: FnOnce(&mut ByteStream<'a>) -> Result<DecodedValue>,
    {
        let start = io.pos();
        let value = read(io)?;
        let end = io.pos();
        self.push(name, value, Some(start), Some(end), false);
        Ok(())
    }

    /// Add a display-only field that owns no bytes.
    pub fn pseudo(&mut self, name: &str, value: DecodedValue) {
        self.push(name, value, None, None, true);
    }

    fn push(
        &mut self,
        name: &str,
        value: DecodedValue,
        start: Option<u64>,
        end: Option<u64>,
        is_pseudo: bool,
    ) {
        self.fields.push(DecodedField {
            name: name.to_string(),
            value,
            start,
            end,
            is_pseudo,
        });
    }

    pub fn finish(self) -> DecodedValue {
        DecodedValue::Struct(DecodedStruct {
            type_name: self.type_name,
            fields: self.fields,
        })
    }
}
