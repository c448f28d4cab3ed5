//! Bounds-checked reads of fixed-width fields.

use thiserror::Error;

/// Unexpectedly reached the end of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unexpectedly reached the end of the buffer at {offset:#x} (needed {needed} bytes, {available} available).")]
pub struct EndOfBuffer {
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

/// A read position within a byte buffer.
///
/// Every read validates the remaining length before advancing.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Create a cursor starting at an offset into the buffer.
    pub fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    /// Take an exact number of bytes, advancing the offset.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], EndOfBuffer> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.slice(N)?);
        Ok(buf)
    }

    /// Take a slice of `n` bytes, advancing the offset.
    pub fn slice(&mut self, n: usize) -> Result<&'a [u8], EndOfBuffer> {
        let s = self.offset;
        let r: &'a [u8] = self.bytes;
        let bytes = r
            .get(s..)
            .and_then(|r| r.get(..n))
            .ok_or(EndOfBuffer {
                offset: s,
                needed: n,
                available: self.remaining(),
            })?;
        self.offset += n;
        Ok(bytes)
    }

    /// Skip over `n` bytes of reserved or unknown content.
    pub fn skip(&mut self, n: usize) -> Result<(), EndOfBuffer> {
        self.slice(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, EndOfBuffer> {
        Ok(self.take::<1>()?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, EndOfBuffer> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn u32_le(&mut self) -> Result<u32, EndOfBuffer> {
        Ok(u32::from_le_bytes(self.take()?))
    }
}
