//! An untyped byte window with an advancing read cursor.
//!
//! Generalizes the teacher's free-standing `leb128_decode`/`leb128_encode`
//! functions (`leb.rs`) into a stateful cursor that also knows how to read
//! endian-aware fixed-width integers and NUL-terminated strings, since both
//! the ELF and DWARF readers need exactly that combination repeatedly.

use crate::binfmt::Endianness;
use crate::leb;

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("attempted to read {need} byte(s) at offset {pos} of a {len}-byte buffer")]
    OutOfBounds { pos: usize, need: usize, len: usize },
    #[error("string was not NUL-terminated before the end of the buffer")]
    UnterminatedString,
    #[error("LEB128 value continued past the end of the buffer")]
    TruncatedLeb128,
}

pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8], endianness: Endianness) -> ByteCursor<'a> {
        ByteCursor {
            bytes,
            pos: 0,
            endianness,
        }
    }

    pub fn at(bytes: &'a [u8], endianness: Endianness, pos: usize) -> ByteCursor<'a> {
        ByteCursor {
            bytes,
            pos,
            endianness,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if self.pos + n > self.bytes.len() {
            return Err(CursorError::OutOfBounds {
                pos: self.pos,
                need: n,
                len: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads an unsigned integer of `width` bytes (1, 2, 4, or 8), advancing
    /// the cursor, interpreting bytes in the cursor's configured endianness.
    pub fn read_uint(&mut self, width: usize) -> Result<u64, CursorError> {
        let bytes = self.take(width)?;
        Ok(match (width, self.endianness) {
            (1, _) => bytes[0] as u64,
            (2, Endianness::Little) => u16::from_le_bytes(bytes.try_into().unwrap()) as u64,
            (2, Endianness::Big) => u16::from_be_bytes(bytes.try_into().unwrap()) as u64,
            (4, Endianness::Little) => u32::from_le_bytes(bytes.try_into().unwrap()) as u64,
            (4, Endianness::Big) => u32::from_be_bytes(bytes.try_into().unwrap()) as u64,
            (8, Endianness::Little) => u64::from_le_bytes(bytes.try_into().unwrap()),
            (8, Endianness::Big) => u64::from_be_bytes(bytes.try_into().unwrap()),
            _ => unreachable!("ByteCursor::read_uint only supports widths 1, 2, 4, 8"),
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(self.read_uint(2)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(self.read_uint(4)? as u32)
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        self.read_uint(8)
    }

    /// Reads a NUL-terminated string, advancing past the NUL.
    pub fn read_cstr(&mut self) -> Result<String, CursorError> {
        let start = self.pos;
        let rest = self.bytes.get(start..).ok_or(CursorError::OutOfBounds {
            pos: start,
            need: 1,
            len: self.bytes.len(),
        })?;
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(CursorError::UnterminatedString)?;
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos = start + nul + 1;
        Ok(s)
    }

    /// Reads raw bytes, for slices whose length is computed by the caller
    /// (e.g. the body of a `DW_FORM_exprloc`).
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.take(n)
    }

    /// ULEB128: 7-bit groups, MSB continuation bit. Saturates rather than
    /// erroring on overflow past 64 bits, which should not occur in
    /// well-formed DWARF v<=4 for the forms this crate reads.
    pub fn read_uleb128(&mut self) -> Result<u64, CursorError> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if shift < 64 {
                result |= ((byte & 0x7f) as u64) << shift;
            } else {
                result = u64::MAX;
            }
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// SLEB128, via the teacher's own `leb` module.
    pub fn read_sleb128(&mut self) -> Result<i64, CursorError> {
        let remaining = &self.bytes[self.pos..];
        let (value, consumed) =
            leb::ileb128_decode(remaining).map_err(|_| CursorError::TruncatedLeb128)?;
        self.pos += consumed;
        Ok(value)
    }
}
