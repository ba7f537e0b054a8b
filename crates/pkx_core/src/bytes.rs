//! Little-endian integer access and sub-byte bit packing over byte buffers.
//!
//! The `read_*`/`write_*` functions index directly and panic on an
//! out-of-range offset; callers use them only on buffers whose length is a
//! type invariant (entity records). The `get_*`/`put_*` variants are checked
//! and are used on regions whose size comes from the input (save blocks).

use crate::core_api::CoreError;

pub fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

pub fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn get_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

pub fn get_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let b = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

pub fn get_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let b = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Returns `false` without writing when the byte is out of range.
pub fn put_u8(buf: &mut [u8], offset: usize, value: u8) -> bool {
    match buf.get_mut(offset) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) -> bool {
    put_bytes(buf, offset, &value.to_le_bytes())
}

pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) -> bool {
    put_bytes(buf, offset, &value.to_le_bytes())
}

fn put_bytes(buf: &mut [u8], offset: usize, bytes: &[u8]) -> bool {
    let Some(end) = offset.checked_add(bytes.len()) else {
        return false;
    };
    match buf.get_mut(offset..end) {
        Some(dst) => {
            dst.copy_from_slice(bytes);
            true
        }
        None => false,
    }
}

/// Extracts `width` bits starting at bit `shift`.
pub fn bits(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & mask(width)
}

/// Replaces `width` bits starting at bit `shift`; excess high bits of
/// `value` are dropped.
pub fn with_bits(word: u32, shift: u32, width: u32, value: u32) -> u32 {
    let m = mask(width) << shift;
    (word & !m) | ((value << shift) & m)
}

pub fn flag(word: u32, bit: u32) -> bool {
    (word >> bit) & 1 == 1
}

pub fn with_flag(word: u32, bit: u32, on: bool) -> u32 {
    if on {
        word | (1 << bit)
    } else {
        word & !(1 << bit)
    }
}

fn mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Forward-only cursor over a byte slice.
pub struct LittleEndianReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LittleEndianReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, CoreError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, CoreError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CoreError> {
        if n > self.remaining() {
            return Err(CoreError::truncated(
                "stream",
                self.buf.len(),
                self.pos.saturating_add(n),
            ));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}
